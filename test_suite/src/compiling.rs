use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;

use serde_json::json;

use model_filter::mock::{MockError, QueryOp, RecordingQuery};
use model_filter::{Capability, EntityDescriptor, Filterable, ModelFilter};

// Hand-written Filterable, using the legacy tag strings.
struct Ticket;

impl Filterable for Ticket {
    fn entity_name() -> &'static str {
        "ticket"
    }

    fn descriptor() -> &'static EntityDescriptor {
        static DESCRIPTOR: OnceLock<EntityDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            EntityDescriptor::builder()
                .tagged("Title", "order;search;match")
                .tagged("Priority", "order;match")
                .tagged("Body", "search")
                .build()
        })
    }
}

#[test]
fn stages_apply_in_fixed_order() {
    let ops = ModelFilter::<Ticket>::new()
        .join("JOIN users ON users.id = tickets.user_id", vec![])
        .order("title")
        .search("title", "crash")
        .match_field("priority", "3")
        .where_raw("created_at > ?", vec![json!("2026-01-01")])
        .limit(10)
        .offset(20)
        .select("title,priority")
        .preload("Comments", vec![])
        .query(RecordingQuery::new())
        .into_ops();

    assert_eq!(
        ops,
        vec![
            QueryOp::Model("ticket".to_string()),
            QueryOp::Join {
                template: "JOIN users ON users.id = tickets.user_id".to_string(),
                args: vec![],
            },
            QueryOp::OrderBy {
                column: "title".to_string(),
                descending: false,
            },
            QueryOp::Where {
                template: "`title` LIKE ?".to_string(),
                args: vec![json!("%crash%")],
            },
            QueryOp::Where {
                template: "`priority` = ?".to_string(),
                args: vec![json!("3")],
            },
            QueryOp::Where {
                template: "created_at > ?".to_string(),
                args: vec![json!("2026-01-01")],
            },
            QueryOp::Limit(10),
            QueryOp::Offset(20),
            QueryOp::Select(vec!["title".to_string(), "priority".to_string()]),
            QueryOp::Preload {
                relation: "Comments".to_string(),
                args: vec![],
            },
        ]
    );
}

#[test]
fn descending_marker_is_stripped() {
    let ops = ModelFilter::<Ticket>::new()
        .order("-priority")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::OrderBy {
        column: "priority".to_string(),
        descending: true,
    }));
}

#[test_log::test]
fn unorderable_field_emits_nothing() {
    let ops = ModelFilter::<Ticket>::new()
        .order("body")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(!ops.iter().any(|op| matches!(op, QueryOp::OrderBy { .. })));

    // identical to not having asked at all
    let bare = ModelFilter::<Ticket>::new()
        .query(RecordingQuery::new())
        .into_ops();
    assert_eq!(ops, bare);
}

#[test]
fn search_defaults_to_every_searchable_field() {
    let ops = ModelFilter::<Ticket>::new()
        .search("", "bug")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Where {
        template: "`body` LIKE ? OR `title` LIKE ?".to_string(),
        args: vec![json!("%bug%"), json!("%bug%")],
    }));
}

#[test]
fn search_intersects_requested_fields() {
    let ops = ModelFilter::<Ticket>::new()
        .search("title,priority", "bug")
        .query(RecordingQuery::new())
        .into_ops();
    // priority is not searchable and is dropped from the OR list
    assert!(ops.contains(&QueryOp::Where {
        template: "`title` LIKE ?".to_string(),
        args: vec![json!("%bug%")],
    }));
}

#[test]
fn search_with_no_candidates_is_a_no_op() {
    let ops = ModelFilter::<Ticket>::new()
        .search("priority", "bug")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(!ops.iter().any(|op| matches!(op, QueryOp::Where { .. })));
}

#[test]
fn empty_search_value_is_a_no_op() {
    let ops = ModelFilter::<Ticket>::new()
        .search("title", "")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(!ops.iter().any(|op| matches!(op, QueryOp::Where { .. })));
}

#[test]
fn delimited_match_becomes_membership() {
    let ops = ModelFilter::<Ticket>::new()
        .match_field("priority", "1,2,3")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Where {
        template: "`priority` IN (?)".to_string(),
        args: vec![json!(["1", "2", "3"])],
    }));
}

#[test]
fn single_match_becomes_equality() {
    let ops = ModelFilter::<Ticket>::new()
        .match_field("priority", "1")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Where {
        template: "`priority` = ?".to_string(),
        args: vec![json!("1")],
    }));
}

#[test]
fn non_string_match_is_bound_as_is() {
    let ops = ModelFilter::<Ticket>::new()
        .match_field("priority", 3)
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Where {
        template: "`priority` = ?".to_string(),
        args: vec![json!(3)],
    }));
}

#[test]
fn later_match_replaces_earlier() {
    let ops = ModelFilter::<Ticket>::new()
        .match_field("priority", "1")
        .match_field("priority", "2")
        .query(RecordingQuery::new())
        .into_ops();
    let wheres: Vec<&QueryOp> = ops
        .iter()
        .filter(|op| matches!(op, QueryOp::Where { .. }))
        .collect();
    assert_eq!(
        wheres,
        vec![&QueryOp::Where {
            template: "`priority` = ?".to_string(),
            args: vec![json!("2")],
        }]
    );
}

#[test_log::test]
fn unmatchable_field_has_no_effect() {
    let ops = ModelFilter::<Ticket>::new()
        .match_field("body", "text")
        .match_field("secret", "x")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(!ops.iter().any(|op| matches!(op, QueryOp::Where { .. })));
}

#[test]
fn raw_clauses_keep_insertion_order() {
    let ops = ModelFilter::<Ticket>::new()
        .where_raw("a = ?", vec![json!(1)])
        .where_raw("b = ?", vec![json!(2)])
        .query(RecordingQuery::new())
        .into_ops();
    let templates: Vec<&str> = ops
        .iter()
        .filter_map(|op| match op {
            QueryOp::Where { template, .. } => Some(template.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(templates, vec!["a = ?", "b = ?"]);
}

#[test]
fn pagination_sentinels_pass_through() {
    let ops = ModelFilter::<Ticket>::new()
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Limit(-1)));
    assert!(ops.contains(&QueryOp::Offset(0)));
}

#[test]
fn projection_is_not_allow_listed() {
    let ops = ModelFilter::<Ticket>::new()
        .select("title,internal_notes")
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Select(vec![
        "title".to_string(),
        "internal_notes".to_string(),
    ])));
}

#[test]
fn preload_carries_extra_arguments() {
    let ops = ModelFilter::<Ticket>::new()
        .preload("Comments", vec![json!("deleted_at IS NULL")])
        .query(RecordingQuery::new())
        .into_ops();
    assert!(ops.contains(&QueryOp::Preload {
        relation: "Comments".to_string(),
        args: vec![json!("deleted_at IS NULL")],
    }));
}

#[test]
fn count_reuses_predicates_only() {
    let db = RecordingQuery::new().with_rows(7);
    let trace = db.trace();
    let count = ModelFilter::<Ticket>::new()
        .order("title")
        .search("", "bug")
        .match_field("priority", "1")
        .limit(10)
        .offset(5)
        .select("title")
        .preload("Comments", vec![])
        .count(db)
        .unwrap();
    assert_eq!(count, 7);

    let ops = trace.ops();
    assert_eq!(ops[0], QueryOp::Model("ticket".to_string()));
    assert!(ops.iter().any(|op| matches!(op, QueryOp::Where { .. })));
    assert!(!ops.iter().any(|op| matches!(
        op,
        QueryOp::OrderBy { .. }
            | QueryOp::Limit(_)
            | QueryOp::Offset(_)
            | QueryOp::Select(_)
            | QueryOp::Preload { .. }
    )));
}

#[test]
fn delete_compiles_the_full_query() {
    let db = RecordingQuery::new().with_rows(2);
    let trace = db.trace();
    let deleted = ModelFilter::<Ticket>::new()
        .match_field("priority", "1")
        .limit(1)
        .delete(db)
        .unwrap();
    assert_eq!(deleted, 2);
    assert!(trace.ops().contains(&QueryOp::Limit(1)));
}

#[test]
fn terminal_failures_propagate_untouched() {
    let db = RecordingQuery::new().failing("connection reset");
    let err = ModelFilter::<Ticket>::new().count(db).unwrap_err();
    assert!(matches!(err, MockError::Terminal(ref m) if m == "connection reset"));
}

#[test]
fn reject_hook_counts_dropped_fields() {
    let rejected = Rc::new(Cell::new(0));
    let seen = rejected.clone();
    let _ = ModelFilter::<Ticket>::new()
        .order("body")
        .search("priority", "x")
        .match_field("body", "y")
        .on_reject(move |_field, _capability| seen.set(seen.get() + 1))
        .query(RecordingQuery::new());
    assert_eq!(rejected.get(), 3);
}

#[test]
fn reject_hook_reports_field_and_capability() {
    let log: Rc<std::cell::RefCell<Vec<(String, Capability)>>> = Rc::default();
    let seen = log.clone();
    let _ = ModelFilter::<Ticket>::new()
        .order("-body")
        .on_reject(move |field, capability| {
            seen.borrow_mut().push((field.to_string(), capability))
        })
        .query(RecordingQuery::new());
    assert_eq!(
        log.borrow().as_slice(),
        &[("body".to_string(), Capability::Order)]
    );
}
