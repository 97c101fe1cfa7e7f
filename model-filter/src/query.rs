//! # Compile a filter intent onto a query builder
//!
//! The compiler walks a [`ModelFilter`] and emits transformations onto
//! an external [`QueryBuilder`] in a fixed stage order:
//!
//! 1. model binding, then explicit joins (unfiltered);
//! 2. ordering, allow-listed against [`Capability::Order`];
//! 3. substring search, OR-combined across the allow-listed candidate
//!    fields;
//! 4. equality/membership matches, allow-listed against
//!    [`Capability::Match`] and AND-combined;
//! 5. raw clauses, in insertion order (unfiltered);
//! 6. pagination (the -1/0 sentinels pass through);
//! 7. projection (unfiltered);
//! 8. preloads (unfiltered).
//!
//! Unauthorized fields are dropped silently: the caller gets a
//! narrowed result set, never an error. Each drop is logged at debug
//! level and reported to the
//! [`on_reject`](ModelFilter::on_reject) hook when one is installed.
//!
//! Caller-controlled values never reach a template string. Search
//! patterns, match values and membership lists all travel as
//! positional [`serde_json::Value`] bindings; the only text
//! interpolated into a template is an allow-listed field name.
//!
//! ```rust
//! use model_filter::mock::{QueryOp, RecordingQuery};
//! use model_filter::{Filterable, ModelFilter};
//!
//! #[derive(Filterable)]
//! struct User {
//!     #[filter(order, search, match)]
//!     name: String,
//! }
//!
//! let filter = ModelFilter::<User>::new().order("-name");
//! let db = filter.query(RecordingQuery::new());
//! assert!(db.into_ops().contains(&QueryOp::OrderBy {
//!     column: "name".to_string(),
//!     descending: true,
//! }));
//! ```

use log::debug;
use serde_json::Value;

use crate::filtering::ModelFilter;
use crate::schema::{Capability, Filterable};

/// The external query-construction collaborator.
///
/// Implementations accumulate clauses by value, method-chaining
/// style, and materialize on demand. `where_clause` calls are
/// AND-combined; a template may contain its own `OR` structure. The
/// terminal operations are the only fallible surface: their error is
/// propagated to the caller as-is, unwrapped and unretried.
pub trait QueryBuilder: Sized {
    /// Error produced by the terminal operations.
    type Error;

    /// Bind the query to the named entity.
    fn model(self, entity: &str) -> Self;

    /// Apply an explicit join clause.
    fn join(self, template: &str, args: &[Value]) -> Self;

    /// Order the result by `column`, descending when asked.
    fn order_by(self, column: &str, descending: bool) -> Self;

    /// Add a predicate, AND-combined with those already applied.
    /// Every `?` placeholder in `template` binds the next argument.
    fn where_clause(self, template: &str, args: &[Value]) -> Self;

    /// Limit the result size; -1 means unlimited.
    fn limit(self, limit: i64) -> Self;

    /// Skip the first `offset` rows.
    fn offset(self, offset: i64) -> Self;

    /// Restrict the result columns.
    fn select(self, columns: &[String]) -> Self;

    /// Eager-load a relation, with optional extra arguments.
    fn preload(self, relation: &str, args: &[Value]) -> Self;

    /// Materialize a row count.
    fn count(self) -> Result<u64, Self::Error>;

    /// Delete the matched rows, returning how many were affected.
    fn delete(self) -> Result<u64, Self::Error>;
}

fn quoted(field: &str) -> String {
    format!("`{}`", field)
}

impl<R: Filterable> ModelFilter<R> {
    /// Compile the full intent onto `db` and return the transformed
    /// builder, ready for the caller to materialize rows.
    pub fn query<B: QueryBuilder>(&self, db: B) -> B {
        let db = db.model(R::entity_name());
        let db = self.join_stage(db);
        let db = self.order_stage(db);
        let db = self.search_stage(db);
        let db = self.match_stage(db);
        let db = self.raw_stage(db);
        let db = self.pagination_stage(db);
        let db = self.select_stage(db);
        self.preload_stage(db)
    }

    /// Count the rows the intent's predicates match.
    ///
    /// Reuses the predicate stages (joins, search, matches, raw
    /// clauses) and discards ordering, pagination, projection and
    /// preloads, none of which can change the count.
    pub fn count<B: QueryBuilder>(&self, db: B) -> Result<u64, B::Error> {
        let db = db.model(R::entity_name());
        let db = self.join_stage(db);
        let db = self.search_stage(db);
        let db = self.match_stage(db);
        let db = self.raw_stage(db);
        db.count()
    }

    /// Delete the rows the compiled query matches.
    pub fn delete<B: QueryBuilder>(&self, db: B) -> Result<u64, B::Error> {
        self.query(db).delete()
    }

    fn reject(&self, field: &str, capability: Capability) {
        debug!("dropping field `{}`: not permitted for {}", field, capability);
        if let Some(hook) = &self.reject_hook {
            hook(field, capability);
        }
    }

    fn join_stage<B: QueryBuilder>(&self, mut db: B) -> B {
        for clause in &self.joins {
            db = db.join(&clause.template, &clause.args);
        }
        db
    }

    fn order_stage<B: QueryBuilder>(&self, db: B) -> B {
        if self.order_by.is_empty() {
            return db;
        }
        let (column, descending) = match self.order_by.strip_prefix('-') {
            Some(base) => (base, true),
            None => (self.order_by.as_str(), false),
        };
        if R::descriptor().allows(column, Capability::Order) {
            db.order_by(column, descending)
        } else {
            self.reject(column, Capability::Order);
            db
        }
    }

    fn search_stage<B: QueryBuilder>(&self, db: B) -> B {
        if self.search_value.is_empty() {
            return db;
        }
        let descriptor = R::descriptor();
        let mut candidates: Vec<&str> = Vec::new();
        if self.search_fields.is_empty() {
            candidates.extend(descriptor.fields_with(Capability::Search));
        } else {
            for field in self.search_fields.split(',').filter(|f| !f.is_empty()) {
                if descriptor.allows(field, Capability::Search) {
                    candidates.push(field);
                } else {
                    self.reject(field, Capability::Search);
                }
            }
        }
        // An empty candidate set means no restriction, not an
        // always-false clause.
        if candidates.is_empty() {
            return db;
        }
        let template = candidates
            .iter()
            .map(|field| format!("{} LIKE ?", quoted(field)))
            .collect::<Vec<_>>()
            .join(" OR ");
        let pattern = Value::from(format!("%{}%", self.search_value));
        let args = vec![pattern; candidates.len()];
        db.where_clause(&template, &args)
    }

    fn match_stage<B: QueryBuilder>(&self, mut db: B) -> B {
        let descriptor = R::descriptor();
        for (field, value) in &self.matches {
            if !descriptor.allows(field, Capability::Match) {
                self.reject(field, Capability::Match);
                continue;
            }
            let alternatives: Vec<&str> = match value {
                Value::String(s) => s.split(',').collect(),
                _ => Vec::new(),
            };
            db = if alternatives.len() > 1 {
                let members = Value::from(
                    alternatives
                        .into_iter()
                        .map(Value::from)
                        .collect::<Vec<_>>(),
                );
                db.where_clause(&format!("{} IN (?)", quoted(field)), &[members])
            } else {
                db.where_clause(
                    &format!("{} = ?", quoted(field)),
                    std::slice::from_ref(value),
                )
            };
        }
        db
    }

    fn raw_stage<B: QueryBuilder>(&self, mut db: B) -> B {
        for clause in &self.raw {
            db = db.where_clause(&clause.template, &clause.args);
        }
        db
    }

    fn pagination_stage<B: QueryBuilder>(&self, db: B) -> B {
        db.limit(self.limit).offset(self.offset)
    }

    fn select_stage<B: QueryBuilder>(&self, db: B) -> B {
        if self.select_fields.is_empty() {
            return db;
        }
        let columns: Vec<String> = self
            .select_fields
            .split(',')
            .map(str::to_string)
            .collect();
        db.select(&columns)
    }

    fn preload_stage<B: QueryBuilder>(&self, mut db: B) -> B {
        for (relation, args) in &self.preloads {
            db = db.preload(relation, args);
        }
        db
    }
}
