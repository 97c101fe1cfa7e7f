#![cfg(feature = "mock")]

//! A recording [`QueryBuilder`] for exercising compiled filters
//! without a storage backend.
//!
//! [`RecordingQuery`] stores every operation it receives as a
//! [`QueryOp`] value. The log can be read back either from the
//! returned builder with [`into_ops`](RecordingQuery::into_ops), or,
//! when a terminal operation consumes the builder, through a
//! [`Trace`] handle taken beforehand:
//!
//! ```rust
//! use model_filter::mock::{QueryOp, RecordingQuery};
//! use model_filter::{Filterable, ModelFilter};
//!
//! #[derive(Filterable)]
//! struct User {
//!     #[filter(match)]
//!     name: String,
//! }
//!
//! let db = RecordingQuery::new().with_rows(3);
//! let trace = db.trace();
//! let filter = ModelFilter::<User>::new().match_field("name", "alice");
//! assert_eq!(filter.count(db).unwrap(), 3);
//! assert_eq!(trace.ops()[0], QueryOp::Model("user".to_string()));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use serde_json::Value;
use thiserror::Error;

use crate::query::QueryBuilder;

/// Failure injected into a [`RecordingQuery`] terminal operation.
#[derive(Debug, Error)]
pub enum MockError {
    /// The configured terminal failure.
    #[error("query failed: {0}")]
    Terminal(String),
}

/// One operation received by a [`RecordingQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// Model binding.
    Model(String),
    /// Explicit join clause.
    Join {
        /// Join template.
        template: String,
        /// Positional bindings.
        args: Vec<Value>,
    },
    /// Ordering request.
    OrderBy {
        /// Column ordered by.
        column: String,
        /// True for descending order.
        descending: bool,
    },
    /// Predicate clause.
    Where {
        /// Predicate template.
        template: String,
        /// Positional bindings.
        args: Vec<Value>,
    },
    /// Page size.
    Limit(i64),
    /// Page offset.
    Offset(i64),
    /// Column projection.
    Select(Vec<String>),
    /// Eager-load directive.
    Preload {
        /// Relation name.
        relation: String,
        /// Extra condition arguments.
        args: Vec<Value>,
    },
}

/// A cloneable view of the operations a [`RecordingQuery`] received.
#[derive(Debug, Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<QueryOp>>>);

impl Trace {
    /// Snapshot of the recorded operations so far.
    pub fn ops(&self) -> Vec<QueryOp> {
        self.0.borrow().clone()
    }
}

/// A [`QueryBuilder`] that records instead of querying.
#[derive(Debug, Clone, Default)]
pub struct RecordingQuery {
    log: Trace,
    rows: u64,
    fail: Option<String>,
}

impl RecordingQuery {
    /// An empty recorder whose terminals report zero rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row count [`count`](QueryBuilder::count) and
    /// [`delete`](QueryBuilder::delete) report.
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = rows;
        self
    }

    /// Make the terminal operations fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    /// A handle onto the operation log that survives the builder.
    pub fn trace(&self) -> Trace {
        self.log.clone()
    }

    /// Consume the builder, returning the recorded operations.
    pub fn into_ops(self) -> Vec<QueryOp> {
        self.log.ops()
    }

    fn push(self, op: QueryOp) -> Self {
        trace!("recorded {:?}", op);
        self.log.0.borrow_mut().push(op);
        self
    }

    fn terminal(self) -> Result<u64, MockError> {
        match self.fail {
            Some(message) => Err(MockError::Terminal(message)),
            None => Ok(self.rows),
        }
    }
}

impl QueryBuilder for RecordingQuery {
    type Error = MockError;

    fn model(self, entity: &str) -> Self {
        self.push(QueryOp::Model(entity.to_string()))
    }

    fn join(self, template: &str, args: &[Value]) -> Self {
        self.push(QueryOp::Join {
            template: template.to_string(),
            args: args.to_vec(),
        })
    }

    fn order_by(self, column: &str, descending: bool) -> Self {
        self.push(QueryOp::OrderBy {
            column: column.to_string(),
            descending,
        })
    }

    fn where_clause(self, template: &str, args: &[Value]) -> Self {
        self.push(QueryOp::Where {
            template: template.to_string(),
            args: args.to_vec(),
        })
    }

    fn limit(self, limit: i64) -> Self {
        self.push(QueryOp::Limit(limit))
    }

    fn offset(self, offset: i64) -> Self {
        self.push(QueryOp::Offset(offset))
    }

    fn select(self, columns: &[String]) -> Self {
        self.push(QueryOp::Select(columns.to_vec()))
    }

    fn preload(self, relation: &str, args: &[Value]) -> Self {
        self.push(QueryOp::Preload {
            relation: relation.to_string(),
            args: args.to_vec(),
        })
    }

    fn count(self) -> Result<u64, MockError> {
        self.terminal()
    }

    fn delete(self) -> Result<u64, MockError> {
        self.terminal()
    }
}
