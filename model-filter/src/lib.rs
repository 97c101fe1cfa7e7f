//! # Turn untrusted request parameters into safe query operations
//!
//! An API that exposes list endpoints over a data entity usually
//! wants to accept flexible query parameters for ordering, pagination,
//! substring search and field matching, without letting callers name
//! arbitrary columns or smuggle predicates into the generated query.
//! This crate is the translation layer: it parses a request's
//! parameter map into a [`ModelFilter`] intent, checks every
//! caller-supplied field name against a per-entity allow-list, and
//! compiles the intent, in a fixed stage order, onto any
//! [`QueryBuilder`] implementation.
//!
//! Which fields may be ordered by, searched, or matched is declared
//! inline on the entity type with the [`Filterable`] derive macro:
//!
//! ```rust
//! use std::collections::HashMap;
//! use model_filter::mock::{QueryOp, RecordingQuery};
//! use model_filter::{Filterable, FilterConfig, ModelFilter};
//!
//! #[derive(Filterable)]
//! struct User {
//!     #[filter(order, search, match)]
//!     name: String,
//!     #[filter(order, match)]
//!     age: i32,
//!     #[filter(search, match)]
//!     email: String,
//! }
//!
//! let mut params: HashMap<String, Vec<String>> = HashMap::new();
//! params.insert("_order".to_string(), vec!["-age".to_string()]);
//! params.insert("name".to_string(), vec!["alice".to_string()]);
//!
//! let filter = ModelFilter::<User>::from_params(&params, &FilterConfig::default());
//! let ops = filter.query(RecordingQuery::new()).into_ops();
//! assert!(ops.contains(&QueryOp::OrderBy {
//!     column: "age".to_string(),
//!     descending: true,
//! }));
//! ```
//!
//! Requests that name unauthorized fields are not rejected: the
//! offending piece of the request is silently dropped and the rest
//! still applies, so callers receive a narrowed result set rather
//! than an error. This fail-open policy is the documented contract;
//! deployments that need strict validation must add their own layer
//! in front, and can observe drops through
//! [`ModelFilter::on_reject`] or the crate's `debug`-level logging.
//!
//! Trusted call sites can bypass parsing entirely and use the
//! chainable mutators on [`ModelFilter`], including the unfiltered
//! escape hatches [`where_raw`](ModelFilter::where_raw),
//! [`join`](ModelFilter::join) and [`select`](ModelFilter::select).
//! Those never see the allow-list and must not be fed caller input.

pub mod config;
pub mod filtering;
pub mod mock;
pub mod query;
pub mod schema;

pub use crate::config::FilterConfig;
pub use crate::filtering::{Clause, ModelFilter, ParameterSource};
pub use crate::query::QueryBuilder;
pub use crate::schema::{
    snake_case, Capability, CapabilitySet, DescriptorBuilder, EntityDescriptor, Filterable,
};
pub use model_filter_derive::Filterable;
