//! # Accumulate the filtering a request asks for
//!
//! A [`ModelFilter`] is the mutable intent object for one logical
//! query: it collects ordering, pagination, search, match, projection,
//! join, raw-clause and preload state, and is consumed once by the
//! compilation methods in [`query`](crate::query). It can be populated
//! two ways, which compose freely:
//!
//! - [`ModelFilter::from_params`] reads an untrusted parameter map,
//!   separating the six reserved functional keys (see
//!   [`FilterConfig`]) from arbitrary field-match keys;
//! - the chainable mutators ([`order`](ModelFilter::order),
//!   [`match_field`](ModelFilter::match_field),
//!   [`where_raw`](ModelFilter::where_raw), ...) set state directly
//!   from trusted call sites.
//!
//! No mutator validates anything. Validation happens entirely at
//! compile time against the entity's
//! [`EntityDescriptor`](crate::EntityDescriptor), and it is applied
//! uniformly: the compiler cannot tell parsed state from programmatic
//! state, so `order_by`, the searched fields and the matches are
//! always allow-listed, while raw clauses, joins, projection and
//! preloads are always applied as given and must only ever be fed by
//! trusted code.
//!
//! ```rust
//! use std::collections::HashMap;
//! use model_filter::{Filterable, FilterConfig, ModelFilter};
//!
//! #[derive(Filterable)]
//! struct User {
//!     #[filter(order, search, match)]
//!     name: String,
//! }
//!
//! let mut params: HashMap<String, Vec<String>> = HashMap::new();
//! params.insert("_limit".to_string(), vec!["10".to_string()]);
//! params.insert("name".to_string(), vec!["alice".to_string()]);
//!
//! let filter = ModelFilter::<User>::from_params(&params, &FilterConfig::default());
//! assert_eq!(filter.limit_value(), 10);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;

use serde_json::Value;

use crate::config::FilterConfig;
use crate::schema::{Capability, Filterable};

/// A predicate or join template with its positional arguments.
///
/// The template is applied verbatim by the query builder; every `?`
/// placeholder binds the next argument. Clauses are only ever created
/// by trusted call sites and are never allow-list filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Template text, e.g. `"age > ? AND name = ?"`.
    pub template: String,
    /// Positional bindings for the template's placeholders.
    pub args: Vec<Value>,
}

impl Clause {
    /// Create a clause from a template and its bindings.
    pub fn new(template: impl Into<String>, args: Vec<Value>) -> Self {
        Clause {
            template: template.into(),
            args,
        }
    }
}

/// A source of request parameters: key to list-of-values, as produced
/// by query-string decoding in any HTTP framework.
///
/// Only the first value of a key is ever used.
pub trait ParameterSource {
    /// First value recorded for `key`, if any.
    fn first(&self, key: &str) -> Option<&str>;

    /// Visit every `(key, first value)` pair. A key may be visited
    /// more than once when the underlying source allows repetition;
    /// consumers keep the first occurrence.
    fn each(&self, visit: &mut dyn FnMut(&str, &str));
}

impl ParameterSource for HashMap<String, Vec<String>> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    fn each(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (key, values) in self {
            if let Some(value) = values.first() {
                visit(key, value);
            }
        }
    }
}

impl ParameterSource for BTreeMap<String, Vec<String>> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    fn each(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (key, values) in self {
            if let Some(value) = values.first() {
                visit(key, value);
            }
        }
    }
}

impl ParameterSource for [(String, String)] {
    fn first(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    fn each(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (key, value) in self {
            visit(key, value);
        }
    }
}

pub(crate) type RejectHook = Box<dyn Fn(&str, Capability)>;

/// The per-request filter intent for entity type `R`.
///
/// Owned by a single logical operation: populated, compiled once via
/// [`query`](ModelFilter::query), [`count`](ModelFilter::count) or
/// [`delete`](ModelFilter::delete), then discarded.
pub struct ModelFilter<R: Filterable> {
    pub(crate) order_by: String,
    pub(crate) limit: i64,
    pub(crate) offset: i64,
    pub(crate) select_fields: String,
    pub(crate) search_fields: String,
    pub(crate) search_value: String,
    pub(crate) matches: BTreeMap<String, Value>,
    pub(crate) raw: Vec<Clause>,
    pub(crate) joins: Vec<Clause>,
    pub(crate) preloads: BTreeMap<String, Vec<Value>>,
    pub(crate) reject_hook: Option<RejectHook>,
    _marker: PhantomData<R>,
}

impl<R: Filterable> Default for ModelFilter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Filterable> ModelFilter<R> {
    /// Create an empty intent: no limit (-1), no offset, nothing else.
    pub fn new() -> Self {
        ModelFilter {
            order_by: String::new(),
            limit: -1,
            offset: 0,
            select_fields: String::new(),
            search_fields: String::new(),
            search_value: String::new(),
            matches: BTreeMap::new(),
            raw: Vec::new(),
            joins: Vec::new(),
            preloads: BTreeMap::new(),
            reject_hook: None,
            _marker: PhantomData,
        }
    }

    /// Populate an intent from untrusted request parameters.
    ///
    /// The six functional keys named by `config` control pagination,
    /// ordering, search and projection; every other key with a
    /// non-empty first value becomes a match request. A missing limit
    /// means -1 (no limit); a limit or offset that fails to parse is
    /// silently treated as 0.
    pub fn from_params<P: ParameterSource + ?Sized>(params: &P, config: &FilterConfig) -> Self {
        let mut filter = Self::new();
        filter.limit = match params.first(&config.limit_key) {
            Some(raw) => raw.parse().unwrap_or(0),
            None => -1,
        };
        filter.offset = params
            .first(&config.offset_key)
            .map(|raw| raw.parse().unwrap_or(0))
            .unwrap_or(0);
        filter.order_by = params
            .first(&config.order_key)
            .unwrap_or_default()
            .to_string();
        filter.select_fields = params
            .first(&config.fields_key)
            .unwrap_or_default()
            .to_string();
        filter.search_fields = params
            .first(&config.search_fields_key)
            .unwrap_or_default()
            .to_string();
        filter.search_value = params
            .first(&config.search_value_key)
            .unwrap_or_default()
            .to_string();

        params.each(&mut |key, value| {
            if config.is_functional_key(key) || value.is_empty() {
                return;
            }
            filter
                .matches
                .entry(key.to_string())
                .or_insert_with(|| Value::String(value.to_string()));
        });
        filter
    }

    /// Set the ordering field; a leading `-` requests descending order.
    pub fn order(mut self, value: impl Into<String>) -> Self {
        self.order_by = value.into();
        self
    }

    /// Set the page size; -1 means no limit.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page offset.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Restrict the returned columns to a comma-separated list.
    ///
    /// Projection is applied as given, with no capability check.
    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.select_fields = fields.into();
        self
    }

    /// Search for `value` as a substring across `fields`
    /// (comma-separated; empty means every searchable field).
    pub fn search(mut self, fields: impl Into<String>, value: impl Into<String>) -> Self {
        self.search_fields = fields.into();
        self.search_value = value.into();
        self
    }

    /// Request an equality or membership match on `field`.
    ///
    /// A string value containing commas becomes a membership test over
    /// the comma-split alternatives; anything else is an equality
    /// test. Setting the same field again replaces the earlier value.
    pub fn match_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.matches.insert(field.into(), value.into());
        self
    }

    /// Append a raw predicate clause, applied unfiltered and
    /// AND-combined with everything else. Trusted call sites only.
    pub fn where_raw(mut self, template: impl Into<String>, args: Vec<Value>) -> Self {
        self.raw.push(Clause::new(template, args));
        self
    }

    /// Append an explicit join specification, applied unfiltered in
    /// insertion order. Trusted call sites only.
    pub fn join(mut self, template: impl Into<String>, args: Vec<Value>) -> Self {
        self.joins.push(Clause::new(template, args));
        self
    }

    /// Eager-load `relation`, with optional extra condition arguments.
    pub fn preload(mut self, relation: impl Into<String>, args: Vec<Value>) -> Self {
        self.preloads.insert(relation.into(), args);
        self
    }

    /// Install a hook called with the field name and failed capability
    /// whenever an unauthorized field is dropped at compile time.
    ///
    /// Dropping stays silent towards the caller either way; the hook
    /// exists for operator visibility (counters, logs).
    pub fn on_reject(mut self, hook: impl Fn(&str, Capability) + 'static) -> Self {
        self.reject_hook = Some(Box::new(hook));
        self
    }

    /// The ordering expression currently set.
    pub fn order_field(&self) -> &str {
        &self.order_by
    }

    /// The page size currently set.
    pub fn limit_value(&self) -> i64 {
        self.limit
    }

    /// The page offset currently set.
    pub fn offset_value(&self) -> i64 {
        self.offset
    }
}
