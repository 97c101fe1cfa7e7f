//! Names of the reserved "functional" request parameters.
//!
//! Six parameter keys are reserved for query control and never
//! interpreted as field-match requests. Deployments that need
//! different names build a [`FilterConfig`] once at startup and pass
//! it to [`ModelFilter::from_params`](crate::ModelFilter::from_params);
//! there is no process-wide mutable state.
//!
//! ```rust
//! use model_filter::FilterConfig;
//!
//! let config = FilterConfig {
//!     limit_key: "limit".to_string(),
//!     offset_key: "offset".to_string(),
//!     ..FilterConfig::default()
//! };
//! assert!(config.is_functional_key("limit"));
//! assert!(!config.is_functional_key("_limit"));
//! ```

/// Default key for the page size parameter.
pub const DEFAULT_LIMIT_KEY: &str = "_limit";
/// Default key for the page offset parameter.
pub const DEFAULT_OFFSET_KEY: &str = "_offset";
/// Default key for the ordering parameter.
pub const DEFAULT_ORDER_KEY: &str = "_order";
/// Default key for the searched-fields parameter.
pub const DEFAULT_SEARCH_FIELDS_KEY: &str = "_search_fields";
/// Default key for the search value parameter.
pub const DEFAULT_SEARCH_VALUE_KEY: &str = "_search";
/// Default key for the projection parameter.
pub const DEFAULT_FIELDS_KEY: &str = "_fields";

/// The functional parameter key names used when parsing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Key carrying the page size.
    pub limit_key: String,
    /// Key carrying the page offset.
    pub offset_key: String,
    /// Key carrying the ordering expression.
    pub order_key: String,
    /// Key carrying the comma-separated list of fields to search.
    pub search_fields_key: String,
    /// Key carrying the substring to search for.
    pub search_value_key: String,
    /// Key carrying the comma-separated projection list.
    pub fields_key: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            limit_key: DEFAULT_LIMIT_KEY.to_string(),
            offset_key: DEFAULT_OFFSET_KEY.to_string(),
            order_key: DEFAULT_ORDER_KEY.to_string(),
            search_fields_key: DEFAULT_SEARCH_FIELDS_KEY.to_string(),
            search_value_key: DEFAULT_SEARCH_VALUE_KEY.to_string(),
            fields_key: DEFAULT_FIELDS_KEY.to_string(),
        }
    }
}

impl FilterConfig {
    /// True if `key` is one of the six reserved parameter names.
    pub fn is_functional_key(&self, key: &str) -> bool {
        key == self.limit_key
            || key == self.offset_key
            || key == self.order_key
            || key == self.search_fields_key
            || key == self.search_value_key
            || key == self.fields_key
    }
}
