//! # Declare which fields of an entity may be queried
//!
//! Every entity exposed through a filtered endpoint carries a
//! read-only [`EntityDescriptor`]: a mapping from exposed field name
//! to the set of [capabilities](Capability) granted to that field. A
//! field with no capabilities exists in the descriptor but cannot be
//! used to order, search or match, so a caller naming it in a request
//! simply narrows nothing.
//!
//! Descriptors are normally produced by the [`Filterable`] derive
//! macro, which turns `#[filter(...)]` field attributes into a cached
//! descriptor at compile time:
//!
//! ```rust
//! use model_filter::{Capability, Filterable};
//!
//! #[derive(Filterable)]
//! struct User {
//!     #[filter(order, search, match)]
//!     name: String,
//!     #[filter(order, match)]
//!     age: i32,
//! }
//!
//! let descriptor = User::descriptor();
//! assert!(descriptor.allows("name", Capability::Search));
//! assert!(!descriptor.allows("age", Capability::Search));
//! ```
//!
//! Descriptors can also be built by hand with
//! [`EntityDescriptor::builder`], either from structured capability
//! lists or from the legacy semicolon-delimited tag strings accepted
//! by [`tagged`](DescriptorBuilder::tagged).

use std::collections::BTreeMap;
use std::str::FromStr;

use strum::{Display, EnumString};

/// A permission granted to a field for one query-construction purpose.
///
/// The string token forms (`"order"`, `"search"`, `"match"`) are the
/// ones accepted by [`DescriptorBuilder::tagged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
    /// The field may appear in an ordering request.
    Order,
    /// The field participates in substring search.
    Search,
    /// The field may be matched for equality or membership.
    Match,
}

/// An immutable set of [`Capability`] values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The set granting no capabilities at all.
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    const fn bit(capability: Capability) -> u8 {
        match capability {
            Capability::Order => 1,
            Capability::Search => 1 << 1,
            Capability::Match => 1 << 2,
        }
    }

    /// Return a copy of this set with `capability` added.
    pub const fn with(self, capability: Capability) -> Self {
        CapabilitySet(self.0 | Self::bit(capability))
    }

    /// True if `capability` is granted by this set.
    pub const fn contains(&self, capability: Capability) -> bool {
        self.0 & Self::bit(capability) != 0
    }

    /// True if no capability is granted.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapabilitySet::empty(), CapabilitySet::with)
    }
}

/// The read-only capability map for one entity type.
///
/// Built once per type, never mutated afterwards. Lookups on unknown
/// field names return the empty set, so the descriptor can be
/// consulted with arbitrary caller-supplied names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDescriptor {
    fields: BTreeMap<String, CapabilitySet>,
}

impl EntityDescriptor {
    /// Start building a descriptor.
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// The capability set for `field`, empty for unknown names.
    pub fn capabilities(&self, field: &str) -> CapabilitySet {
        self.fields.get(field).copied().unwrap_or_default()
    }

    /// True if `field` is declared and grants `capability`.
    pub fn allows(&self, field: &str, capability: Capability) -> bool {
        self.capabilities(field).contains(capability)
    }

    /// All declared field names, in sorted order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The field names granting `capability`, in sorted order.
    pub fn fields_with(&self, capability: Capability) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(move |(_, caps)| caps.contains(capability))
            .map(|(name, _)| name.as_str())
    }
}

/// Accumulates field declarations for an [`EntityDescriptor`].
///
/// When two declarations resolve to the same exposed name the later
/// one wins outright; capability sets are replaced, not merged.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    fields: BTreeMap<String, CapabilitySet>,
}

impl DescriptorBuilder {
    /// Declare a field under the snake-cased form of `declared`.
    pub fn field(self, declared: &str, capabilities: &[Capability]) -> Self {
        self.insert(snake_case(declared), capabilities.iter().copied().collect())
    }

    /// Declare a field under an explicit name, bypassing normalization.
    pub fn named_field(self, name: &str, capabilities: &[Capability]) -> Self {
        self.insert(name.to_string(), capabilities.iter().copied().collect())
    }

    /// Declare a field from a semicolon-delimited capability tag.
    ///
    /// The recognized tokens are `order`, `search` and `match`;
    /// anything else is ignored without error. A first token of the
    /// form `name:<alias>` overrides the snake-cased name derived from
    /// `declared`.
    pub fn tagged(self, declared: &str, tags: &str) -> Self {
        let mut name = snake_case(declared);
        let mut capabilities = CapabilitySet::empty();
        for (index, token) in tags.split(';').enumerate() {
            if index == 0 {
                if let Some(alias) = token.strip_prefix("name:") {
                    name = alias.to_string();
                    continue;
                }
            }
            if let Ok(capability) = Capability::from_str(token) {
                capabilities = capabilities.with(capability);
            }
        }
        self.insert(name, capabilities)
    }

    fn insert(mut self, name: String, capabilities: CapabilitySet) -> Self {
        self.fields.insert(name, capabilities);
        self
    }

    /// Finish, producing the immutable descriptor.
    pub fn build(self) -> EntityDescriptor {
        EntityDescriptor {
            fields: self.fields,
        }
    }
}

/// An entity type that can describe its queryable fields.
///
/// Normally implemented through the [`Filterable`] derive macro. The
/// descriptor must be identical on every call; the derive caches it in
/// a [`std::sync::OnceLock`], and hand-written implementations should
/// do the same or return a reference to other static data.
pub trait Filterable {
    /// The name used when binding the query builder to this entity,
    /// by default the snake-cased type name.
    fn entity_name() -> &'static str;

    /// The capability descriptor for this entity type.
    fn descriptor() -> &'static EntityDescriptor;
}

/// Convert a declared identifier to its exposed snake_case form.
///
/// Runs of capitals are treated as acronyms, so `HTTPCode` becomes
/// `http_code` and `CreatedAt` becomes `created_at`.
pub fn snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (index, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let after_lower = index > 0
                && (chars[index - 1].is_lowercase() || chars[index - 1].is_ascii_digit());
            let before_lower = chars
                .get(index + 1)
                .map(|next| next.is_lowercase())
                .unwrap_or(false);
            if index > 0 && (after_lower || before_lower) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
