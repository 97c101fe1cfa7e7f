use proc_macro::{self, TokenStream};

use proc_macro2 as pm2;

mod attributes;
mod filtering;
mod helpers;

/// Derive the `Filterable` trait, building the entity's capability
/// descriptor at compile time.
///
/// This is only implemented for structs with named fields. Every field
/// is registered in the descriptor under the snake-cased form of its
/// identifier; fields without annotations carry no capabilities and so
/// can never be ordered by, searched, or matched. The annotations use
/// the `filter` attribute, which has the following options:
///
/// - `#[filter(order, search, match)]` Grant the annotated field any
///   subset of the three capabilities: `order` allows it in ordering
///   requests, `search` includes it in substring search, `match`
///   allows equality/membership matching.
///
/// - `#[filter(rename="new_name")]` Expose the annotated field as
///   `new_name` instead of its (snake-cased) name in the source code.
///   The replacement name is used exactly as written.
///
/// - `#[filter(entity="table_name")]` On the struct itself: bind the
///   query builder to `table_name` instead of the snake-cased type
///   name.
///
/// The generated descriptor is built once and cached in a
/// `std::sync::OnceLock`, so repeated lookups are free and racing
/// initializations are harmless.
#[proc_macro_derive(Filterable, attributes(filter))]
pub fn filterable(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = filtering::derive_filterable(derive);

    res.into()
}
