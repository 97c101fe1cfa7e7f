use std::collections::BTreeSet;

use syn::ext::IdentExt;

#[derive(Debug)]
pub enum FilterItem {
    Capability(syn::Ident),
    Rename(syn::LitStr),
    Entity(syn::LitStr),
}

impl syn::parse::Parse for FilterItem {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        // parse_any because `match` is a keyword
        let attr = input.call(syn::Ident::parse_any)?;
        match attr.to_string().as_str() {
            "order" | "search" | "match" => Ok(FilterItem::Capability(attr)),
            "rename" => {
                // rename = "MyString"
                let _: syn::Token![=] = input.parse()?;
                let new_name: syn::LitStr = input.parse()?;
                Ok(FilterItem::Rename(new_name))
            }
            "entity" => {
                // entity = "table_name"
                let _: syn::Token![=] = input.parse()?;
                let name: syn::LitStr = input.parse()?;
                Ok(FilterItem::Entity(name))
            }
            _ => Err(syn::Error::new_spanned(
                attr,
                "unsupported filter attribute",
            )),
        }
    }
}

#[derive(Debug, Default)]
pub struct FieldMeta {
    pub name: Option<syn::LitStr>,
    pub capabilities: BTreeSet<String>,
}

impl syn::parse::Parse for FieldMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let punc =
            syn::punctuated::Punctuated::<FilterItem, syn::Token![,]>::parse_terminated(input)?;
        let mut meta = FieldMeta::default();
        for item in punc {
            match item {
                FilterItem::Capability(ident) => {
                    meta.capabilities.insert(ident.to_string());
                }
                FilterItem::Rename(new_name) => {
                    meta.name = Some(new_name);
                }
                FilterItem::Entity(name) => {
                    return Err(syn::Error::new_spanned(
                        name,
                        "`entity` is only valid on the struct itself",
                    ));
                }
            }
        }
        Ok(meta)
    }
}

#[derive(Debug, Default)]
pub struct ContainerMeta {
    pub entity: Option<syn::LitStr>,
}

impl syn::parse::Parse for ContainerMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let punc =
            syn::punctuated::Punctuated::<FilterItem, syn::Token![,]>::parse_terminated(input)?;
        let mut meta = ContainerMeta::default();
        for item in punc {
            match item {
                FilterItem::Entity(name) => {
                    meta.entity = Some(name);
                }
                FilterItem::Capability(ident) => {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "capabilities are only valid on fields",
                    ));
                }
                FilterItem::Rename(new_name) => {
                    return Err(syn::Error::new_spanned(
                        new_name,
                        "`rename` is only valid on fields",
                    ));
                }
            }
        }
        Ok(meta)
    }
}
