use proc_macro2 as pm2;

use syn::ext::IdentExt;

use crate::attributes::{ContainerMeta, FieldMeta};
use crate::helpers::snake_case;

pub fn derive_filterable(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        attrs,
        ..
    } = input;

    let mut entity = snake_case(&ident.to_string());
    for attr in attrs.iter() {
        if attr.path.is_ident("filter") {
            let parsed = match attr.parse_args::<ContainerMeta>() {
                Ok(parsed) => parsed,
                Err(e) => return syn::Error::into_compile_error(e),
            };
            if let Some(name) = parsed.entity {
                entity = name.value();
            }
        }
    }

    let mut registrations = pm2::TokenStream::new();

    if let syn::Data::Struct(s) = data {
        if let syn::Fields::Named(syn::FieldsNamed { named, .. }) = s.fields {
            for field in named.iter() {
                let fieldid = field.ident.as_ref().unwrap();
                let mut meta = FieldMeta::default();

                for attr in field.attrs.iter() {
                    if attr.path.is_ident("filter") {
                        meta = match attr.parse_args::<FieldMeta>() {
                            Ok(parsed) => parsed,
                            Err(e) => return syn::Error::into_compile_error(e),
                        };
                    }
                }

                let capabilities: Vec<pm2::TokenStream> = meta
                    .capabilities
                    .iter()
                    .map(|capability| match capability.as_str() {
                        "order" => quote::quote! { ::model_filter::Capability::Order },
                        "search" => quote::quote! { ::model_filter::Capability::Search },
                        _ => quote::quote! { ::model_filter::Capability::Match },
                    })
                    .collect();

                if let Some(name) = meta.name {
                    registrations.extend(quote::quote! {
                        .named_field(#name, &[#(#capabilities),*])
                    });
                } else {
                    let declared = fieldid.unraw().to_string();
                    registrations.extend(quote::quote! {
                        .field(#declared, &[#(#capabilities),*])
                    });
                }
            }
        } else {
            return syn::Error::new(
                ident.span(),
                "Filterable can only be derived for structs with named fields.",
            )
            .to_compile_error();
        }
    } else {
        return syn::Error::new(
            ident.span(),
            "Filterable can only be derived for structs with named fields.",
        )
        .to_compile_error();
    }

    let wc = generics.where_clause.as_ref();

    quote::quote! {
        #[automatically_derived]
        impl #generics ::model_filter::Filterable for #ident #generics #wc {
            fn entity_name() -> &'static str {
                #entity
            }

            fn descriptor() -> &'static ::model_filter::EntityDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<::model_filter::EntityDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    ::model_filter::EntityDescriptor::builder()
                        #registrations
                        .build()
                })
            }
        }
    }
}
