use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;

/// Compiled getters and setters, one match arm per mapped property.
pub fn encode_bindable(table: &TableMetadata) -> TokenStream {
    let name = &table.ident;
    let getters = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let property = &c.property;
        quote! {
            #property => Some(::std::sync::Arc::new(|v: &Self| {
                ::crane::AsValue::as_value(::std::clone::Clone::clone(&v.#ident))
            })),
        }
    });
    let setters = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let property = &c.property;
        quote! {
            #property => Some(::std::sync::Arc::new(
                |v: &mut Self, value: ::crane::Value| -> ::crane::Result<()> {
                    v.#ident = <#ty as ::crane::AsValue>::try_from_value(value)?;
                    Ok(())
                },
            )),
        }
    });
    quote! {
        impl ::crane::Bindable for #name {
            fn getter(property: &str) -> Option<::crane::Getter<Self>> {
                match property {
                    #(#getters)*
                    _ => None,
                }
            }

            fn setter(property: &str) -> Option<::crane::Setter<Self>> {
                match property {
                    #(#setters)*
                    _ => None,
                }
            }
        }
    }
}
