mod decode_column;
mod decode_filter;
mod decode_table;
mod encode_bindable;
mod encode_entity;

use decode_filter::decode_filter;
use decode_table::decode_table;
use encode_bindable::encode_bindable;
use encode_entity::encode_entity;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Expr, ItemStruct, parse_macro_input};

/// Maps a struct with named fields to a table.
///
/// Table attributes: `#[crane(table = "customers", schema = "sales")]`, both optional.
/// Field attributes: `#[crane(name = "email_address")]`, `#[crane(primary_key)]`, `#[crane(identity)]`,
/// `#[crane(ignore)]` (not mapped, filled with `Default::default()` when reading).
#[proc_macro_derive(Entity, attributes(crane))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    let table = decode_table(&item);
    let bindable = encode_bindable(&table);
    let entity = encode_entity(&table);
    quote! {
        #bindable
        #entity
    }
    .into()
}

/// Builds a `crane::Predicate` from a Rust boolean expression.
///
/// `Type::field` paths are columns, every other operand is evaluated and bound as a value:
/// `filter!(Customer::age >= min_age && Customer::email.ends_with("@example.com"))`.
#[proc_macro]
pub fn filter(input: TokenStream) -> TokenStream {
    let expr = parse_macro_input!(input as Expr);
    decode_filter(&expr).into()
}
