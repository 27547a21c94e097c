use crate::decode_table::TableMetadata;
use proc_macro2::TokenStream;
use quote::quote;

pub fn encode_entity(table: &TableMetadata) -> TokenStream {
    let name = &table.ident;
    let type_name = name.to_string();
    let table_name = &table.name;
    let schema = &table.schema;
    let column_refs = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let column = &c.name;
        let property = &c.property;
        quote! {
            #[allow(non_upper_case_globals)]
            pub const #ident: ::crane::ColumnRef = ::crane::ColumnRef {
                name: #column,
                property: #property,
            };
        }
    });
    let column_defs = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let nullable = c.nullable;
        let primary_key = c.primary_key;
        let identity = c.identity;
        quote! {
            ::crane::ColumnDef {
                column_ref: #name::#ident,
                value: <#ty as ::crane::AsValue>::as_empty_value(),
                nullable: #nullable,
                primary_key: #primary_key,
                identity: #identity,
            }
        }
    });
    let read = table.columns.iter().map(|c| {
        let ident = &c.ident;
        let ty = &c.ty;
        let property = &c.property;
        quote!(#ident: reader.take::<#ty>(#property)?)
    });
    let ignored = table
        .ignored
        .iter()
        .map(|ident| quote!(#ident: ::std::default::Default::default()));
    quote! {
        impl #name {
            #(#column_refs)*
        }

        impl ::crane::Entity for #name {
            fn type_name() -> &'static str {
                #type_name
            }

            fn table_def() -> &'static ::crane::TableDef {
                static TABLE_DEF: ::crane::TableDef = ::crane::TableDef {
                    name: #table_name,
                    schema: #schema,
                };
                &TABLE_DEF
            }

            fn columns() -> &'static [::crane::ColumnDef] {
                static RESULT: ::std::sync::LazyLock<Box<[::crane::ColumnDef]>> =
                    ::std::sync::LazyLock::new(|| vec![#(#column_defs),*].into_boxed_slice());
                &RESULT
            }

            fn from_row(
                row: ::crane::RowLabeled,
                metadata: &::crane::EntityMetadata,
            ) -> ::crane::Result<Self> {
                let mut reader = ::crane::RowReader::new(row, metadata);
                Ok(Self {
                    #(#read,)*
                    #(#ignored,)*
                })
            }
        }
    }
}
