use crate::decode_column::{ColumnMetadata, decode_column};
use quote::ToTokens;
use syn::{Fields, Ident, ItemStruct, LitStr, parse::ParseBuffer};

pub(crate) struct TableMetadata {
    pub(crate) ident: Ident,
    pub(crate) name: String,
    pub(crate) schema: String,
    pub(crate) columns: Vec<ColumnMetadata>,
    /// Fields left out of the mapping.
    pub(crate) ignored: Vec<Ident>,
}

pub fn decode_table(item: &ItemStruct) -> TableMetadata {
    let Fields::Named(fields) = &item.fields else {
        panic!("`Entity` can be derived only for structs with named fields");
    };
    let mut name = String::new();
    let mut schema = String::new();
    for attr in &item.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("crane") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `crane`, use it like: `#[crane(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("table") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `table`, use it like: `#[crane(table = \"my_table\")]`"
                        );
                    };
                    name = value.value();
                } else if arg.path.is_ident("schema") {
                    let Ok(value) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `schema`, use it like: `#[crane(schema = \"my_schema\")]`"
                        );
                    };
                    schema = value.value();
                } else {
                    panic!(
                        "Unknown attribute `{}` inside crane macro",
                        arg.path.to_token_stream()
                    );
                }
                Ok(())
            });
        }
    }
    let mut columns = Vec::new();
    let mut ignored = Vec::new();
    for field in &fields.named {
        match decode_column(field) {
            Some(column) => columns.push(column),
            None => ignored.extend(field.ident.clone()),
        }
    }
    TableMetadata {
        ident: item.ident.clone(),
        name,
        schema,
        columns,
        ignored,
    }
}
