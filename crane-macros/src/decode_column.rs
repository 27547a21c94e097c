use quote::ToTokens;
use syn::{Field, Ident, LitStr, Type, TypePath, parse::ParseBuffer};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Property name, the field identifier without raw prefix.
    pub(crate) property: String,
    pub(crate) name: String,
    pub(crate) nullable: bool,
    pub(crate) primary_key: bool,
    pub(crate) identity: bool,
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(TypePath { path, .. }) => path
            .segments
            .last()
            .is_some_and(|v| v.ident == "Option"),
        _ => false,
    }
}

/// Mapping of one field, `None` when it carries `#[crane(ignore)]`.
pub fn decode_column(field: &Field) -> Option<ColumnMetadata> {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let property = ident.to_string().trim_start_matches("r#").to_string();
    let mut metadata = ColumnMetadata {
        ident,
        ty: field.ty.clone(),
        name: property.clone(),
        property,
        nullable: is_option(&field.ty),
        primary_key: false,
        identity: false,
    };
    let mut ignore = false;
    for attr in &field.attrs {
        let meta = &attr.meta;
        if meta.path().is_ident("crane") {
            let Ok(list) = meta.require_list() else {
                panic!("Error while parsing `crane`, use it like: `#[crane(attribute = value, ..)]`");
            };
            let _ = list.parse_nested_meta(|arg| {
                if arg.path.is_ident("name") {
                    let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                        panic!(
                            "Error while parsing `name`, use it like: `#[crane(name = \"my_column\")]`"
                        );
                    };
                    metadata.name = v.value();
                } else if arg.path.is_ident("primary_key") {
                    let Err(..) = arg.value() else {
                        // value() is Err for Meta::Path
                        panic!("Error while parsing `primary_key`, use it like: `#[crane(primary_key)]`");
                    };
                    metadata.primary_key = true;
                } else if arg.path.is_ident("identity") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `identity`, use it like: `#[crane(identity)]`");
                    };
                    metadata.identity = true;
                } else if arg.path.is_ident("ignore") {
                    let Err(..) = arg.value() else {
                        panic!("Error while parsing `ignore`, use it like: `#[crane(ignore)]`");
                    };
                    ignore = true;
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
    (!ignore).then_some(metadata)
}
