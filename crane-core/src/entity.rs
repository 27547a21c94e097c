use crate::{EntityMetadata, Result, RowLabeled, Value};
use anyhow::{Context, anyhow};
use std::{
    fmt::{self, Display},
    mem,
    sync::Arc,
};

/// Compiled reader of one property.
pub type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
/// Compiled writer of one property.
pub type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<()> + Send + Sync>;

/// Reference to a mapped property, emitted as an associated constant by `#[derive(Entity)]` so that filters can
/// name `Customer::email`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Column name from the attributes (or the property name).
    pub name: &'static str,
    pub property: &'static str,
}

/// Static description of one mapped property.
#[derive(Debug)]
pub struct ColumnDef {
    pub column_ref: ColumnRef,
    /// Type prototype.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: bool,
    pub identity: bool,
}

/// Table declared by the entity attributes, an empty name leaves it to the naming convention of the provider.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub schema: &'static str,
}

/// Resolved table.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: String,
    pub schema: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: String::new(),
        }
    }
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.schema.is_empty() {
            write!(f, "{}.", self.schema)?;
        }
        f.write_str(&self.name)
    }
}

/// Shape whose properties can be read and written through compiled closures.
///
/// Implemented by `#[derive(Entity)]` and by [`crate::Record`]. The closures are compiled once per shape and
/// stored in the execution context cache.
pub trait Bindable: Send + Sync + 'static {
    fn getter(property: &str) -> Option<Getter<Self>>;
    fn setter(property: &str) -> Option<Setter<Self>>;
}

/// Statically mapped row type, usually derived.
pub trait Entity: Bindable + Sized {
    /// Name of the Rust type, input of the table naming convention and of the key conventions.
    fn type_name() -> &'static str;
    fn table_def() -> &'static TableDef;
    fn columns() -> &'static [ColumnDef];
    fn from_row(row: RowLabeled, metadata: &EntityMetadata) -> Result<Self>;
}

/// Takes values out of a row by property name, following the resolved column mapping.
pub struct RowReader<'a> {
    row: RowLabeled,
    metadata: &'a EntityMetadata,
}

impl<'a> RowReader<'a> {
    pub fn new(row: RowLabeled, metadata: &'a EntityMetadata) -> Self {
        Self { row, metadata }
    }
    pub fn take<T: crate::AsValue>(&mut self, property: &str) -> Result<T> {
        let column = self
            .metadata
            .column_of(property)
            .map(|c| c.field.name())
            .unwrap_or(property);
        let Some(index) = self
            .row
            .labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(column))
        else {
            return T::try_from_value(Value::Null).map_err(|_| {
                anyhow!(
                    "Column `{column}` for property `{property}` is missing from the result of `{}`",
                    self.metadata.table
                )
            });
        };
        let value = mem::take(&mut self.row.values[index]);
        T::try_from_value(value).with_context(|| {
            format!(
                "Could not read column `{column}` into property `{property}` of `{}`",
                self.metadata.table
            )
        })
    }
}
