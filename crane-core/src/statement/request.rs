use crate::{CommandKind, DbField, DbSetting, Field, OrderField, QueryGroup, TableRef};

/// Everything a [`crate::StatementBuilder`] needs to write one statement.
#[derive(Clone, Copy)]
pub struct CommandRequest<'a> {
    pub kind: CommandKind,
    pub table: &'a TableRef,
    /// Selected, inserted or updated columns, in parameter order. The aggregate kinds carry their column here.
    pub fields: &'a [Field],
    /// Columns matching existing rows in updates and merges.
    pub qualifiers: &'a [Field],
    pub primary: Option<&'a DbField>,
    pub identity: Option<&'a DbField>,
    /// Parameter names must already be assigned.
    pub filter: Option<&'a QueryGroup>,
    pub order_by: &'a [OrderField],
    pub top: Option<u64>,
    pub hints: Option<&'a str>,
    /// Rows written by one statement, zero for the kinds that do not write rows.
    pub batch_size: usize,
    pub setting: &'a dyn DbSetting,
}

impl<'a> CommandRequest<'a> {
    pub fn new(kind: CommandKind, table: &'a TableRef, setting: &'a dyn DbSetting) -> Self {
        Self {
            kind,
            table,
            fields: &[],
            qualifiers: &[],
            primary: None,
            identity: None,
            filter: None,
            order_by: &[],
            top: None,
            hints: None,
            batch_size: 0,
            setting,
        }
    }

    /// Canonical key of the statement this request produces on `provider`.
    pub fn key(&self, provider: &str) -> CommandKey {
        CommandKey {
            provider: provider.to_string(),
            kind: self.kind,
            table: self.table.to_string(),
            fields: Field::signature(self.fields),
            qualifiers: Field::signature(self.qualifiers),
            keys: format!(
                "{}|{}",
                self.primary.map(|v| v.name.as_str()).unwrap_or_default(),
                self.identity.map(|v| v.name.as_str()).unwrap_or_default(),
            ),
            filter: self.filter.map(QueryGroup::shape).unwrap_or_default(),
            order_by: OrderField::signature(self.order_by),
            top: self.top,
            hints: self.hints.map(ToString::to_string),
            batch_size: self.batch_size,
        }
    }
}

/// Identity of a generated statement.
///
/// Two requests with the same table, kind, columns and filter shape share a key whatever the values or the
/// `QueryGroup` instances. Filters expressing the same logic in a different order produce different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandKey {
    pub provider: String,
    pub kind: CommandKind,
    pub table: String,
    pub fields: String,
    pub qualifiers: String,
    pub keys: String,
    pub filter: String,
    pub order_by: String,
    pub top: Option<u64>,
    pub hints: Option<String>,
    pub batch_size: usize,
}
