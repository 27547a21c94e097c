use crate::{Command, DbField, Result, RowLabeled, TableRef};
use anyhow::anyhow;

/// Schema introspection of a database provider.
pub trait DbHelper: Send + Sync {
    /// Command listing the columns of `table`, `None` when the provider cannot introspect.
    fn fields_command(&self, _table: &TableRef) -> Option<Command> {
        None
    }
    /// Reads one row returned by [`DbHelper::fields_command`].
    fn read_field(&self, row: &RowLabeled) -> Result<DbField> {
        Err(anyhow!(
            "This provider does not read column metadata (got columns {:?})",
            row.names()
        ))
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct GenericDbHelper;

impl DbHelper for GenericDbHelper {}
