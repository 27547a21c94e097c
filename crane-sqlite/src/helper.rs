use anyhow::anyhow;
use crane_core::{AsValue, Command, DbField, DbHelper, Result, RowLabeled, TableRef, Value};

/// Reads column metadata through `PRAGMA table_info`.
pub struct SqliteDbHelper;

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

impl DbHelper for SqliteDbHelper {
    fn fields_command(&self, table: &TableRef) -> Option<Command> {
        let schema = match table.schema.as_str() {
            "" => String::new(),
            v => format!("{}.", quoted(v)),
        };
        Some(Command::new(
            format!("PRAGMA {schema}table_info({});", quoted(&table.name)),
            Vec::new(),
        ))
    }

    fn read_field(&self, row: &RowLabeled) -> Result<DbField> {
        let Some(name) = row.get_column("name").and_then(Value::as_str) else {
            return Err(anyhow!(
                "Column metadata row without `name` (got columns {:?})",
                row.names()
            ));
        };
        let declared = row
            .get_column("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_ascii_uppercase();
        let flag = |column: &str| -> Result<i64> {
            match row.get_column(column) {
                Some(v) if !v.is_null() => i64::try_from_value(v.clone()),
                _ => Ok(0),
            }
        };
        let primary_position = flag("pk")?;
        let (value, size) = affinity(&declared);
        Ok(DbField {
            name: name.to_string(),
            is_primary: primary_position > 0,
            // `INTEGER PRIMARY KEY` aliases the rowid
            is_identity: primary_position == 1 && declared == "INTEGER",
            is_nullable: flag("notnull")? == 0 && primary_position == 0,
            value,
            size,
            database_type: (!declared.is_empty()).then_some(declared),
        })
    }
}

/// Type prototype following the column affinity rules, plus the declared length (`VARCHAR(40)`).
fn affinity(declared: &str) -> (Value, Option<u32>) {
    let size = declared
        .split_once('(')
        .and_then(|(_, rest)| rest.split([',', ')']).next())
        .and_then(|v| v.trim().parse().ok());
    let value = if declared.contains("INT") {
        Value::Int64(None)
    } else if ["CHAR", "CLOB", "TEXT"].iter().any(|v| declared.contains(v)) {
        Value::Varchar(None)
    } else if declared.is_empty() || declared.contains("BLOB") {
        Value::Blob(None)
    } else if ["REAL", "FLOA", "DOUB"].iter().any(|v| declared.contains(v)) {
        Value::Float64(None)
    } else {
        Value::Decimal(None)
    };
    (value, size)
}
