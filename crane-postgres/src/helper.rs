use anyhow::anyhow;
use crane_core::{
    AsValue, Command, DbField, DbHelper, Parameter, Result, RowLabeled, TableRef, Value,
};

/// Reads column metadata from `information_schema`.
pub struct PostgresDbHelper;

const FIELDS_QUERY: &str = "\
SELECT c.column_name, c.is_nullable, c.data_type, c.character_maximum_length, c.is_identity, c.column_default,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_name = tc.constraint_name AND kcu.table_schema = tc.table_schema
        WHERE tc.constraint_type = 'PRIMARY KEY'
            AND tc.table_schema = c.table_schema
            AND tc.table_name = c.table_name
            AND kcu.column_name = c.column_name
    ) AS is_primary
FROM information_schema.columns c
WHERE c.table_schema = $1 AND c.table_name = $2
ORDER BY c.ordinal_position;";

impl DbHelper for PostgresDbHelper {
    fn fields_command(&self, table: &TableRef) -> Option<Command> {
        let schema = match table.schema.as_str() {
            "" => "public",
            v => v,
        };
        Some(Command::new(
            FIELDS_QUERY,
            vec![
                Parameter::new("schema", schema),
                Parameter::new("table", table.name.as_str()),
            ],
        ))
    }

    fn read_field(&self, row: &RowLabeled) -> Result<DbField> {
        let text = |name: &str| row.get_column(name).and_then(Value::as_str).unwrap_or_default();
        let name = text("column_name");
        if name.is_empty() {
            return Err(anyhow!(
                "Column metadata row without `column_name` (got columns {:?})",
                row.names()
            ));
        }
        let data_type = text("data_type");
        let serial = text("column_default").starts_with("nextval(");
        let is_primary = match row.get_column("is_primary") {
            Some(v) if !v.is_null() => bool::try_from_value(v.clone())?,
            _ => false,
        };
        Ok(DbField {
            name: name.to_string(),
            is_primary,
            is_identity: text("is_identity").eq_ignore_ascii_case("YES") || serial,
            is_nullable: text("is_nullable").eq_ignore_ascii_case("YES"),
            value: prototype(data_type),
            size: row
                .get_column("character_maximum_length")
                .and_then(Value::as_i128)
                .and_then(|v| u32::try_from(v).ok()),
            database_type: Some(data_type.to_string()),
        })
    }
}

fn prototype(data_type: &str) -> Value {
    match data_type {
        "boolean" => Value::Boolean(None),
        "smallint" => Value::Int16(None),
        "integer" => Value::Int32(None),
        "bigint" => Value::Int64(None),
        "real" => Value::Float32(None),
        "double precision" => Value::Float64(None),
        "numeric" => Value::Decimal(None),
        "text" | "character varying" | "character" => Value::Varchar(None),
        "bytea" => Value::Blob(None),
        "date" => Value::Date(None),
        "time without time zone" => Value::Time(None),
        "timestamp without time zone" => Value::Timestamp(None),
        "timestamp with time zone" => Value::TimestampWithTimezone(None),
        "uuid" => Value::Uuid(None),
        _ => {
            log::warn!("Unexpected PostgreSQL type `{data_type}`, the column is read untyped");
            Value::Null
        }
    }
}
