use anyhow::anyhow;
use crane_core::{DbValidator, Parameter, Result, Value};

/// SQLite stores integers as signed 64 bit values.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDbValidator;

impl DbValidator for SqliteDbValidator {
    fn validate(&self, parameter: &Parameter) -> Result<()> {
        match &parameter.value {
            Value::UInt64(Some(v)) if i64::try_from(*v).is_err() => {
                Err(anyhow!("{v} does not fit in a SQLite INTEGER"))
            }
            _ => Ok(()),
        }
    }
}
