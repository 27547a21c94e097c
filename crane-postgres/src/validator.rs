use anyhow::anyhow;
use crane_core::{DbValidator, Parameter, Result, Value};

/// PostgreSQL has no unsigned integers and its text types cannot hold the NUL character.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDbValidator;

impl DbValidator for PostgresDbValidator {
    fn validate(&self, parameter: &Parameter) -> Result<()> {
        match &parameter.value {
            Value::UInt64(Some(v)) if i64::try_from(*v).is_err() => Err(anyhow!(
                "{v} does not fit in a PostgreSQL BIGINT"
            )),
            Value::Varchar(Some(v)) if v.contains('\0') => {
                Err(anyhow!("PostgreSQL text cannot contain the NUL character"))
            }
            _ => Ok(()),
        }
    }
}
