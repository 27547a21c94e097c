use crane_core::{Context, Result, StatementBuilder};
use std::fmt::Write;

/// Positional `$n` placeholders, no table hints.
pub struct PostgresStatementBuilder;

impl StatementBuilder for PostgresStatementBuilder {
    fn as_dyn(&self) -> &dyn StatementBuilder {
        self
    }

    fn write_parameter(&self, context: &mut Context, out: &mut String, name: &str) {
        let index = context.parameter_index(name);
        let _ = write!(out, "{}{index}", context.setting.parameter_prefix());
    }

    fn write_hints(&self, _context: &mut Context, _out: &mut String, hints: Option<&str>) -> Result<()> {
        match hints.map(str::trim).filter(|v| !v.is_empty()) {
            Some(hints) => Err(crane_core::Error::unsupported(format!(
                "PostgreSQL has no table hints (got `{hints}`)"
            ))),
            None => Ok(()),
        }
    }
}
