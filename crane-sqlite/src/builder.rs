use crane_core::{CommandRequest, Context, Error, Fragment, Result, StatementBuilder};

/// Named `@` placeholders. Hints are index clauses (`INDEXED BY name`, `NOT INDEXED`), refused on inserts.
pub struct SqliteStatementBuilder;

impl StatementBuilder for SqliteStatementBuilder {
    fn as_dyn(&self) -> &dyn StatementBuilder {
        self
    }

    fn write_hints(&self, context: &mut Context, out: &mut String, hints: Option<&str>) -> Result<()> {
        let Some(hints) = hints.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        let upper = hints.to_ascii_uppercase();
        if !upper.starts_with("INDEXED BY ") && upper != "NOT INDEXED" {
            return Err(Error::unsupported(format!(
                "SQLite accepts `INDEXED BY index` or `NOT INDEXED` as hints, got `{hints}`"
            )));
        }
        if matches!(context.fragment, Fragment::InsertInto) {
            return Err(Error::unsupported(format!(
                "SQLite does not accept `{hints}` on insert"
            )));
        }
        out.push(' ');
        out.push_str(hints);
        Ok(())
    }

    /// SQLite has no `TRUNCATE`, an unfiltered delete takes the truncate optimization.
    fn write_truncate(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("DELETE FROM ");
        self.write_table_ref(
            &mut context.switch_fragment(Fragment::Truncate).current,
            out,
            request.table,
        );
        out.push(';');
        Ok(())
    }
}
