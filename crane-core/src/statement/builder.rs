use crate::{
    CommandKind, CommandRequest, Conjunction, Context, DbField, Field, Fragment, Operation,
    Order, OrderField, QueryField, QueryGroup, QueryItem, Result, TableRef, batch_parameters,
    possibly_parenthesized, sanitize_parameter, separated_by,
};
use anyhow::anyhow;
use std::fmt::Write;

/// Dialect printer turning a [`CommandRequest`] into SQL text.
///
/// The engine calls [`StatementBuilder::build`] only when the command text cache misses, implementations must
/// therefore be deterministic and free of side effects: the same request always yields the same text.
///
/// Placeholders are written in canonical order. Inserts and merges bind the fields row by row, updates bind the
/// set fields then the filter, queries bind the filter then the paging.
pub trait StatementBuilder: Send + Sync {
    fn as_dyn(&self) -> &dyn StatementBuilder;

    fn build(&self, request: &CommandRequest) -> Result<String> {
        use CommandKind::*;
        let mut out = String::with_capacity(128 + request.fields.len() * 32);
        let mut context = Context::new(Fragment::None, request.setting);
        match request.kind {
            Query | QueryAll => self.write_query(&mut context, &mut out, request)?,
            BatchQuery => self.write_batch_query(&mut context, &mut out, request)?,
            Insert | InsertAll => self.write_insert(&mut context, &mut out, request)?,
            Update => self.write_update(&mut context, &mut out, request)?,
            UpdateAll => self.write_update_all(&mut context, &mut out, request)?,
            Merge | MergeAll => self.write_merge(&mut context, &mut out, request)?,
            Delete | DeleteAll => self.write_delete(&mut context, &mut out, request)?,
            Count | CountAll => self.write_count(&mut context, &mut out, request)?,
            Average | AverageAll | Min | MinAll | Max | MaxAll | Sum | SumAll => {
                self.write_aggregate(&mut context, &mut out, request)?
            }
            Exists => self.write_exists(&mut context, &mut out, request)?,
            Truncate => self.write_truncate(&mut context, &mut out, request)?,
            ExecuteQuery | ExecuteNonQuery => {
                return Err(anyhow!("{} carries its own command text", request.kind));
            }
        }
        Ok(out)
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: &str,
        replace: &str,
    ) {
        out.push_str(&value.replace(search, replace));
    }

    /// Quote identifiers doubling the closing quote when it appears inside.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        let setting = context.setting;
        let (open, close) = (setting.opening_quote(), setting.closing_quote());
        out.push_str(open);
        let doubled = close.repeat(2);
        self.write_escaped(context, out, value, close, &doubled);
        out.push_str(close);
    }

    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Table hints, written right after the table reference.
    fn write_hints(&self, _context: &mut Context, out: &mut String, hints: Option<&str>) -> Result<()> {
        if let Some(hints) = hints.filter(|v| !v.trim().is_empty()) {
            out.push(' ');
            out.push_str(hints.trim());
        }
        Ok(())
    }

    fn write_parameter(&self, context: &mut Context, out: &mut String, name: &str) {
        context.parameter_index(name);
        out.push_str(context.setting.parameter_prefix());
        out.push_str(name);
    }

    /// Selected columns, `*` when none is listed.
    fn write_fields(&self, context: &mut Context, out: &mut String, fields: &[Field]) {
        if fields.is_empty() {
            out.push('*');
            return;
        }
        separated_by(
            out,
            fields,
            |out, v| self.write_identifier_quoted(context, out, v.name()),
            ", ",
        );
    }

    fn write_operation(&self, _context: &mut Context, out: &mut String, operation: Operation) {
        out.push_str(match operation {
            Operation::Equal => " = ",
            Operation::NotEqual => " <> ",
            Operation::LessThan => " < ",
            Operation::LessThanOrEqual => " <= ",
            Operation::GreaterThan => " > ",
            Operation::GreaterThanOrEqual => " >= ",
            Operation::Like => " LIKE ",
            Operation::NotLike => " NOT LIKE ",
            Operation::Between => " BETWEEN ",
            Operation::NotBetween => " NOT BETWEEN ",
            Operation::In => " IN ",
            Operation::NotIn => " NOT IN ",
            Operation::IsNull => " IS NULL",
            Operation::IsNotNull => " IS NOT NULL",
        });
    }

    fn write_query_field(&self, context: &mut Context, out: &mut String, value: &QueryField) {
        self.write_identifier_quoted(context, out, value.field.name());
        self.write_operation(context, out, value.operation);
        let names = value.parameter_names();
        match value.operation {
            Operation::IsNull | Operation::IsNotNull => {}
            Operation::Between | Operation::NotBetween => {
                separated_by(
                    out,
                    &names,
                    |out, v| self.write_parameter(context, out, v),
                    " AND ",
                );
            }
            Operation::In | Operation::NotIn => {
                out.push('(');
                separated_by(
                    out,
                    &names,
                    |out, v| self.write_parameter(context, out, v),
                    ", ",
                );
                out.push(')');
            }
            _ => {
                if let Some(name) = names.first() {
                    self.write_parameter(context, out, name);
                }
            }
        }
    }

    /// Nested groups are always parenthesized, a negated group is written `NOT (...)`.
    fn write_query_group(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &QueryGroup,
        nested: bool,
    ) {
        if value.is_not {
            out.push_str("NOT ");
        }
        let separator = match value.conjunction {
            Conjunction::And => " AND ",
            Conjunction::Or => " OR ",
        };
        possibly_parenthesized!(
            out,
            nested || value.is_not,
            separated_by(
                out,
                value.items.iter().filter(|v| match v {
                    QueryItem::Field(..) => true,
                    QueryItem::Group(group) => !group.is_empty(),
                }),
                |out, v| match v {
                    QueryItem::Field(field) => self.write_query_field(context, out, field),
                    QueryItem::Group(group) => self.write_query_group(context, out, group, true),
                },
                separator,
            )
        );
    }

    /// Nothing at all for an empty filter.
    fn write_where(&self, context: &mut Context, out: &mut String, filter: Option<&QueryGroup>) {
        let Some(filter) = filter.filter(|v| !v.is_empty()) else {
            return;
        };
        out.push_str("\nWHERE ");
        let fragment = match context.fragment {
            Fragment::UpdateSet => Fragment::UpdateWhere,
            Fragment::DeleteFrom => Fragment::DeleteWhere,
            _ => Fragment::SelectWhere,
        };
        self.write_query_group(&mut context.switch_fragment(fragment).current, out, filter, false);
    }

    /// `WHERE` matching the qualifier columns, `parameters` holds one name per qualifier.
    fn write_where_qualifiers(
        &self,
        context: &mut Context,
        out: &mut String,
        qualifiers: &[Field],
        parameters: &[String],
    ) {
        if qualifiers.is_empty() {
            return;
        }
        out.push_str("\nWHERE ");
        let mut context = context.switch_fragment(Fragment::UpdateWhere);
        separated_by(
            out,
            qualifiers.iter().zip(parameters),
            |out, (v, parameter)| {
                self.write_identifier_quoted(&mut context.current, out, v.name());
                out.push_str(" = ");
                self.write_parameter(&mut context.current, out, parameter);
            },
            " AND ",
        );
    }

    fn write_order_by(&self, context: &mut Context, out: &mut String, order_by: &[OrderField]) {
        if order_by.is_empty() {
            return;
        }
        out.push_str("\nORDER BY ");
        let mut context = context.switch_fragment(Fragment::SelectOrderBy);
        separated_by(
            out,
            order_by,
            |out, v| {
                self.write_identifier_quoted(&mut context.current, out, v.field.name());
                out.push_str(match v.order {
                    Order::Ascending => " ASC",
                    Order::Descending => " DESC",
                });
            },
            ", ",
        );
    }

    fn write_limit(&self, _context: &mut Context, out: &mut String, top: Option<u64>) {
        if let Some(top) = top {
            let _ = write!(out, "\nLIMIT {top}");
        }
    }

    /// Paging clause of a batch query, bound to `_limit` and `_offset`.
    fn write_paging(&self, context: &mut Context, out: &mut String) {
        let mut context = context.switch_fragment(Fragment::SelectLimit);
        out.push_str("\nLIMIT ");
        self.write_parameter(&mut context.current, out, "_limit");
        out.push_str(" OFFSET ");
        self.write_parameter(&mut context.current, out, "_offset");
    }

    /// Column whose value the statement returns after writing a row.
    fn write_returning(&self, context: &mut Context, out: &mut String, key: Option<&DbField>) {
        if let Some(key) = key {
            out.push_str("\nRETURNING ");
            self.write_identifier_quoted(
                &mut context.switch_fragment(Fragment::Returning).current,
                out,
                &key.name,
            );
        }
    }

    fn write_select_from(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("\nFROM ");
        let mut context = context.switch_fragment(Fragment::SelectFrom);
        self.write_table_ref(&mut context.current, out, request.table);
        self.write_hints(&mut context.current, out, request.hints)
    }

    fn write_query(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("SELECT ");
        let mut context = context.switch_fragment(Fragment::Select);
        self.write_fields(&mut context.current, out, request.fields);
        self.write_select_from(&mut context.current, out, request)?;
        self.write_where(&mut context.current, out, request.filter);
        self.write_order_by(&mut context.current, out, request.order_by);
        self.write_limit(&mut context.current, out, request.top);
        out.push(';');
        Ok(())
    }

    fn write_batch_query(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        if request.order_by.is_empty() {
            return Err(anyhow!(
                "A batch query on `{}` requires at least one ordering field",
                request.table
            ));
        }
        out.push_str("SELECT ");
        let mut context = context.switch_fragment(Fragment::Select);
        self.write_fields(&mut context.current, out, request.fields);
        self.write_select_from(&mut context.current, out, request)?;
        self.write_where(&mut context.current, out, request.filter);
        self.write_order_by(&mut context.current, out, request.order_by);
        self.write_paging(&mut context.current, out);
        out.push(';');
        Ok(())
    }

    /// Rows of a multi row `VALUES`, named by [`batch_parameters`].
    fn write_values(&self, context: &mut Context, out: &mut String, fields: &[Field], rows: usize) {
        out.push_str(" VALUES\n");
        let mut context = context.switch_fragment(Fragment::InsertIntoValues);
        let parameters = batch_parameters(&bound_parameters(fields, &[]), rows);
        separated_by(
            out,
            &parameters,
            |out, row| {
                out.push('(');
                separated_by(
                    out,
                    row,
                    |out, v| self.write_parameter(&mut context.current, out, v),
                    ", ",
                );
                out.push(')');
            },
            ",\n",
        );
    }

    fn write_insert_into(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        if request.fields.is_empty() {
            return Err(anyhow!("No field to insert into `{}`", request.table));
        }
        out.push_str("INSERT INTO ");
        let mut context = context.switch_fragment(Fragment::InsertInto);
        self.write_table_ref(&mut context.current, out, request.table);
        self.write_hints(&mut context.current, out, request.hints)?;
        out.push_str(" (");
        self.write_fields(&mut context.current, out, request.fields);
        out.push(')');
        self.write_values(&mut context.current, out, request.fields, request.batch_size);
        Ok(())
    }

    fn write_insert(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        self.write_insert_into(context, out, request)?;
        self.write_returning(context, out, request.identity);
        out.push(';');
        Ok(())
    }

    fn write_update_set(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
        parameters: &[String],
    ) -> Result<()> {
        if request.fields.is_empty() {
            return Err(anyhow!("No field to update in `{}`", request.table));
        }
        out.push_str("UPDATE ");
        self.write_table_ref(context, out, request.table);
        self.write_hints(context, out, request.hints)?;
        out.push_str("\nSET ");
        separated_by(
            out,
            request.fields.iter().zip(parameters),
            |out, (v, parameter)| {
                self.write_identifier_quoted(context, out, v.name());
                out.push_str(" = ");
                self.write_parameter(context, out, parameter);
            },
            ", ",
        );
        Ok(())
    }

    /// Matches the rows through the qualifiers when present, through the filter otherwise.
    fn write_update(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::UpdateSet);
        let parameters = batch_parameters(&bound_parameters(request.fields, request.qualifiers), 1);
        let (set, qualifiers) = parameters[0].split_at(request.fields.len());
        self.write_update_set(&mut context.current, out, request, set)?;
        if request.qualifiers.is_empty() {
            self.write_where(&mut context.current, out, request.filter);
        } else {
            self.write_where_qualifiers(&mut context.current, out, request.qualifiers, qualifiers);
        }
        out.push(';');
        Ok(())
    }

    /// One `UPDATE` per row, each matched by the qualifiers.
    fn write_update_all(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        if request.qualifiers.is_empty() {
            return Err(anyhow!(
                "Updating several rows of `{}` requires qualifier fields",
                request.table
            ));
        }
        let mut context = context.switch_fragment(Fragment::UpdateSet);
        let parameters = batch_parameters(
            &bound_parameters(request.fields, request.qualifiers),
            request.batch_size,
        );
        for (row, parameters) in parameters.iter().enumerate() {
            if row > 0 {
                out.push('\n');
            }
            let (set, qualifiers) = parameters.split_at(request.fields.len());
            self.write_update_set(&mut context.current, out, request, set)?;
            self.write_where_qualifiers(&mut context.current, out, request.qualifiers, qualifiers);
            out.push(';');
        }
        Ok(())
    }

    /// Insert that updates the non qualifier columns when a row with the same qualifiers exists.
    fn write_merge(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        if request.qualifiers.is_empty() {
            return Err(anyhow!(
                "Merging into `{}` requires qualifier fields",
                request.table
            ));
        }
        self.write_insert_into(context, out, request)?;
        let mut context = context.switch_fragment(Fragment::InsertIntoOnConflict);
        out.push_str("\nON CONFLICT (");
        self.write_fields(&mut context.current, out, request.qualifiers);
        out.push(')');
        let updated = request
            .fields
            .iter()
            .filter(|v| !request.qualifiers.contains(v))
            .filter(|v| request.identity.is_none_or(|identity| !v.is(&identity.name)))
            .collect::<Vec<_>>();
        if updated.is_empty() {
            out.push_str(" DO NOTHING");
        } else {
            out.push_str(" DO UPDATE SET\n");
            separated_by(
                out,
                updated,
                |out, v| {
                    self.write_identifier_quoted(&mut context.current, out, v.name());
                    out.push_str(" = EXCLUDED.");
                    self.write_identifier_quoted(&mut context.current, out, v.name());
                },
                ",\n",
            );
        }
        self.write_returning(
            &mut context.current,
            out,
            request.identity.or(request.primary),
        );
        out.push(';');
        Ok(())
    }

    fn write_delete(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("DELETE FROM ");
        let mut context = context.switch_fragment(Fragment::DeleteFrom);
        self.write_table_ref(&mut context.current, out, request.table);
        self.write_hints(&mut context.current, out, request.hints)?;
        self.write_where(&mut context.current, out, request.filter);
        out.push(';');
        Ok(())
    }

    fn write_count(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("SELECT COUNT(*) AS ");
        let mut context = context.switch_fragment(Fragment::Select);
        self.write_identifier_quoted(&mut context.current, out, "CountValue");
        self.write_select_from(&mut context.current, out, request)?;
        self.write_where(&mut context.current, out, request.filter);
        out.push(';');
        Ok(())
    }

    fn write_aggregate(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        let Some((function, alias)) = request.kind.aggregate() else {
            return Err(anyhow!("{} is not an aggregate", request.kind));
        };
        let [field] = request.fields else {
            return Err(anyhow!(
                "{} on `{}` requires exactly one field, found {}",
                request.kind,
                request.table,
                request.fields.len()
            ));
        };
        let _ = write!(out, "SELECT {function}(");
        let mut context = context.switch_fragment(Fragment::Select);
        self.write_identifier_quoted(&mut context.current, out, field.name());
        out.push_str(") AS ");
        self.write_identifier_quoted(&mut context.current, out, alias);
        self.write_select_from(&mut context.current, out, request)?;
        self.write_where(&mut context.current, out, request.filter);
        out.push(';');
        Ok(())
    }

    fn write_exists(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("SELECT 1 AS ");
        let mut context = context.switch_fragment(Fragment::Select);
        self.write_identifier_quoted(&mut context.current, out, "ExistsValue");
        self.write_select_from(&mut context.current, out, request)?;
        self.write_where(&mut context.current, out, request.filter);
        self.write_limit(&mut context.current, out, Some(1));
        out.push(';');
        Ok(())
    }

    fn write_truncate(
        &self,
        context: &mut Context,
        out: &mut String,
        request: &CommandRequest,
    ) -> Result<()> {
        out.push_str("TRUNCATE TABLE ");
        self.write_table_ref(
            &mut context.switch_fragment(Fragment::Truncate).current,
            out,
            request.table,
        );
        out.push(';');
        Ok(())
    }
}

/// Base parameter names of the columns a writing command binds per row: the fields, then the qualifiers prefixed
/// by `_`.
pub fn bound_parameters(fields: &[Field], qualifiers: &[Field]) -> Vec<String> {
    fields
        .iter()
        .map(|v| sanitize_parameter(v.name()))
        .chain(qualifiers.iter().map(|v| format!("_{}", sanitize_parameter(v.name()))))
        .collect()
}

/// Fallback builder writing ANSI SQL with named placeholders.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericStatementBuilder;

impl GenericStatementBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl StatementBuilder for GenericStatementBuilder {
    fn as_dyn(&self) -> &dyn StatementBuilder {
        self
    }
}
