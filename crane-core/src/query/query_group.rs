use crate::{Field, Parameter, QueryField, sanitize_parameter};
use std::collections::HashSet;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryItem {
    Field(QueryField),
    Group(QueryGroup),
}

/// Tree of predicates combined by one conjunction, optionally negated.
///
/// Children keep their source order, the same filter always yields the same shape, parameters and text. A group
/// without fields is no filter at all.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct QueryGroup {
    pub conjunction: Conjunction,
    pub is_not: bool,
    pub items: Vec<QueryItem>,
}

impl QueryGroup {
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            is_not: false,
            items: Vec::new(),
        }
    }
    pub fn and(fields: impl IntoIterator<Item = QueryField>) -> Self {
        Self {
            items: fields.into_iter().map(QueryItem::Field).collect(),
            ..Self::new(Conjunction::And)
        }
    }
    pub fn or(fields: impl IntoIterator<Item = QueryField>) -> Self {
        Self {
            items: fields.into_iter().map(QueryItem::Field).collect(),
            ..Self::new(Conjunction::Or)
        }
    }
    pub fn with_field(mut self, field: QueryField) -> Self {
        self.items.push(QueryItem::Field(field));
        self
    }
    pub fn with_group(mut self, group: QueryGroup) -> Self {
        self.items.push(QueryItem::Group(group));
        self
    }
    pub fn negated(mut self) -> Self {
        self.is_not = !self.is_not;
        self
    }
    /// True when no predicate is reachable, empty subgroups included.
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|v| match v {
            QueryItem::Field(..) => false,
            QueryItem::Group(group) => group.is_empty(),
        })
    }
    /// Every predicate in traversal order.
    pub fn fields(&self) -> Vec<&QueryField> {
        let mut result = Vec::new();
        self.visit(&mut |v| result.push(v));
        result
    }
    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a QueryField)) {
        for item in &self.items {
            match item {
                QueryItem::Field(v) => f(v),
                QueryItem::Group(v) => v.visit(f),
            }
        }
    }
    fn visit_mut(&mut self, f: &mut impl FnMut(&mut QueryField)) {
        for item in &mut self.items {
            match item {
                QueryItem::Field(v) => f(v),
                QueryItem::Group(v) => v.visit_mut(f),
            }
        }
    }
    /// Renames the fields, used to turn property names into column names.
    pub fn map_fields(&mut self, mut f: impl FnMut(&Field) -> Option<Field>) {
        self.visit_mut(&mut |v| {
            if let Some(field) = f(&v.field) {
                v.field = field;
            }
        });
    }
    /// Assigns the parameter names in traversal order: `{prefix}{field}` for the first occurrence of a field and
    /// `{prefix}{field}_{n}` for the following ones. A name another predicate already binds, whatever its field,
    /// is skipped.
    pub fn assign_parameters(&mut self, prefix: &str) {
        let mut issued = HashSet::<String>::new();
        self.visit_mut(&mut |v| {
            let base = format!("{prefix}{}", sanitize_parameter(v.field.name()));
            let mut n = 0;
            loop {
                v.set_parameter(if n == 0 {
                    base.clone()
                } else {
                    format!("{base}_{n}")
                });
                let names = v
                    .parameter_names()
                    .into_iter()
                    .map(|name| name.to_ascii_lowercase())
                    .collect::<Vec<_>>();
                if names.iter().all(|name| !issued.contains(name)) {
                    issued.extend(names);
                    break;
                }
                n += 1;
            }
        });
    }
    /// Bound values in traversal order.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut result = Vec::new();
        self.visit(&mut |v| result.extend(v.parameters()));
        result
    }
    /// Structural signature: field names, operations, conjunctions, negations, nesting and list arity. Values
    /// never take part in it.
    pub fn shape(&self) -> String {
        let mut out = String::new();
        self.write_shape(&mut out);
        out
    }
    fn write_shape(&self, out: &mut String) {
        if self.is_empty() {
            return;
        }
        if self.is_not {
            out.push('!');
        }
        out.push_str(match self.conjunction {
            Conjunction::And => "AND(",
            Conjunction::Or => "OR(",
        });
        let mut first = true;
        for item in &self.items {
            match item {
                QueryItem::Group(group) if group.is_empty() => continue,
                _ => {}
            }
            if !first {
                out.push(',');
            }
            first = false;
            match item {
                QueryItem::Field(v) => v.write_shape(out),
                QueryItem::Group(v) => v.write_shape(out),
            }
        }
        out.push(')');
    }
}

impl From<QueryField> for QueryGroup {
    fn from(value: QueryField) -> Self {
        QueryGroup::and([value])
    }
}

impl From<Vec<QueryField>> for QueryGroup {
    fn from(value: Vec<QueryField>) -> Self {
        QueryGroup::and(value)
    }
}
