use crate::{Error, Field, Operation, Parameter, Result, Value, sanitize_parameter};
use std::fmt::Write;

/// One atomic predicate: `field operation value`.
///
/// The constructors enforce the arity of every operation: `Between` takes exactly two values, `In` a non empty
/// list and the null checks none.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryField {
    pub field: Field,
    pub operation: Operation,
    values: Vec<Value>,
    parameter: String,
}

impl QueryField {
    /// Lists (`Value::List`) carry the operands of `Between` and `In`. Comparing with `NULL` through `Equal` or
    /// `NotEqual` becomes a null check.
    pub fn new(field: impl Into<Field>, operation: Operation, value: impl Into<Value>) -> Result<Self> {
        let field = field.into();
        let value = value.into();
        let (operation, values) = match operation {
            Operation::IsNull | Operation::IsNotNull => {
                if !matches!(value, Value::Null) {
                    return Err(Error::unsupported(format!(
                        "{operation} on `{field}` does not take a value (got {value})"
                    )));
                }
                (operation, Vec::new())
            }
            Operation::Between | Operation::NotBetween => match value {
                Value::List(Some(v), ..) if v.len() == 2 => (operation, v),
                _ => {
                    return Err(Error::unsupported(format!(
                        "{operation} on `{field}` requires exactly two values (got {value})"
                    )));
                }
            },
            Operation::In | Operation::NotIn => match value {
                Value::List(Some(v), ..) if !v.is_empty() => (operation, v),
                _ => {
                    return Err(Error::unsupported(format!(
                        "{operation} on `{field}` requires a non empty list (got {value})"
                    )));
                }
            },
            Operation::Equal | Operation::NotEqual if value.is_null() => {
                let operation = if operation == Operation::Equal {
                    Operation::IsNull
                } else {
                    Operation::IsNotNull
                };
                (operation, Vec::new())
            }
            _ => {
                if value.is_null() || matches!(value, Value::List(..)) {
                    return Err(Error::unsupported(format!(
                        "{operation} on `{field}` requires a single non null value (got {value})"
                    )));
                }
                (operation, vec![value])
            }
        };
        let parameter = sanitize_parameter(field.name());
        Ok(Self {
            field,
            operation,
            values,
            parameter,
        })
    }
    pub fn equal(field: impl Into<Field>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        let parameter = sanitize_parameter(field.name());
        if value.is_null() {
            return Self::is_null(field);
        }
        Self {
            field,
            operation: Operation::Equal,
            values: vec![value],
            parameter,
        }
    }
    pub fn is_null(field: impl Into<Field>) -> Self {
        let field = field.into();
        let parameter = sanitize_parameter(field.name());
        Self {
            field,
            operation: Operation::IsNull,
            values: Vec::new(),
            parameter,
        }
    }
    pub fn is_not_null(field: impl Into<Field>) -> Self {
        Self {
            operation: Operation::IsNotNull,
            ..Self::is_null(field)
        }
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Base parameter name, assigned by [`crate::QueryGroup::assign_parameters`].
    pub fn parameter(&self) -> &str {
        &self.parameter
    }
    pub fn set_parameter(&mut self, name: impl Into<String>) {
        self.parameter = name.into();
    }
    /// Names of the placeholders this predicate binds, in writing order.
    pub fn parameter_names(&self) -> Vec<String> {
        match self.operation {
            Operation::IsNull | Operation::IsNotNull => Vec::new(),
            Operation::Between | Operation::NotBetween => vec![
                format!("{}_Left", self.parameter),
                format!("{}_Right", self.parameter),
            ],
            Operation::In | Operation::NotIn => (0..self.values.len())
                .map(|i| format!("{}_In_{i}", self.parameter))
                .collect(),
            _ => vec![self.parameter.clone()],
        }
    }
    pub fn parameters(&self) -> Vec<Parameter> {
        self.parameter_names()
            .into_iter()
            .zip(self.values.iter().cloned())
            .map(|(name, value)| Parameter { name, value })
            .collect()
    }
    pub(crate) fn write_shape(&self, out: &mut String) {
        out.push_str(self.field.name());
        let _ = write!(out, ":{}", self.operation);
        if self.operation.is_in() {
            let _ = write!(out, "[{}]", self.values.len());
        }
    }
}
