use crate::{ColumnRef, Entity, Value};
use std::{
    borrow::Cow,
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

/// One mapped column.
///
/// Equality and hashing ignore ASCII case, two fields naming the same column compare equal regardless of how the
/// caller spelled it.
#[derive(Debug, Clone)]
pub struct Field {
    name: Cow<'static, str>,
    value: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
    /// Field carrying a type prototype.
    pub fn typed(name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
    /// Fields of `E` in declaration order, with the attribute column names.
    pub fn parse<E: Entity>() -> Vec<Field> {
        E::columns()
            .iter()
            .map(|c| Field::typed(c.column_ref.name, c.value.clone()))
            .collect()
    }
    pub fn from_names<S: Into<Cow<'static, str>>>(names: impl IntoIterator<Item = S>) -> Vec<Field> {
        names.into_iter().map(Field::new).collect()
    }
    /// Canonical signature of an ordered field list, used in cache keys. Names keep their spelling, it is the one
    /// the statement text quotes.
    pub fn signature<'a>(fields: impl IntoIterator<Item = &'a Field>) -> String {
        let mut out = String::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.name);
        }
        out
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&'static str> for Field {
    fn from(value: &'static str) -> Self {
        Field::new(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::new(value)
    }
}

impl From<ColumnRef> for Field {
    fn from(value: ColumnRef) -> Self {
        Field::new(value.property)
    }
}
