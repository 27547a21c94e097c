use crate::{Bindable, Getter, RowLabeled, Setter, Value};
use std::sync::Arc;

/// Dynamic entity: ordered `(name, value)` pairs with case insensitive lookup.
///
/// Used by the table name based operations and as the "plain object" filter, where every pair becomes an
/// equality predicate.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
    /// Replaces the value of an existing name (keeping its position) or appends a new pair.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn into_inner(self) -> Vec<(String, Value)> {
        self.fields
    }
}

impl Bindable for Record {
    fn getter(property: &str) -> Option<Getter<Self>> {
        let name = property.to_string();
        Some(Arc::new(move |record: &Record| {
            record.get(&name).cloned().unwrap_or_default()
        }))
    }
    fn setter(property: &str) -> Option<Setter<Self>> {
        let name = property.to_string();
        Some(Arc::new(move |record: &mut Record, value: Value| {
            record.set(name.clone(), value);
            Ok(())
        }))
    }
}

impl From<RowLabeled> for Record {
    fn from(value: RowLabeled) -> Self {
        Self {
            fields: value
                .labels
                .iter()
                .cloned()
                .zip(value.values.into_vec())
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut result = Record::new();
        for (k, v) in iter {
            result.set(k, v);
        }
        result
    }
}
