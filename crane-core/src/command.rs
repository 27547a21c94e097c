use crate::{Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Named value bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Statement handed to a [`crate::Connection`].
///
/// Parameters are in the order their placeholders first appear in the text, positional dialects bind them by
/// index and named dialects by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub text: Arc<str>,
    pub parameters: Vec<Parameter>,
}

impl Command {
    pub fn new(text: impl Into<Arc<str>>, parameters: Vec<Parameter>) -> Self {
        Self {
            text: text.into(),
            parameters,
        }
    }
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.value)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.text))
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    /// Aligned by index with `labels`.
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Case insensitive lookup.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .map(|i| &self.values[i])
    }
}

/// Items emitted by `Connection::run`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
