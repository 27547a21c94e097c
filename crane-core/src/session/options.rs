use crate::{Field, OrderField};

/// Shape of a read.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Selected properties (or columns), all the mapped ones when empty.
    pub fields: Vec<Field>,
    pub order_by: Vec<OrderField>,
    pub top: Option<u64>,
    pub hints: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn fields<F: Into<Field>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
    pub fn order_by(mut self, order_by: impl IntoIterator<Item = OrderField>) -> Self {
        self.order_by = order_by.into_iter().collect();
        self
    }
    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }
    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }
}

/// Shape of a write.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Written properties (or columns). Defaults to every mapped one but the identity, and for updates but the
    /// qualifiers.
    pub fields: Vec<Field>,
    /// Properties matching the existing row in updates and merges, the primary key when empty.
    pub qualifiers: Vec<Field>,
    pub hints: Option<String>,
    /// Rows per statement of the `*_all` operations, the engine default when `None`.
    pub batch_size: Option<usize>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn fields<F: Into<Field>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
    pub fn qualifiers<F: Into<Field>>(mut self, qualifiers: impl IntoIterator<Item = F>) -> Self {
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }
    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}
