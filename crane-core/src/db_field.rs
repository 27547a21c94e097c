use crate::{Field, Value};

/// Column metadata as reported by the database or derived from the mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbField {
    pub name: String,
    pub is_primary: bool,
    pub is_identity: bool,
    pub is_nullable: bool,
    /// Type prototype.
    pub value: Value,
    pub size: Option<u32>,
    pub database_type: Option<String>,
}

impl DbField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn primary(mut self, is_primary: bool) -> Self {
        self.is_primary = is_primary;
        self
    }
    pub fn identity(mut self, is_identity: bool) -> Self {
        self.is_identity = is_identity;
        self
    }
    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }
    pub fn with_type(mut self, value: Value, database_type: Option<String>) -> Self {
        self.value = value;
        self.database_type = database_type;
        self
    }
    pub fn as_field(&self) -> Field {
        Field::typed(self.name.clone(), self.value.clone())
    }
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
