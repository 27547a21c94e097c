use crate::Field;
use std::fmt::{self, Display};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderField {
    pub field: Field,
    pub order: Order,
}

impl OrderField {
    pub fn ascending(field: impl Into<Field>) -> Self {
        Self {
            field: field.into(),
            order: Order::Ascending,
        }
    }
    pub fn descending(field: impl Into<Field>) -> Self {
        Self {
            field: field.into(),
            order: Order::Descending,
        }
    }
    pub fn signature(fields: &[OrderField]) -> String {
        fields
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.field,
            match self.order {
                Order::Ascending => "ASC",
                Order::Descending => "DESC",
            }
        )
    }
}
