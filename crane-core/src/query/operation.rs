use std::fmt::{self, Display};

/// Comparison carried by a [`crate::QueryField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    NotLike,
    Between,
    NotBetween,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Operation {
    /// The operation matching exactly the rows this one rejects.
    pub fn negate(self) -> Self {
        use Operation::*;
        match self {
            Equal => NotEqual,
            NotEqual => Equal,
            LessThan => GreaterThanOrEqual,
            LessThanOrEqual => GreaterThan,
            GreaterThan => LessThanOrEqual,
            GreaterThanOrEqual => LessThan,
            Like => NotLike,
            NotLike => Like,
            Between => NotBetween,
            NotBetween => Between,
            In => NotIn,
            NotIn => In,
            IsNull => IsNotNull,
            IsNotNull => IsNull,
        }
    }
    /// Same comparison with the operands swapped.
    pub fn flip(self) -> Self {
        use Operation::*;
        match self {
            LessThan => GreaterThan,
            LessThanOrEqual => GreaterThanOrEqual,
            GreaterThan => LessThan,
            GreaterThanOrEqual => LessThanOrEqual,
            v => v,
        }
    }
    pub fn is_between(self) -> bool {
        matches!(self, Operation::Between | Operation::NotBetween)
    }
    pub fn is_in(self) -> bool {
        matches!(self, Operation::In | Operation::NotIn)
    }
    pub fn is_null_check(self) -> bool {
        matches!(self, Operation::IsNull | Operation::IsNotNull)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
