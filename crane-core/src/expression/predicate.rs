use crate::{BinaryOpType, Field, UnaryOpType, Value};
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

/// Typed filter expression.
///
/// Built by the `filter!` macro from Rust syntax or by the methods below, then turned into a
/// [`crate::QueryGroup`] by [`crate::translate`]. The tree can express more than SQL filters support, the
/// translation rejects what it cannot map.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Column(Field),
    Value(Value),
    List(Vec<Predicate>),
    Range {
        start: Option<Box<Predicate>>,
        end: Option<Box<Predicate>>,
        inclusive: bool,
    },
    Unary {
        op: UnaryOpType,
        arg: Box<Predicate>,
    },
    Binary {
        op: BinaryOpType,
        lhs: Box<Predicate>,
        rhs: Box<Predicate>,
    },
    Call {
        method: Cow<'static, str>,
        receiver: Box<Predicate>,
        args: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn column(field: impl Into<Field>) -> Self {
        Predicate::Column(field.into())
    }
    pub fn value(value: impl Into<Value>) -> Self {
        Predicate::Value(value.into())
    }
    pub fn binary(self, op: BinaryOpType, rhs: Predicate) -> Self {
        Predicate::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
    pub fn call(self, method: &'static str, args: Vec<Predicate>) -> Self {
        Predicate::Call {
            method: Cow::Borrowed(method),
            receiver: Box::new(self),
            args,
        }
    }
    pub fn equal(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::Equal, Predicate::value(value))
    }
    pub fn not_equal(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::NotEqual, Predicate::value(value))
    }
    pub fn less(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::Less, Predicate::value(value))
    }
    pub fn less_equal(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::LessEqual, Predicate::value(value))
    }
    pub fn greater(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::Greater, Predicate::value(value))
    }
    pub fn greater_equal(self, value: impl Into<Value>) -> Self {
        self.binary(BinaryOpType::GreaterEqual, Predicate::value(value))
    }
    pub fn and(self, rhs: Predicate) -> Self {
        self.binary(BinaryOpType::And, rhs)
    }
    pub fn or(self, rhs: Predicate) -> Self {
        self.binary(BinaryOpType::Or, rhs)
    }
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Unary {
            op: UnaryOpType::Not,
            arg: Box::new(self),
        }
    }
    pub fn is_null(self) -> Self {
        self.call("is_none", Vec::new())
    }
    pub fn is_not_null(self) -> Self {
        self.call("is_some", Vec::new())
    }
    pub fn contains(self, value: impl Into<Value>) -> Self {
        self.call("contains", vec![Predicate::value(value)])
    }
    pub fn starts_with(self, value: impl Into<Value>) -> Self {
        self.call("starts_with", vec![Predicate::value(value)])
    }
    pub fn ends_with(self, value: impl Into<Value>) -> Self {
        self.call("ends_with", vec![Predicate::value(value)])
    }
    /// Raw SQL `LIKE` pattern.
    pub fn like(self, pattern: impl Into<Value>) -> Self {
        self.call("like", vec![Predicate::value(pattern)])
    }
    /// Membership of this column in `values`.
    pub fn is_in<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::List(values.into_iter().map(Predicate::value).collect())
            .call("contains", vec![self])
    }
    /// Inclusive range check.
    pub fn between(self, start: impl Into<Value>, end: impl Into<Value>) -> Self {
        Predicate::Range {
            start: Some(Box::new(Predicate::value(start))),
            end: Some(Box::new(Predicate::value(end))),
            inclusive: true,
        }
        .call("contains", vec![self])
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Column(v) => write!(f, "{v}"),
            Predicate::Value(v) => write!(f, "{v}"),
            Predicate::List(v) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Predicate::Range {
                start,
                end,
                inclusive,
            } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_str(if *inclusive { "..=" } else { ".." })?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                Ok(())
            }
            Predicate::Unary { op, arg } => write!(f, "{op}{arg}"),
            Predicate::Binary { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Predicate::Call {
                method,
                receiver,
                args,
            } => {
                write!(f, "{receiver}.{method}(")?;
                for (i, item) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
