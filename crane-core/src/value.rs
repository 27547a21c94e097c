use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed database value.
///
/// Every variant carries an `Option`: `None` makes the value a type prototype, `Some` a concrete value.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }

    /// True for `Null` and for every prototype (variant holding `None`).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    /// The same variant with the payload removed.
    pub fn as_prototype(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int8(..) => Value::Int8(None),
            Value::Int16(..) => Value::Int16(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::UInt8(..) => Value::UInt8(None),
            Value::UInt16(..) => Value::UInt16(None),
            Value::UInt32(..) => Value::UInt32(None),
            Value::UInt64(..) => Value::UInt64(None),
            Value::Float32(..) => Value::Float32(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::List(_, ty) => Value::List(None, ty.clone()),
        }
    }

    /// Integer view of the value, used when reading counters and generated keys.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Boolean(Some(v)) => Some(*v as i128),
            Value::Int8(Some(v)) => Some(*v as i128),
            Value::Int16(Some(v)) => Some(*v as i128),
            Value::Int32(Some(v)) => Some(*v as i128),
            Value::Int64(Some(v)) => Some(*v as i128),
            Value::UInt8(Some(v)) => Some(*v as i128),
            Value::UInt16(Some(v)) => Some(*v as i128),
            Value::UInt32(Some(v)) => Some(*v as i128),
            Value::UInt64(Some(v)) => Some(*v as i128),
            Value::Decimal(Some(v)) if v.fract().is_zero() => v.to_i128(),
            Value::Varchar(Some(v)) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// List payload, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(Some(v), ..) => Some(v),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write<T: Display>(f: &mut fmt::Formatter<'_>, v: &Option<T>) -> fmt::Result {
            match v {
                Some(v) => v.fmt(f),
                None => f.write_str("NULL"),
            }
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write(f, v),
            Value::Int8(v) => write(f, v),
            Value::Int16(v) => write(f, v),
            Value::Int32(v) => write(f, v),
            Value::Int64(v) => write(f, v),
            Value::UInt8(v) => write(f, v),
            Value::UInt16(v) => write(f, v),
            Value::UInt32(v) => write(f, v),
            Value::UInt64(v) => write(f, v),
            Value::Float32(v) => write(f, v),
            Value::Float64(v) => write(f, v),
            Value::Decimal(v) => write(f, v),
            Value::Varchar(Some(v)) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Varchar(None) => f.write_str("NULL"),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Blob(None) => f.write_str("NULL"),
            Value::Date(v) => write(f, v),
            Value::Time(v) => write(f, v),
            Value::Timestamp(v) => write(f, v),
            Value::TimestampWithTimezone(v) => write(f, v),
            Value::Uuid(v) => write(f, v),
            Value::List(Some(v), ..) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Value::List(None, ..) => f.write_str("NULL"),
        }
    }
}
