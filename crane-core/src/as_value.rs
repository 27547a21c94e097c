use crate::{Result, Value, truncate_long};
use anyhow::anyhow;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{any, borrow::Cow};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Every mapped entity property implements it: the derived getters call `as_value` to bind parameters and the
/// row readers call `try_from_value` to materialize results and to write generated keys back.
///
/// # Error semantics
/// - Numeric conversions accept any integer width (and integral decimals) and check the range before returning.
/// - Mismatched variants fail with a message naming the value and the target type.
///
/// # Examples
/// ```rust
/// use crane_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The `None` variant used as the type prototype of a column.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Varchar(Some(value.clone()))
    }
}

fn mismatch<T>(value: &Value) -> anyhow::Error {
    anyhow!(
        "Cannot convert {} to {}",
        truncate_long!(format!("{value:?}")),
        any::type_name::<T>()
    )
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let $destination(Some(v)) = value {
                    return Ok(v);
                }
                let Some(wide) = value.as_i128() else {
                    return Err(mismatch::<Self>(&value));
                };
                <$source>::try_from(wide).map_err(|_| {
                    anyhow!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>()
                    )
                })
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path, $from_decimal:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    #[allow(unreachable_patterns)]
                    Value::Float32(Some(v)) => Ok(v as _),
                    #[allow(unreachable_patterns)]
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v
                        .$from_decimal()
                        .ok_or_else(|| mismatch::<Self>(&Value::Decimal(Some(v)))),
                    Value::Varchar(Some(ref v)) => v
                        .trim()
                        .parse()
                        .map_err(|_| mismatch::<Self>(&value)),
                    ref other => other
                        .as_i128()
                        .map(|v| v as _)
                        .ok_or_else(|| mismatch::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32, to_f32);
impl_as_value_float!(f64, Value::Float64, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            ref other => match other.as_i128() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(mismatch::<Self>(&value)),
            },
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => {
                v.trim().parse().map_err(|_| mismatch::<Self>(&value))
            }
            ref other => other
                .as_i128()
                .and_then(Decimal::from_i128)
                .ok_or_else(|| mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Uuid(Some(v)) => Ok(v.to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Cow::Owned)
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => {
                Uuid::parse_str(v.trim()).map_err(|_| mismatch::<Self>(&value))
            }
            Value::Blob(Some(ref v)) => {
                Uuid::from_slice(v).map_err(|_| mismatch::<Self>(&value))
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value_temporal {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_temporal!(Date, Value::Date);
impl_as_value_temporal!(Time, Value::Time);
impl_as_value_temporal!(PrimitiveDateTime, Value::Timestamp);
impl_as_value_temporal!(OffsetDateTime, Value::TimestampWithTimezone);

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v), ..) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}
