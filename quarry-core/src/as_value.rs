use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// `as_empty_value` returns the typed NULL of the type, which doubles as its
/// SQL type prototype. `try_from_value` accepts the canonical variant and, for
/// numbers, any other numeric variant or a numeric string as long as the value
/// fits the target type.
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Typed NULL for this type. Must not allocate.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
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

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>(),
    ))
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
                let wide: i128 = match &value {
                    $destination(Some(v)) => return Ok(*v),
                    #[allow(unreachable_patterns)]
                    Value::Int16(Some(v)) => *v as i128,
                    #[allow(unreachable_patterns)]
                    Value::Int32(Some(v)) => *v as i128,
                    #[allow(unreachable_patterns)]
                    Value::Int64(Some(v)) => *v as i128,
                    Value::Decimal(Some(v)) if v.fract().is_zero() => v
                        .to_i128()
                        .ok_or_else(|| conversion_error::<Self>(&value))?,
                    Value::Varchar(Some(v)) => {
                        return v.trim().parse::<$source>().map_err(|e| {
                            Error::new(e).context(format!(
                                "Cannot parse `{}` as {}",
                                truncate_long!(v),
                                any::type_name::<Self>(),
                            ))
                        });
                    }
                    _ => return Err(conversion_error::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);

macro_rules! impl_as_value_float {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match &value {
                    $destination(Some(v)) => Ok(*v),
                    #[allow(unreachable_patterns)]
                    Value::Float32(Some(v)) => Ok(*v as _),
                    #[allow(unreachable_patterns)]
                    Value::Float64(Some(v)) => Ok(*v as _),
                    Value::Int16(Some(v)) => Ok(*v as _),
                    Value::Int32(Some(v)) => Ok(*v as _),
                    Value::Int64(Some(v)) => Ok(*v as _),
                    Value::Decimal(Some(v)) => v
                        .to_f64()
                        .map(|v| v as $source)
                        .ok_or_else(|| conversion_error::<Self>(&value)),
                    Value::Varchar(Some(v)) => v.trim().parse::<$source>().map_err(|e| {
                        Error::new(e).context(format!(
                            "Cannot parse `{}` as {}",
                            truncate_long!(v),
                            any::type_name::<Self>(),
                        ))
                    }),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value_float!(f32, Value::Float32);
impl_as_value_float!(f64, Value::Float64);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Decimal(Some(v)) => Ok(*v),
            Value::Int16(Some(v)) => Ok(Decimal::from(*v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(*v)),
            Value::Int64(Some(v)) => Ok(Decimal::from(*v)),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(*v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(*v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(v)) => Decimal::from_str(v.trim()).map_err(|e| {
                Error::new(e).context(format!("Cannot parse `{}` as Decimal", truncate_long!(v)))
            }),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Boolean(Some(v)) => Ok(*v),
            Value::Int16(Some(v)) => Ok(*v != 0),
            Value::Int32(Some(v)) => Ok(*v != 0),
            Value::Int64(Some(v)) => Ok(*v != 0),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(String, Value::Varchar);
impl_as_value!(Box<[u8]>, Value::Blob);
impl_as_value!(Vec<u8>, Value::Blob);
impl_as_value!(Date, Value::Date,
    Value::Timestamp(Some(v)) => Ok(v.date()),
    Value::TimestampWithTimezone(Some(v)) => Ok(v.date()),
);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp,
    Value::TimestampWithTimezone(Some(v)) => Ok(PrimitiveDateTime::new(v.date(), v.time())),
);
impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone,
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);
impl_as_value!(Uuid, Value::Uuid,
    Value::Varchar(Some(ref v)) => Uuid::parse_str(v.trim()).map_err(|e| {
        Error::new(e).context(format!("Cannot parse `{}` as Uuid", truncate_long!(v)))
    }),
);

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
