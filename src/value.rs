//! Driver-acceptable scalars and the conversion capability used while binding.

use std::error::Error as StdError;

/// Boxed error returned by [`ToValue`] implementations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A scalar every SQLx `Any` backend knows how to encode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from!(Bool: bool);
value_from!(Int: i8, i16, i32, i64, u8, u16, u32);
value_from!(Float: f32, f64);
value_from!(Text: String, &str);
value_from!(Bytes: Vec<u8>, &[u8]);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Converts a bound field into a [`Value`].
///
/// Plain scalars convert infallibly. Implement it for domain types that need validation or a
/// different wire representation; an `Err` surfaces as
/// [`Error::ValueConversion`](crate::Error::ValueConversion) with the placeholder name attached.
///
/// ```
/// use sqlx_named::{BoxError, ToValue, Value};
///
/// struct Email(String);
///
/// impl ToValue for Email {
///     fn to_value(&self) -> Result<Value, BoxError> {
///         if !self.0.contains('@') {
///             return Err(format!("not an email address: {}", self.0).into());
///         }
///         Ok(Value::Text(self.0.clone()))
///     }
/// }
///
/// assert!(Email("nobody".into()).to_value().is_err());
/// ```
pub trait ToValue {
    fn to_value(&self) -> Result<Value, BoxError>;
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(self.clone())
    }
}

macro_rules! to_value_copy {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, BoxError> {
                    Ok(Value::from(*self))
                }
            }
        )+
    };
}

to_value_copy!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64);

impl ToValue for str {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(Value::Text(self.to_owned()))
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(Value::Text(self.clone()))
    }
}

impl ToValue for [u8] {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Result<Value, BoxError> {
        Ok(Value::Int(i64::try_from(*self)?))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, BoxError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Result<Value, BoxError> {
        (**self).to_value()
    }
}
