use std::fmt;

use bytes::BytesMut;
use kwire_schema::ScalarKind;

use crate::element::Element;

/// A dynamically typed argument or decoded response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Str(String),
    /// Homogeneous numeric buffer, used for fixed arrays and vectors alike.
    Buffer(Elements),
    Tuple(Vec<Value>),
}

impl Value {
    /// Short description used in type-mismatch errors.
    pub fn type_name(&self) -> String {
        match self {
            Value::Buffer(elements) => format!("buffer of {}", elements.kind()),
            Value::Tuple(items) => format!("tuple of {} values", items.len()),
            other => match other.scalar_kind() {
                Some(kind) => kind.name().to_string(),
                None => "value".to_string(),
            },
        }
    }

    /// Kind of a scalar value, `None` for buffers and tuples.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        let kind = match self {
            Value::U8(_) => ScalarKind::U8,
            Value::I8(_) => ScalarKind::I8,
            Value::U16(_) => ScalarKind::U16,
            Value::I16(_) => ScalarKind::I16,
            Value::U32(_) => ScalarKind::U32,
            Value::I32(_) => ScalarKind::I32,
            Value::U64(_) => ScalarKind::U64,
            Value::I64(_) => ScalarKind::I64,
            Value::F32(_) => ScalarKind::F32,
            Value::F64(_) => ScalarKind::F64,
            Value::Bool(_) => ScalarKind::Bool,
            Value::Str(_) => ScalarKind::String,
            Value::Buffer(_) | Value::Tuple(_) => return None,
        };
        Some(kind)
    }

    /// Integer payload widened losslessly, for two's-complement truncation.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            _ => None,
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Buffer(elements) => write!(f, "<{} x {}>", elements.len(), elements.kind()),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
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

/// A homogeneous numeric buffer tagged with its element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Elements {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! for_each_elements {
    ($elements:expr, $values:ident => $body:expr) => {
        match $elements {
            Elements::U8($values) => $body,
            Elements::I8($values) => $body,
            Elements::U16($values) => $body,
            Elements::I16($values) => $body,
            Elements::U32($values) => $body,
            Elements::I32($values) => $body,
            Elements::U64($values) => $body,
            Elements::I64($values) => $body,
            Elements::F32($values) => $body,
            Elements::F64($values) => $body,
        }
    };
}

impl Elements {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Elements::U8(_) => ScalarKind::U8,
            Elements::I8(_) => ScalarKind::I8,
            Elements::U16(_) => ScalarKind::U16,
            Elements::I16(_) => ScalarKind::I16,
            Elements::U32(_) => ScalarKind::U32,
            Elements::I32(_) => ScalarKind::I32,
            Elements::U64(_) => ScalarKind::U64,
            Elements::I64(_) => ScalarKind::I64,
            Elements::F32(_) => ScalarKind::F32,
            Elements::F64(_) => ScalarKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        for_each_elements!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the raw body in bytes.
    pub fn byte_len(&self) -> usize {
        for_each_elements!(self, values => std::mem::size_of_val(values.as_slice()))
    }

    /// Append the elements as a packed little-endian buffer.
    pub fn put_le(&self, dst: &mut BytesMut) {
        dst.reserve(self.byte_len());
        for_each_elements!(self, values => values.iter().for_each(|v| v.put_le(dst)))
    }

    /// Borrow the elements as `T`, if that is their kind.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::from_elements(self)
    }
}

macro_rules! impl_from_element {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Element::into_value(v)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(v: Vec<$ty>) -> Self {
                    Value::Buffer(Element::into_elements(v))
                }
            }

            impl From<&[$ty]> for Value {
                fn from(v: &[$ty]) -> Self {
                    Value::Buffer(Element::into_elements(v.to_vec()))
                }
            }

            impl<const N: usize> From<[$ty; N]> for Value {
                fn from(v: [$ty; N]) -> Self {
                    Value::Buffer(Element::into_elements(v.to_vec()))
                }
            }

            impl From<Vec<$ty>> for Elements {
                fn from(v: Vec<$ty>) -> Self {
                    Element::into_elements(v)
                }
            }
        )*
    };
}

impl_from_element!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Elements> for Value {
    fn from(v: Elements) -> Self {
        Value::Buffer(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Tuple(v)
    }
}
