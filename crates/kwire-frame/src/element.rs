//! Primitive element types shared by scalar and bulk payloads.
//!
//! Scalars travel big-endian; array, vector and string bodies are raw
//! little-endian memory dumps. Both directions go through [`Element`].

use bytes::{Buf, BufMut, BytesMut};
use kwire_schema::ScalarKind;

use crate::value::{Elements, Value};

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width numeric type with a wire representation.
pub trait Element: sealed::Sealed + Copy + Sized + 'static {
    /// The scalar kind this type maps to in the catalog.
    const KIND: ScalarKind;
    /// Encoded width in bytes.
    const SIZE: usize;

    fn put_be(self, dst: &mut BytesMut);
    fn put_le(self, dst: &mut BytesMut);
    fn get_be(src: &mut &[u8]) -> Self;
    fn get_le(src: &mut &[u8]) -> Self;

    fn into_value(self) -> Value;
    fn into_elements(values: Vec<Self>) -> Elements;
    /// Borrow the elements if they hold this type.
    fn from_elements(elements: &Elements) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $kind:ident, $put:ident, $put_le:ident, $get:ident, $get_le:ident) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn put_be(self, dst: &mut BytesMut) {
                dst.$put(self);
            }

            fn put_le(self, dst: &mut BytesMut) {
                dst.$put_le(self);
            }

            fn get_be(src: &mut &[u8]) -> Self {
                src.$get()
            }

            fn get_le(src: &mut &[u8]) -> Self {
                src.$get_le()
            }

            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            fn into_elements(values: Vec<Self>) -> Elements {
                Elements::$kind(values)
            }

            fn from_elements(elements: &Elements) -> Option<&[Self]> {
                match elements {
                    Elements::$kind(values) => Some(values.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(u8, U8, put_u8, put_u8, get_u8, get_u8);
impl_element!(i8, I8, put_i8, put_i8, get_i8, get_i8);
impl_element!(u16, U16, put_u16, put_u16_le, get_u16, get_u16_le);
impl_element!(i16, I16, put_i16, put_i16_le, get_i16, get_i16_le);
impl_element!(u32, U32, put_u32, put_u32_le, get_u32, get_u32_le);
impl_element!(i32, I32, put_i32, put_i32_le, get_i32, get_i32_le);
impl_element!(u64, U64, put_u64, put_u64_le, get_u64, get_u64_le);
impl_element!(i64, I64, put_i64, put_i64_le, get_i64, get_i64_le);
impl_element!(f32, F32, put_f32, put_f32_le, get_f32, get_f32_le);
impl_element!(f64, F64, put_f64, put_f64_le, get_f64, get_f64_le);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_catalog_kinds() {
        assert_eq!(<u8 as Element>::SIZE, ScalarKind::U8.size().unwrap());
        assert_eq!(<i16 as Element>::SIZE, ScalarKind::I16.size().unwrap());
        assert_eq!(<u32 as Element>::SIZE, ScalarKind::U32.size().unwrap());
        assert_eq!(<f32 as Element>::SIZE, ScalarKind::F32.size().unwrap());
        assert_eq!(<i64 as Element>::SIZE, ScalarKind::I64.size().unwrap());
        assert_eq!(<f64 as Element>::SIZE, ScalarKind::F64.size().unwrap());
    }

    #[test]
    fn be_and_le_paths_differ() {
        let mut be = BytesMut::new();
        let mut le = BytesMut::new();
        0x0102_0304u32.put_be(&mut be);
        0x0102_0304u32.put_le(&mut le);
        assert_eq!(be.as_ref(), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(le.as_ref(), [0x04, 0x03, 0x02, 0x01]);

        let mut src: &[u8] = &[0x01, 0x02, 0x03, 0x04];
        assert_eq!(u32::get_le(&mut src), 0x0403_0201);
    }

    #[test]
    fn floats_use_raw_ieee_bits() {
        let mut buf = BytesMut::new();
        1.5f32.put_be(&mut buf);
        assert_eq!(buf.as_ref(), 1.5f32.to_bits().to_be_bytes());

        let mut src = buf.as_ref();
        assert_eq!(f32::get_be(&mut src).to_bits(), 1.5f32.to_bits());
    }
}
