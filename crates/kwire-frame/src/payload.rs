//! Type-directed payload encoding and decoding.
//!
//! Scalars are written big-endian with their full field width; signed
//! integers keep their two's-complement bit pattern and floats their raw
//! IEEE-754 bits. Fixed arrays are a raw little-endian element dump,
//! vectors and strings the same dump behind an 8-byte big-endian count.

use bytes::{BufMut, BytesMut};
use kwire_schema::{ScalarKind, TypeSpec};

use crate::element::Element;
use crate::error::{FrameError, Result};
use crate::value::{Elements, Value};

/// Encode `values` against their declared `specs`, appending to `dst`.
///
/// A dynamic vector that is not the last argument is followed by a
/// recursively encoded block holding every remaining argument; the server
/// unpacks variable-length data as a trailing tuple.
pub fn encode_payload(specs: &[TypeSpec], values: &[Value], dst: &mut BytesMut) -> Result<()> {
    if specs.len() != values.len() {
        return Err(FrameError::Arity {
            expected: specs.len(),
            received: values.len(),
        });
    }

    for (i, (spec, value)) in specs.iter().zip(values).enumerate() {
        encode_value(spec, value, dst)?;
        if spec.is_dynamic_vector() && i + 1 < specs.len() {
            return encode_payload(&specs[i + 1..], &values[i + 1..], dst);
        }
    }
    Ok(())
}

/// Encode one value against its declared type.
pub fn encode_value(spec: &TypeSpec, value: &Value, dst: &mut BytesMut) -> Result<()> {
    match spec {
        TypeSpec::Scalar(kind) => encode_scalar(*kind, value, dst),
        TypeSpec::Array { elem, len } => {
            let elements = expect_elements(*elem, value)?;
            if let Some(expected) = len.literal() {
                if elements.len() != expected {
                    return Err(FrameError::LengthMismatch {
                        expected,
                        received: elements.len(),
                    });
                }
            }
            elements.put_le(dst);
            Ok(())
        }
        TypeSpec::Vector(elem) => {
            let elements = expect_elements(*elem, value)?;
            dst.put_u64(elements.len() as u64);
            elements.put_le(dst);
            Ok(())
        }
        TypeSpec::Tuple(items) => {
            let Value::Tuple(values) = value else {
                return Err(mismatch(spec.to_string(), value));
            };
            if values.len() != items.len() {
                return Err(FrameError::Arity {
                    expected: items.len(),
                    received: values.len(),
                });
            }
            items
                .iter()
                .zip(values)
                .try_for_each(|(item, value)| encode_value(item, value, dst))
        }
    }
}

fn encode_scalar(kind: ScalarKind, value: &Value, dst: &mut BytesMut) -> Result<()> {
    if kind.is_integer() {
        let bits = value.as_i128().ok_or_else(|| mismatch(kind.name(), value))?;
        // Truncation keeps the two's-complement pattern at the field width.
        match kind {
            ScalarKind::U8 => dst.put_u8(bits as u8),
            ScalarKind::I8 => dst.put_i8(bits as i8),
            ScalarKind::U16 => dst.put_u16(bits as u16),
            ScalarKind::I16 => dst.put_i16(bits as i16),
            ScalarKind::U32 => dst.put_u32(bits as u32),
            ScalarKind::I32 => dst.put_i32(bits as i32),
            ScalarKind::U64 => dst.put_u64(bits as u64),
            _ => dst.put_i64(bits as i64),
        }
        return Ok(());
    }

    match (kind, value) {
        (ScalarKind::F32, Value::F32(v)) => dst.put_f32(*v),
        (ScalarKind::F32, _) => {
            let v = value.as_f64().ok_or_else(|| mismatch(kind.name(), value))?;
            dst.put_f32(v as f32);
        }
        (ScalarKind::F64, _) => {
            let v = value.as_f64().ok_or_else(|| mismatch(kind.name(), value))?;
            dst.put_f64(v);
        }
        (ScalarKind::Bool, Value::Bool(v)) => dst.put_u8(u8::from(*v)),
        (ScalarKind::String, Value::Str(s)) => {
            dst.put_u64(s.len() as u64);
            dst.put_slice(s.as_bytes());
        }
        _ => return Err(mismatch(kind.name(), value)),
    }
    Ok(())
}

fn expect_elements(elem: ScalarKind, value: &Value) -> Result<&Elements> {
    match value {
        Value::Buffer(elements) if elements.kind() == elem => Ok(elements),
        Value::Buffer(elements) => Err(FrameError::TypeMismatch {
            expected: elem.name().to_string(),
            found: elements.kind().name().to_string(),
        }),
        other => Err(mismatch(format!("buffer of {elem}"), other)),
    }
}

fn mismatch(expected: impl Into<String>, found: &Value) -> FrameError {
    FrameError::TypeMismatch {
        expected: expected.into(),
        found: found.type_name(),
    }
}

/// Require a payload of exactly `expected` bytes.
pub fn expect_size(payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() != expected {
        return Err(FrameError::PayloadSize {
            expected,
            received: payload.len(),
        });
    }
    Ok(())
}

/// Decode a single big-endian scalar filling the whole payload.
pub fn decode_scalar<T: Element>(payload: &[u8]) -> Result<T> {
    expect_size(payload, T::SIZE)?;
    let mut src = payload;
    Ok(T::get_be(&mut src))
}

/// Decode a one-byte boolean; any non-zero byte is `true`.
pub fn decode_bool(payload: &[u8]) -> Result<bool> {
    expect_size(payload, 1)?;
    Ok(payload[0] != 0)
}

/// Decode a raw little-endian element buffer.
///
/// With `count`, the payload must hold exactly that many elements;
/// without, it must be a whole number of elements.
pub fn decode_elements<T: Element>(payload: &[u8], count: Option<usize>) -> Result<Vec<T>> {
    let expected = match count {
        Some(count) => count
            .checked_mul(T::SIZE)
            .ok_or_else(|| FrameError::Unsized {
                type_name: format!("{}[{count}]", T::KIND),
            })?,
        None => payload.len() - payload.len() % T::SIZE,
    };
    expect_size(payload, expected)?;

    let mut src = payload;
    Ok((0..payload.len() / T::SIZE)
        .map(|_| T::get_le(&mut src))
        .collect())
}

/// Decode a raw little-endian buffer holding any whole number of `elem` values.
pub fn decode_buffer(elem: ScalarKind, payload: &[u8]) -> Result<Elements> {
    let size = elem
        .size()
        .filter(|_| elem.is_numeric())
        .ok_or_else(|| FrameError::Unsized {
            type_name: elem.name().to_string(),
        })?;
    expect_size(payload, payload.len() - payload.len() % size)?;

    let mut src = payload;
    Ok(decode_array_le(elem, payload.len() / size, &mut src))
}

/// Decode a fixed-layout tuple: scalars big-endian, arrays little-endian.
pub fn decode_tuple(layout: &[TypeSpec], payload: &[u8]) -> Result<Vec<Value>> {
    let expected = layout
        .iter()
        .try_fold(0usize, |total, item| total.checked_add(item.fixed_size()?))
        .ok_or_else(|| FrameError::Unsized {
            type_name: TypeSpec::Tuple(layout.to_vec()).to_string(),
        })?;
    expect_size(payload, expected)?;

    let mut src = payload;
    layout
        .iter()
        .map(|item| decode_fixed(item, &mut src))
        .collect()
}

/// Decode one fixed-size value filling the whole payload.
pub fn decode_value(spec: &TypeSpec, payload: &[u8]) -> Result<Value> {
    let expected = spec.fixed_size().ok_or_else(|| FrameError::Unsized {
        type_name: spec.to_string(),
    })?;
    expect_size(payload, expected)?;

    let mut src = payload;
    decode_fixed(spec, &mut src)
}

fn decode_fixed(spec: &TypeSpec, src: &mut &[u8]) -> Result<Value> {
    let value = match spec {
        TypeSpec::Scalar(kind) => match kind {
            ScalarKind::U8 => Value::U8(u8::get_be(src)),
            ScalarKind::I8 => Value::I8(i8::get_be(src)),
            ScalarKind::U16 => Value::U16(u16::get_be(src)),
            ScalarKind::I16 => Value::I16(i16::get_be(src)),
            ScalarKind::U32 => Value::U32(u32::get_be(src)),
            ScalarKind::I32 => Value::I32(i32::get_be(src)),
            ScalarKind::U64 => Value::U64(u64::get_be(src)),
            ScalarKind::I64 => Value::I64(i64::get_be(src)),
            ScalarKind::F32 => Value::F32(f32::get_be(src)),
            ScalarKind::F64 => Value::F64(f64::get_be(src)),
            ScalarKind::Bool => Value::Bool(u8::get_be(src) != 0),
            ScalarKind::String => {
                return Err(FrameError::Unsized {
                    type_name: spec.to_string(),
                })
            }
        },
        TypeSpec::Array { elem, len } => {
            let count = len.literal().ok_or_else(|| FrameError::Unsized {
                type_name: spec.to_string(),
            })?;
            Value::Buffer(decode_array_le(*elem, count, src))
        }
        TypeSpec::Tuple(items) => Value::Tuple(
            items
                .iter()
                .map(|item| decode_fixed(item, src))
                .collect::<Result<_>>()?,
        ),
        TypeSpec::Vector(_) => {
            return Err(FrameError::Unsized {
                type_name: spec.to_string(),
            })
        }
    };
    Ok(value)
}

fn decode_array_le(elem: ScalarKind, count: usize, src: &mut &[u8]) -> Elements {
    fn take<T: Element>(count: usize, src: &mut &[u8]) -> Vec<T> {
        (0..count).map(|_| T::get_le(src)).collect()
    }

    match elem {
        ScalarKind::U8 => Elements::U8(take(count, src)),
        ScalarKind::I8 => Elements::I8(take(count, src)),
        ScalarKind::U16 => Elements::U16(take(count, src)),
        ScalarKind::I16 => Elements::I16(take(count, src)),
        ScalarKind::U32 => Elements::U32(take(count, src)),
        ScalarKind::I32 => Elements::I32(take(count, src)),
        ScalarKind::U64 => Elements::U64(take(count, src)),
        ScalarKind::I64 => Elements::I64(take(count, src)),
        ScalarKind::F32 => Elements::F32(take(count, src)),
        // Array elements are numeric by construction of `TypeSpec`.
        _ => Elements::F64(take(count, src)),
    }
}
