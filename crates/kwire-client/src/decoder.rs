//! Typed response accessors.
//!
//! The wire carries only a payload length, never a type tag. Every accessor
//! therefore checks itself against the return type the catalog declares for
//! the pending call before any byte is read, and fixed-size accessors check
//! the payload length exactly after.

use std::fmt;

use kwire_frame::{
    decode_bool, decode_buffer, decode_elements, decode_scalar, decode_tuple, decode_value,
    Element, FrameError, Value,
};
use kwire_schema::{ArrayLen, ScalarKind, TypeSpec};
use kwire_transport::Transport;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::{Client, PendingCall};
use crate::error::{ClientError, Result};

impl<T: Transport> Client<T> {
    /// Read a numeric scalar reply (big-endian).
    ///
    /// `read_scalar::<u32>()` accepts commands declared as `uint32_t`,
    /// `unsigned int` or any other spelling of the same kind.
    pub fn read_scalar<E: Element>(&mut self) -> Result<E> {
        self.expect_return(&TypeSpec::Scalar(E::KIND))?;
        let payload = self.take_response()?;
        Ok(checked(decode_scalar::<E>(&payload))?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_scalar()
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_scalar()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_scalar()
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_scalar()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_scalar()
    }

    /// Read a one-byte boolean reply.
    pub fn read_bool(&mut self) -> Result<bool> {
        self.expect_return(&TypeSpec::Scalar(ScalarKind::Bool))?;
        let payload = self.take_response()?;
        Ok(checked(decode_bool(&payload))?)
    }

    /// Read a string reply. A single trailing NUL is dropped.
    pub fn read_string(&mut self) -> Result<String> {
        self.expect_return(&TypeSpec::Scalar(ScalarKind::String))?;
        let payload = self.take_response()?;
        let body = payload.strip_suffix(b"\0").unwrap_or(&payload[..]);
        Ok(String::from_utf8(body.to_vec())?)
    }

    /// Read a string reply and deserialize it as JSON.
    pub fn read_json<D: DeserializeOwned>(&mut self) -> Result<D> {
        let text = self.read_string()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Read a fixed-size array reply (raw little-endian), flattened.
    ///
    /// The product of `shape` must equal the declared array length when
    /// the catalog gives a numeric one.
    pub fn read_array<E: Element>(&mut self, shape: &[usize]) -> Result<Vec<E>> {
        let count = shape
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
            .ok_or_else(|| FrameError::Unsized {
                type_name: format!("std::array<{}, {shape:?}>", E::KIND),
            })?;
        self.expect_return(&TypeSpec::Array {
            elem: E::KIND,
            len: ArrayLen::Literal(count),
        })?;
        let payload = self.take_response()?;
        Ok(checked(decode_elements::<E>(&payload, Some(count)))?)
    }

    /// Read a dynamic vector reply (raw little-endian) of any length.
    pub fn read_vector<E: Element>(&mut self) -> Result<Vec<E>> {
        self.expect_return(&TypeSpec::Vector(E::KIND))?;
        let payload = self.take_response()?;
        Ok(checked(decode_elements::<E>(&payload, None))?)
    }

    /// Read a fixed-layout tuple reply.
    ///
    /// `layout` must match the declared tuple member for member; scalar
    /// members are big-endian and array members little-endian.
    pub fn read_tuple(&mut self, layout: &[TypeSpec]) -> Result<Vec<Value>> {
        self.expect_return(&TypeSpec::Tuple(layout.to_vec()))?;
        let payload = self.take_response()?;
        Ok(checked(decode_tuple(layout, &payload))?)
    }

    /// Read the reply as whatever the catalog declares it to be.
    ///
    /// Arrays with a symbolic length and vectors accept any whole number
    /// of elements. Fails for commands returning nothing.
    pub fn read_value(&mut self) -> Result<Value> {
        let pending = self.pending.as_ref().ok_or(ClientError::NoPendingCall)?;
        let Some(declared) = pending.ret.clone() else {
            return Err(return_type_error(pending, "value"));
        };

        if declared == TypeSpec::Scalar(ScalarKind::String) {
            return self.read_string().map(Value::Str);
        }

        let payload = self.take_response()?;
        let value = match &declared {
            TypeSpec::Vector(elem) => Value::Buffer(checked(decode_buffer(*elem, &payload))?),
            TypeSpec::Array { elem, len } if len.literal().is_none() => {
                Value::Buffer(checked(decode_buffer(*elem, &payload))?)
            }
            fixed => checked(decode_value(fixed, &payload))?,
        };
        Ok(value)
    }

    /// Check `requested` against the declared return of the pending call.
    fn expect_return(&self, requested: &TypeSpec) -> Result<()> {
        let pending = self.pending.as_ref().ok_or(ClientError::NoPendingCall)?;
        let Some(declared) = &pending.ret else {
            return Err(return_type_error(pending, requested));
        };

        match (declared, requested) {
            (
                TypeSpec::Array { elem, len },
                TypeSpec::Array {
                    elem: wanted,
                    len: wanted_len,
                },
            ) if elem == wanted => match (len.literal(), wanted_len.literal()) {
                (Some(expected), Some(requested)) if expected != requested => {
                    warn!(
                        device = %pending.device,
                        command = %pending.command,
                        expected,
                        requested,
                        "array shape does not match declared length"
                    );
                    Err(ClientError::ReturnLength {
                        device: pending.device.clone(),
                        command: pending.command.clone(),
                        expected,
                        requested,
                    })
                }
                _ => Ok(()),
            },
            (declared, requested) if declared == requested => Ok(()),
            _ => Err(return_type_error(pending, requested)),
        }
    }
}

fn return_type_error(pending: &PendingCall, requested: impl fmt::Display) -> ClientError {
    warn!(
        device = %pending.device,
        command = %pending.command,
        declared = pending.declared(),
        %requested,
        "accessor does not match declared return type"
    );
    ClientError::ReturnType {
        device: pending.device.clone(),
        command: pending.command.clone(),
        declared: pending.declared().to_string(),
        requested: requested.to_string(),
    }
}

fn checked<V>(decoded: kwire_frame::Result<V>) -> kwire_frame::Result<V> {
    decoded.inspect_err(|err| {
        if let FrameError::PayloadSize { expected, received } = err {
            warn!(expected, received, "response payload size mismatch");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Scripted;

    fn client_with(replies: &[&[u8]]) -> Client<Scripted> {
        Client::new(Scripted::with_catalog(replies)).unwrap()
    }

    #[test]
    fn scalar_accepts_any_spelling_of_its_kind() {
        let mut client = client_with(&[&42u32.to_be_bytes()]);
        client.call("Common", "get_led", &[]).unwrap();
        assert_eq!(client.read_u32().unwrap(), 42);
        assert!(!client.awaiting_response());
    }

    #[test]
    fn uint32_accessor_on_float_command_names_declared_type() {
        let mut client = client_with(&[&21.5f32.to_be_bytes()]);
        client.call("Common", "get_temperature", &[]).unwrap();

        let err = client.read_u32().unwrap_err();
        match &err {
            ClientError::ReturnType {
                device,
                command,
                declared,
                requested,
            } => {
                assert_eq!(device, "Common");
                assert_eq!(command, "get_temperature");
                assert_eq!(declared, "float");
                assert_eq!(requested, "uint32_t");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "Common::get_temperature returns float, cannot read it as uint32_t"
        );

        // Nothing was consumed; the matching accessor still works.
        assert_eq!(client.read_f32().unwrap(), 21.5);
    }

    #[test]
    fn bool_reply_is_nonzero_byte() {
        let mut client = client_with(&[&[2]]);
        client.call("Common", "is_ready", &[]).unwrap();
        assert!(client.read_bool().unwrap());
    }

    #[test]
    fn string_reply_drops_trailing_nul() {
        let mut client = client_with(&[b"red-pitaya\0"]);
        client.call("Common", "get_name", &[]).unwrap();
        assert_eq!(client.read_string().unwrap(), "red-pitaya");
    }

    #[test]
    fn string_reply_must_be_utf8() {
        let mut client = client_with(&[&[0xFF, 0xFE]]);
        client.call("Common", "get_name", &[]).unwrap();
        assert!(matches!(
            client.read_string().unwrap_err(),
            ClientError::InvalidUtf8(_)
        ));
    }

    #[test]
    fn json_reply_deserializes() {
        let mut client = client_with(&[br#"{"fw": "0.9"}"#]);
        client.call("Common", "get_name", &[]).unwrap();
        let value: serde_json::Value = client.read_json().unwrap();
        assert_eq!(value["fw"], "0.9");
    }

    #[test]
    fn array_reply_is_little_endian_and_shape_checked() {
        let body: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut client = client_with(&[&body, &body]);

        client.call("Oscillo", "read_all", &[]).unwrap();
        assert_eq!(client.read_array::<f32>(&[2, 2]).unwrap(), [1.0, 2.0, 3.0, 4.0]);

        client.call("Oscillo", "read_all", &[]).unwrap();
        let err = client.read_array::<f32>(&[3]).unwrap_err();
        assert!(matches!(
            err,
            ClientError::ReturnLength {
                expected: 4,
                requested: 3,
                ..
            }
        ));

        let err = client.read_array::<u32>(&[4]).unwrap_err();
        assert!(matches!(err, ClientError::ReturnType { .. }));
    }

    #[test]
    fn array_with_named_length_checks_payload_size() {
        let mut client = client_with(&[&[1, 0, 2, 0, 3, 0], &[1, 0, 2, 0]]);

        client.call("Oscillo", "read_window", &[]).unwrap();
        assert_eq!(client.read_array::<u16>(&[3]).unwrap(), [1, 2, 3]);

        client.call("Oscillo", "read_window", &[]).unwrap();
        let err = client.read_array::<u16>(&[3]).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Frame(FrameError::PayloadSize {
                expected: 6,
                received: 4
            })
        ));
    }

    #[test]
    fn overflowing_array_shape_is_rejected_before_reading() {
        let mut client = client_with(&[&[1, 0, 2, 0]]);
        client.call("Oscillo", "read_window", &[]).unwrap();

        let err = client.read_array::<u16>(&[usize::MAX, 2]).unwrap_err();
        assert!(matches!(err, ClientError::Frame(FrameError::Unsized { .. })));

        assert!(client.awaiting_response());
        assert_eq!(client.read_array::<u16>(&[2]).unwrap(), [1, 2]);
    }

    #[test]
    fn vector_reply_has_any_length() {
        let body: Vec<u8> = [-1i32, 5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut client = client_with(&[&body, &[]]);

        client.call("Oscillo", "get_samples", &[]).unwrap();
        assert_eq!(client.read_vector::<i32>().unwrap(), [-1, 5]);

        client.call("Oscillo", "get_samples", &[]).unwrap();
        assert!(client.read_vector::<i32>().unwrap().is_empty());
    }

    #[test]
    fn vector_accessor_checks_element_type() {
        let mut client = client_with(&[]);
        client.call("Oscillo", "get_samples", &[]).unwrap();
        let err = client.read_vector::<u32>().unwrap_err();
        assert!(matches!(
            err,
            ClientError::ReturnType { ref declared, .. } if declared == "std::vector<int32_t>"
        ));
    }

    #[test]
    fn tuple_reply_decodes_members_big_endian() {
        let mut body = Vec::new();
        body.extend_from_slice(&7u32.to_be_bytes());
        body.extend_from_slice(&0.25f32.to_be_bytes());
        body.push(1);
        let mut client = client_with(&[&body]);
        let layout = [
            TypeSpec::Scalar(ScalarKind::U32),
            TypeSpec::Scalar(ScalarKind::F32),
            TypeSpec::Scalar(ScalarKind::Bool),
        ];

        client.call("Common", "get_status", &[]).unwrap();
        assert_eq!(
            client.read_tuple(&layout).unwrap(),
            [Value::U32(7), Value::F32(0.25), Value::Bool(true)]
        );
    }

    #[test]
    fn tuple_layout_must_match_declaration() {
        let mut client = client_with(&[]);
        client.call("Common", "get_status", &[]).unwrap();
        let err = client
            .read_tuple(&[
                TypeSpec::Scalar(ScalarKind::U32),
                TypeSpec::Scalar(ScalarKind::F32),
            ])
            .unwrap_err();
        assert!(matches!(err, ClientError::ReturnType { .. }));
    }

    #[test]
    fn read_value_follows_declaration() {
        let mut status = 11u32.to_be_bytes().to_vec();
        status.extend_from_slice(&1.5f32.to_be_bytes());
        status.push(0);
        let mut client = client_with(&[
            &7u32.to_be_bytes(),
            b"board\0",
            &status,
            &[1, 0, 2, 0, 3, 0, 4, 0],
            &[5, 0, 0, 0],
        ]);

        client.call("Common", "get_led", &[]).unwrap();
        assert_eq!(client.read_value().unwrap(), Value::U32(7));

        client.call("Common", "get_name", &[]).unwrap();
        assert_eq!(client.read_value().unwrap(), Value::Str("board".to_string()));

        client.call("Common", "get_status", &[]).unwrap();
        assert_eq!(
            client.read_value().unwrap(),
            Value::Tuple(vec![Value::U32(11), Value::F32(1.5), Value::Bool(false)])
        );

        client.call("Oscillo", "read_window", &[]).unwrap();
        assert_eq!(client.read_value().unwrap(), Value::from(vec![1u16, 2, 3, 4]));

        client.call("Oscillo", "get_samples", &[]).unwrap();
        assert_eq!(client.read_value().unwrap(), Value::from(vec![5i32]));
    }

    #[test]
    fn read_value_fails_for_void_commands() {
        let mut client = client_with(&[]);
        client.call("Common", "set_led", &[0u32.into()]).unwrap();
        assert!(matches!(
            client.read_value().unwrap_err(),
            ClientError::ReturnType { ref requested, .. } if requested == "value"
        ));
    }

    #[test]
    fn void_command_rejects_every_accessor() {
        let mut client = client_with(&[]);
        client.call("Common", "set_led", &[3u32.into()]).unwrap();
        let err = client.read_u32().unwrap_err();
        assert!(matches!(
            err,
            ClientError::ReturnType { ref declared, .. } if declared == "void"
        ));
    }

    #[test]
    fn accessor_without_call_fails() {
        let mut client = client_with(&[]);
        assert!(matches!(
            client.read_bool().unwrap_err(),
            ClientError::NoPendingCall
        ));
    }

    #[test]
    fn scalar_reply_of_wrong_size_is_desync() {
        let mut client = client_with(&[&[0, 0, 1]]);
        client.call("Common", "get_led", &[]).unwrap();
        assert!(matches!(
            client.read_u32().unwrap_err(),
            ClientError::Frame(FrameError::PayloadSize {
                expected: 4,
                received: 3
            })
        ));
    }
}
