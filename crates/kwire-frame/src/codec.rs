use bytes::{BufMut, Bytes, BytesMut};
use kwire_schema::TypeSpec;

use crate::error::{FrameError, Result};
use crate::payload::encode_payload;
use crate::value::Value;

/// Request header: reserved (4) + device id (2) + command id (2) + length (4).
pub const REQUEST_HEADER_SIZE: usize = 12;

/// Response header: reserved (4) + length (8).
pub const ENVELOPE_HEADER_SIZE: usize = 12;

/// Default maximum payload size: 64 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Configuration for the frame codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum request or response payload size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Encode a request frame into the wire format.
///
/// Wire format (header integers big-endian):
/// ```text
/// ┌───────────────┬───────────┬────────────┬────────┬────────────────┐
/// │ Reserved      │ Device ID │ Command ID │ Length │ Payload        │
/// │ (4B, zero)    │ (2B)      │ (2B)       │ (4B)   │ (Length bytes) │
/// └───────────────┴───────────┴────────────┴────────┴────────────────┘
/// ```
pub fn encode_request(
    device_id: u16,
    command_id: u16,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len() as u64,
        max: u64::from(u32::MAX),
    })?;
    dst.reserve(REQUEST_HEADER_SIZE + payload.len());
    dst.put_u32(0);
    dst.put_u16(device_id);
    dst.put_u16(command_id);
    dst.put_u32(len);
    dst.put_slice(payload);
    Ok(())
}

/// Build a complete request frame for one command invocation.
///
/// Arguments are checked against `arg_specs` before anything is written;
/// on error no frame is produced.
pub fn encode_command(
    device_id: u16,
    command_id: u16,
    arg_specs: &[TypeSpec],
    values: &[Value],
    config: &FrameConfig,
) -> Result<Bytes> {
    let mut payload = BytesMut::new();
    encode_payload(arg_specs, values, &mut payload)?;

    if payload.len() > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len() as u64,
            max: config.max_payload_size as u64,
        });
    }

    let mut frame = BytesMut::with_capacity(REQUEST_HEADER_SIZE + payload.len());
    encode_request(device_id, command_id, &payload, &mut frame)?;
    Ok(frame.freeze())
}

/// Decode a response envelope header, returning the payload length.
///
/// Wire format (header integers big-endian):
/// ```text
/// ┌───────────────┬─────────────┬─────────────────┐
/// │ Reserved (4B) │ Length (8B) │ Payload         │
/// └───────────────┴─────────────┴─────────────────┘
/// ```
pub fn decode_envelope_header(header: &[u8; ENVELOPE_HEADER_SIZE]) -> Result<u64> {
    let (reserved, length) = header.split_at(4);
    let reserved = u32::from_be_bytes([reserved[0], reserved[1], reserved[2], reserved[3]]);
    if reserved != 0 {
        return Err(FrameError::ReservedNonZero(reserved));
    }
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(length);
    Ok(u64::from_be_bytes(len_bytes))
}

/// Encode a response envelope. Used by test servers and tooling.
pub fn encode_envelope(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(ENVELOPE_HEADER_SIZE + payload.len());
    dst.put_u32(0);
    dst.put_u64(payload.len() as u64);
    dst.put_slice(payload);
}
