//! Wire framing and typed payload codec for the kwire protocol.
//!
//! Requests carry a 12-byte header (reserved word, device id, command id,
//! 32-bit payload length) followed by an argument payload encoded against
//! the command's declared types. Responses arrive as envelopes: a reserved
//! word and a 64-bit length, then exactly that many payload bytes.
//!
//! Header integers and scalars are big-endian. Array, vector and string
//! bodies are raw little-endian dumps.

pub mod codec;
pub mod element;
pub mod error;
pub mod payload;
pub mod reader;
pub mod value;
pub mod writer;

pub use codec::{
    decode_envelope_header, encode_command, encode_envelope, encode_request, FrameConfig,
    DEFAULT_MAX_PAYLOAD, ENVELOPE_HEADER_SIZE, REQUEST_HEADER_SIZE,
};
pub use element::Element;
pub use error::{FrameError, Result};
pub use payload::{
    decode_bool, decode_buffer, decode_elements, decode_scalar, decode_tuple, decode_value,
    encode_payload, encode_value, expect_size,
};
pub use reader::read_envelope;
pub use value::{Elements, Value};
pub use writer::write_request;
