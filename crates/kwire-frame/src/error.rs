use kwire_transport::TransportError;

/// Errors that can occur while encoding requests or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The number of supplied arguments differs from the declared arity.
    #[error("invalid number of arguments: expected {expected} but received {received}")]
    Arity { expected: usize, received: usize },

    /// A value does not match its declared type or element type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A fixed-size array argument has the wrong number of elements.
    #[error("array length mismatch: expected {expected} elements but received {received}")]
    LengthMismatch { expected: usize, received: usize },

    /// A type has no fixed wire size where one is required.
    #[error("type {type_name} has no fixed wire size")]
    Unsized { type_name: String },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The reserved header field of a response envelope is not zero.
    #[error("protocol desynchronized: reserved envelope field is {0:#x}, expected 0")]
    ReservedNonZero(u32),

    /// The response payload length differs from the size the accessor requires.
    #[error("protocol desynchronized: expected {expected} payload bytes, received {received}")]
    PayloadSize { expected: usize, received: usize },

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
