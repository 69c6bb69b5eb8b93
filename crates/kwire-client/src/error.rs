/// Errors that can occur in client operations.
///
/// Apart from [`ClientError::ReturnType`] and [`ClientError::ReturnLength`],
/// which are raised before any response byte is consumed, every error
/// leaves the connection in an unknown state.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] kwire_transport::TransportError),

    /// Catalog error: unsupported type, unknown device or command.
    #[error("schema error: {0}")]
    Schema(#[from] kwire_schema::SchemaError),

    /// Frame or payload codec error.
    #[error("frame error: {0}")]
    Frame(#[from] kwire_frame::FrameError),

    /// The accessor does not match the return type declared in the catalog.
    #[error("{device}::{command} returns {declared}, cannot read it as {requested}")]
    ReturnType {
        device: String,
        command: String,
        declared: String,
        requested: String,
    },

    /// The requested array shape disagrees with the declared array length.
    #[error("{device}::{command} returns {expected} elements, requested {requested}")]
    ReturnLength {
        device: String,
        command: String,
        expected: usize,
        requested: usize,
    },

    /// A response accessor was used with no command awaiting a reply.
    #[error("no command awaiting a response")]
    NoPendingCall,

    /// A new command was issued while the previous reply is still unread.
    #[error("response to {device}::{command} has not been read")]
    UnreadResponse { device: String, command: String },

    /// A string response is not valid UTF-8.
    #[error("string response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// JSON deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
