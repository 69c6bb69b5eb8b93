//! Blocking byte-stream transport for the kwire command protocol.
//!
//! The protocol layers above need exactly two things from a connection:
//! "write all of these bytes" and "read exactly N bytes". [`Transport`]
//! captures that contract; any `Read + Write` stream satisfies it.
//!
//! [`KStream`] is the concrete stream used by the client, connecting over
//! TCP or a Unix domain socket.

pub mod error;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use stream::{KStream, TransportConfig, DEFAULT_RECV_BUFFER_SIZE};
pub use traits::Transport;
