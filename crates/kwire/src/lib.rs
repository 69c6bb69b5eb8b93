//! Client for binary command servers.
//!
//! A command server exposes devices, each a group of commands with C++
//! type signatures, and publishes that catalog to every client on connect.
//! kwire fetches the catalog, encodes calls into compact binary frames and
//! decodes replies with runtime checks against the declared return types.
//!
//! # Crate Structure
//!
//! - [`transport`]: blocking byte streams (TCP, Unix sockets)
//! - [`schema`]: catalog parsing and type-string grammar
//! - [`frame`]: request frames, response envelopes and the payload codec
//! - [`client`]: the connection session with typed accessors

/// Re-export transport types.
pub mod transport {
    pub use kwire_transport::*;
}

/// Re-export schema types.
pub mod schema {
    pub use kwire_schema::*;
}

/// Re-export frame types.
pub mod frame {
    pub use kwire_frame::*;
}

/// Re-export client types.
pub mod client {
    pub use kwire_client::*;
}

pub use kwire_client::{Client, ClientConfig, ClientError, Endpoint, DEFAULT_PORT};
pub use kwire_frame::Value;
