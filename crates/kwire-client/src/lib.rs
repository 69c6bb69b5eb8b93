//! Blocking client for kwire command servers.
//!
//! A [`Client`] owns one connection. On construction it invokes the
//! server's bootstrap command (device 1, command 1) to fetch the command
//! catalog, then resolves every [`Client::call`] by name against it. Typed
//! accessors (`read_u32`, `read_array`, `read_tuple`, ...) consume the
//! reply after checking themselves against the declared return type.
//!
//! ```no_run
//! use kwire_client::{Client, Endpoint};
//!
//! let mut client = Client::connect(&Endpoint::tcp("192.168.1.100"))?;
//! client.call("Common", "set_led", &[42u32.into()])?;
//! client.call("Common", "get_led", &[])?;
//! let led = client.read_u32()?;
//! # Ok::<(), kwire_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;

pub use client::{Client, BOOTSTRAP_COMMAND_ID, BOOTSTRAP_DEVICE_ID};
pub use config::{ClientConfig, Endpoint, DEFAULT_PORT};
pub use error::{ClientError, Result};
