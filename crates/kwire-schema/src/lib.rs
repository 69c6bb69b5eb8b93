//! Command catalog for the kwire protocol.
//!
//! The server publishes its devices, commands and their C++ type
//! signatures once per connection. This crate parses that document into
//! immutable lookup tables ([`SchemaTable`]) and turns every type string
//! into a closed [`TypeSpec`] the codec can match on exhaustively.

pub mod catalog;
pub mod config;
pub mod error;
pub mod registry;
pub mod types;

pub use catalog::{parse_catalog, ArgDescriptor, CommandDescriptor, DeviceDescriptor};
pub use config::RegistryConfig;
pub use error::{Result, SchemaError};
pub use registry::{ArgSpec, CommandSchema, DeviceSchema, ResolvedCommand, SchemaTable};
pub use types::{ArrayLen, ScalarKind, TypeSpec};
