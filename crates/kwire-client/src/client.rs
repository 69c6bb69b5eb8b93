use std::sync::Arc;

use bytes::Bytes;
use kwire_frame::{encode_command, read_envelope, write_request, Value};
use kwire_schema::{ScalarKind, SchemaTable, TypeSpec};
use kwire_transport::{KStream, Transport};
use tracing::info;

use crate::config::{ClientConfig, Endpoint};
use crate::error::{ClientError, Result};

/// Device id of the server's own catalog command.
pub const BOOTSTRAP_DEVICE_ID: u16 = 1;
/// Command id returning the catalog document.
pub const BOOTSTRAP_COMMAND_ID: u16 = 1;

/// The command whose response is next on the wire.
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    pub(crate) device: String,
    pub(crate) command: String,
    pub(crate) ret_type: Option<String>,
    pub(crate) ret: Option<TypeSpec>,
}

impl PendingCall {
    pub(crate) fn declared(&self) -> &str {
        self.ret_type.as_deref().unwrap_or("void")
    }
}

/// A blocking session with one command server.
///
/// The catalog is fetched once in the constructor and shared read-only
/// afterwards. Each [`call`](Client::call) must be followed by exactly one
/// response accessor (unless the command returns nothing) before the next
/// call; one request is in flight at a time.
///
/// A `Client` is not meant to be shared between threads issuing calls.
/// Open one connection per worker instead; [`Client::schema_handle`]
/// lets them share an already-loaded catalog for inspection.
pub struct Client<T: Transport = KStream> {
    pub(crate) transport: T,
    schema: Arc<SchemaTable>,
    pub(crate) pending: Option<PendingCall>,
    pub(crate) config: ClientConfig,
}

impl Client<KStream> {
    /// Connect to a command server and load its catalog.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_with_config(endpoint, ClientConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(endpoint: &Endpoint, config: ClientConfig) -> Result<Self> {
        let stream = match endpoint {
            Endpoint::Tcp { host, port } => KStream::connect_tcp(host, *port, &config.transport)?,
            Endpoint::Unix(path) => KStream::connect_unix(path, &config.transport)?,
        };
        Self::with_config(stream, config)
    }
}

impl<T: Transport> Client<T> {
    /// Wrap an already-connected transport and load the catalog.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Wrap an already-connected transport with explicit configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Result<Self> {
        let mut client = Self {
            transport,
            schema: Arc::new(SchemaTable::default()),
            pending: None,
            config,
        };
        client.bootstrap()?;
        Ok(client)
    }

    fn bootstrap(&mut self) -> Result<()> {
        self.send(BOOTSTRAP_DEVICE_ID, BOOTSTRAP_COMMAND_ID, &[], &[])?;
        self.pending = Some(PendingCall {
            device: "KServer".to_string(),
            command: "get_cmds".to_string(),
            ret_type: Some(ScalarKind::String.name().to_string()),
            ret: Some(TypeSpec::Scalar(ScalarKind::String)),
        });

        let document = self.read_string()?;
        let table = SchemaTable::load_with_config(&document, self.config.registry)?;
        info!(
            devices = table.devices().len(),
            commands = table.command_count(),
            "command catalog ready"
        );
        self.schema = Arc::new(table);
        Ok(())
    }

    /// The catalog published by the server.
    pub fn schema(&self) -> &SchemaTable {
        &self.schema
    }

    /// Shared handle to the catalog, usable after the client is dropped.
    pub fn schema_handle(&self) -> Arc<SchemaTable> {
        Arc::clone(&self.schema)
    }

    /// Server-assigned (device id, command id) for a pair of names.
    pub fn ids(&self, device: &str, command: &str) -> Result<(u16, u16)> {
        let resolved = self.schema.resolve(device, command)?;
        Ok((resolved.device_id(), resolved.command_id()))
    }

    /// Invoke `device::command` with `args`.
    ///
    /// Arguments are checked against the declared signature and the frame
    /// is fully encoded before anything is written. The reply, if the
    /// command declares one, must be consumed with the accessor matching
    /// its return type.
    pub fn call(&mut self, device: &str, command: &str, args: &[Value]) -> Result<()> {
        if let Some(pending) = self.pending.as_ref().filter(|p| p.ret.is_some()) {
            return Err(ClientError::UnreadResponse {
                device: pending.device.clone(),
                command: pending.command.clone(),
            });
        }

        let resolved = self.schema.resolve(device, command)?;
        let specs = resolved.command.arg_specs();
        let call = PendingCall {
            device: resolved.device.name.clone(),
            command: resolved.command.name.clone(),
            ret_type: resolved.command.ret_type.clone(),
            ret: resolved.command.ret.clone(),
        };
        let (device_id, command_id) = (resolved.device_id(), resolved.command_id());

        self.send(device_id, command_id, &specs, args)?;
        self.pending = Some(call);
        Ok(())
    }

    fn send(&mut self, device_id: u16, command_id: u16, specs: &[TypeSpec], args: &[Value]) -> Result<()> {
        let frame = encode_command(device_id, command_id, specs, args, &self.config.frame)?;
        self.pending = None;
        write_request(&mut self.transport, &frame)?;
        Ok(())
    }

    /// True while a declared reply has not been read.
    pub fn awaiting_response(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.ret.is_some())
    }

    /// Read the next envelope for the pending call.
    pub(crate) fn take_response(&mut self) -> Result<Bytes> {
        self.pending = None;
        Ok(read_envelope(&mut self.transport, &self.config.frame)?)
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("devices", &self.schema.devices().len())
            .field("pending", &self.pending.as_ref().map(|p| (&p.device, &p.command)))
            .field("config", &self.config)
            .finish()
    }
}
