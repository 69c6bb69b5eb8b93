use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use kwire_client::{Client, ClientConfig, Endpoint, DEFAULT_PORT};
use tracing::debug;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod commands;
pub mod devices;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the devices a server exposes.
    Devices(DevicesArgs),
    /// List commands with their argument and return types.
    Commands(CommandsArgs),
    /// Invoke a command and print its reply.
    Call(CallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Devices(args) => devices::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where to reach the command server.
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Server host address.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,
    /// Server TCP port.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Unix socket path of a local server. Takes precedence over --host.
    #[arg(long, env = "UNIX_SOCK", value_name = "PATH")]
    pub unixsock: Option<PathBuf>,
    /// Read and write timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

impl ServerArgs {
    pub fn endpoint(&self) -> CliResult<Endpoint> {
        if let Some(path) = &self.unixsock {
            return Ok(Endpoint::Unix(path.clone()));
        }
        match &self.host {
            Some(host) if !host.is_empty() => Ok(Endpoint::Tcp {
                host: host.clone(),
                port: self.port,
            }),
            _ => Err(CliError::new(
                USAGE,
                "no server address: pass --host or --unixsock",
            )),
        }
    }

    pub fn connect(&self) -> CliResult<Client> {
        let endpoint = self.endpoint()?;
        let timeout = parse_timeout(&self.timeout)?;

        let mut config = ClientConfig::default();
        config.transport.read_timeout = Some(timeout);
        config.transport.write_timeout = Some(timeout);

        debug!(%endpoint, ?timeout, "connecting");
        Client::connect_with_config(&endpoint, config)
            .map_err(|err| client_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct DevicesArgs {
    #[command(flatten)]
    pub server: ServerArgs,
}

#[derive(Args, Debug)]
pub struct CommandsArgs {
    #[command(flatten)]
    pub server: ServerArgs,
    /// Only list commands of this device.
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub server: ServerArgs,
    /// Device name.
    pub device: String,
    /// Command name.
    pub command: String,
    /// Arguments in declaration order. Arrays and vectors are
    /// comma-separated (e.g. 1,2,3).
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid timeout value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
