mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "kwire", version, about = "Command server client CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_device_filter() {
        let cli = Cli::try_parse_from([
            "kwire",
            "commands",
            "--host",
            "192.168.1.100",
            "--device",
            "Oscillo",
        ])
        .expect("commands args should parse");

        match cli.command {
            Command::Commands(args) => {
                assert_eq!(args.device.as_deref(), Some("Oscillo"));
                assert_eq!(args.server.host.as_deref(), Some("192.168.1.100"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_call_with_negative_argument() {
        let cli = Cli::try_parse_from([
            "kwire",
            "call",
            "--unixsock",
            "/tmp/k.sock",
            "Oscillo",
            "set_offset",
            "-2",
            "0.5",
        ])
        .expect("call args should parse");

        match cli.command {
            Command::Call(args) => {
                assert_eq!(args.device, "Oscillo");
                assert_eq!(args.command, "set_offset");
                assert_eq!(args.args, ["-2", "0.5"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = Cli::try_parse_from(["kwire", "devices", "--port", "http"])
            .expect_err("port must be numeric");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
