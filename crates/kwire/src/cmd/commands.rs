use kwire_schema::{DeviceSchema, SchemaError, SchemaTable};
use serde::Serialize;

use crate::cmd::CommandsArgs;
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ArgRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "type")]
    type_name: &'a str,
}

#[derive(Serialize)]
struct CommandRow<'a> {
    device: &'a str,
    device_id: u16,
    id: u16,
    name: &'a str,
    args: Vec<ArgRow<'a>>,
    ret_type: &'a str,
}

impl CommandRow<'_> {
    fn signature(&self) -> String {
        self.args
            .iter()
            .map(|arg| match arg.name {
                Some(name) => format!("{} {name}", arg.type_name),
                None => arg.type_name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn run(args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let client = args.server.connect()?;
    let devices = select_devices(client.schema(), args.device.as_deref())
        .map_err(|err| schema_error("commands failed", err))?;

    let rows: Vec<CommandRow<'_>> = devices.into_iter().flat_map(command_rows).collect();
    print_commands(&rows, format);
    Ok(SUCCESS)
}

fn select_devices<'a>(
    schema: &'a SchemaTable,
    device: Option<&str>,
) -> Result<Vec<&'a DeviceSchema>, SchemaError> {
    match device {
        Some(name) => schema
            .device(name)
            .map(|device| vec![device])
            .ok_or_else(|| SchemaError::UnknownDevice {
                device: name.to_string(),
            }),
        None => Ok(schema.devices().iter().collect()),
    }
}

fn command_rows(device: &DeviceSchema) -> Vec<CommandRow<'_>> {
    device
        .commands
        .iter()
        .map(|command| CommandRow {
            device: &device.name,
            device_id: device.id,
            id: command.id,
            name: &command.name,
            args: command
                .args
                .iter()
                .map(|arg| ArgRow {
                    name: arg.name.as_deref(),
                    type_name: &arg.type_name,
                })
                .collect(),
            ret_type: command.ret_type_name(),
        })
        .collect()
}

fn print_commands(rows: &[CommandRow<'_>], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => print_table(
            &["DEVICE", "ID", "COMMAND", "ARGS", "RETURNS"],
            rows.iter()
                .map(|row| {
                    vec![
                        format!("{} ({})", row.device, row.device_id),
                        row.id.to_string(),
                        row.name.to_string(),
                        row.signature(),
                        row.ret_type.to_string(),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty => {
            let mut current = None;
            for row in rows {
                if current != Some(row.device) {
                    println!("{} ({})", row.device, row.device_id);
                    current = Some(row.device);
                }
                println!(
                    "  {:>3}  {} {}({})",
                    row.id,
                    row.ret_type,
                    row.name,
                    row.signature()
                );
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}::{}", row.device, row.name);
            }
        }
    }
}
