use kwire_schema::SchemaTable;
use serde::Serialize;

use crate::cmd::DevicesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct DeviceRow<'a> {
    id: u16,
    name: &'a str,
    commands: usize,
}

pub fn run(args: DevicesArgs, format: OutputFormat) -> CliResult<i32> {
    let client = args.server.connect()?;
    print_devices(client.schema(), format);
    Ok(SUCCESS)
}

fn print_devices(schema: &SchemaTable, format: OutputFormat) {
    let rows: Vec<DeviceRow<'_>> = schema
        .devices()
        .iter()
        .map(|device| DeviceRow {
            id: device.id,
            name: &device.name,
            commands: device.commands.len(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => print_table(
            &["ID", "DEVICE", "COMMANDS"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.id.to_string(),
                        row.name.to_string(),
                        row.commands.to_string(),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Pretty => {
            for row in &rows {
                println!("{:>3}  {} ({} commands)", row.id, row.name, row.commands);
            }
        }
        OutputFormat::Raw => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }
}
