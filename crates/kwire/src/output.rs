use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kwire_frame::{Elements, Value};
use serde::Serialize;
use serde_json::{json, Number};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_table(header: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// JSON rendering of a decoded reply. Non-finite floats become `null`.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::U8(v) => json!(v),
        Value::I8(v) => json!(v),
        Value::U16(v) => json!(v),
        Value::I16(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::U64(v) => json!(v),
        Value::I64(v) => json!(v),
        Value::F32(v) => float(f64::from(*v)),
        Value::F64(v) => float(*v),
        Value::Bool(v) => json!(v),
        Value::Str(v) => json!(v),
        Value::Buffer(elements) => elements_to_json(elements),
        Value::Tuple(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

fn elements_to_json(elements: &Elements) -> serde_json::Value {
    match elements {
        Elements::U8(v) => json!(v),
        Elements::I8(v) => json!(v),
        Elements::U16(v) => json!(v),
        Elements::I16(v) => json!(v),
        Elements::U32(v) => json!(v),
        Elements::I32(v) => json!(v),
        Elements::U64(v) => json!(v),
        Elements::I64(v) => json!(v),
        Elements::F32(v) => v.iter().map(|x| float(f64::from(*x))).collect(),
        Elements::F64(v) => v.iter().map(|x| float(*x)).collect(),
    }
}

fn float(v: f64) -> serde_json::Value {
    Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
