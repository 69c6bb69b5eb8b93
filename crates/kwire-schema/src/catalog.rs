//! Raw catalog document as published by the server's bootstrap command.

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// JSON Schema every catalog document must satisfy.
const CATALOG_SCHEMA: &str = r#"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "array",
    "items": {
        "type": "object",
        "required": ["name", "id", "commands"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "id": { "type": "integer", "minimum": 0, "maximum": 65535 },
            "commands": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "id"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "id": { "type": "integer", "minimum": 0, "maximum": 65535 },
                        "args": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["type"],
                                "properties": {
                                    "type": { "type": "string" },
                                    "name": { "type": "string" }
                                }
                            }
                        },
                        "ret_type": { "type": ["string", "null"] }
                    }
                }
            }
        }
    }
}"#;

/// One device entry of the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub name: String,
    pub id: u16,
    #[serde(default)]
    pub commands: Vec<CommandDescriptor>,
}

/// One command entry of a device descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub id: u16,
    #[serde(default)]
    pub args: Vec<ArgDescriptor>,
    #[serde(default)]
    pub ret_type: Option<String>,
}

/// One argument entry of a command descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Parse a catalog document, optionally checking it against [`CATALOG_SCHEMA`] first.
pub fn parse_catalog(document: &str, validate: bool) -> Result<Vec<DeviceDescriptor>> {
    let value: Value = serde_json::from_str(document)?;
    if validate {
        validate_catalog(&value)?;
    }
    Ok(serde_json::from_value(value)?)
}

fn validate_catalog(value: &Value) -> Result<()> {
    let validator = catalog_validator()?;

    let mut errors = validator.iter_errors(value);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(3) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::InvalidCatalog(message));
    }

    Ok(())
}

fn catalog_validator() -> Result<Validator> {
    let schema: Value = serde_json::from_str(CATALOG_SCHEMA)?;
    jsonschema::validator_for(&schema).map_err(|err| SchemaError::InvalidCatalog(err.to_string()))
}
