use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{parse_catalog, CommandDescriptor, DeviceDescriptor};
use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::types::TypeSpec;

/// One declared argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument name, when the server publishes one.
    pub name: Option<String>,
    /// Type string exactly as published.
    pub type_name: String,
    pub spec: TypeSpec,
}

/// A remotely invocable operation, addressed by (device id, command id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSchema {
    pub name: String,
    pub id: u16,
    pub args: Vec<ArgSpec>,
    /// Return type string exactly as published; `None` for void commands.
    pub ret_type: Option<String>,
    pub ret: Option<TypeSpec>,
}

impl CommandSchema {
    /// Number of arguments the command accepts.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Human-readable return type, `void` when the command returns nothing.
    pub fn ret_type_name(&self) -> &str {
        self.ret_type.as_deref().unwrap_or("void")
    }

    /// Argument type specs in declaration order.
    pub fn arg_specs(&self) -> Vec<TypeSpec> {
        self.args.iter().map(|arg| arg.spec.clone()).collect()
    }
}

/// A named group of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSchema {
    pub name: String,
    pub id: u16,
    pub commands: Vec<CommandSchema>,
    command_index: BTreeMap<String, usize>,
}

impl DeviceSchema {
    /// Look up a command by name.
    pub fn command(&self, name: &str) -> Option<&CommandSchema> {
        self.command_index.get(name).map(|&idx| &self.commands[idx])
    }
}

/// A command resolved against the catalog.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedCommand<'a> {
    pub device: &'a DeviceSchema,
    pub command: &'a CommandSchema,
}

impl ResolvedCommand<'_> {
    pub fn device_id(&self) -> u16 {
        self.device.id
    }

    pub fn command_id(&self) -> u16 {
        self.command.id
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.command.args
    }
}

/// Immutable lookup tables built once from the server's catalog.
///
/// Devices are kept in catalog order and addressed by name or id. The
/// table is read-only after construction and can be shared freely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaTable {
    devices: Vec<DeviceSchema>,
    device_index: BTreeMap<String, usize>,
    id_index: BTreeMap<u16, usize>,
}

impl SchemaTable {
    /// Build tables from a catalog JSON document with default config.
    pub fn load(document: &str) -> Result<Self> {
        Self::load_with_config(document, RegistryConfig::default())
    }

    /// Build tables from a catalog JSON document with explicit config.
    pub fn load_with_config(document: &str, config: RegistryConfig) -> Result<Self> {
        let descriptors = parse_catalog(document, config.validate_catalog)?;
        Self::from_descriptors(descriptors)
    }

    /// Build tables from already-deserialized descriptors.
    ///
    /// Every type string is parsed here, so an unsupported type fails the
    /// load rather than a later call.
    pub fn from_descriptors(descriptors: Vec<DeviceDescriptor>) -> Result<Self> {
        let mut table = Self::default();

        for descriptor in descriptors {
            let position = table.devices.len();
            if table.device_index.contains_key(&descriptor.name) {
                return Err(SchemaError::InvalidCatalog(format!(
                    "duplicate device name '{}'",
                    descriptor.name
                )));
            }
            if table.id_index.contains_key(&descriptor.id) {
                return Err(SchemaError::InvalidCatalog(format!(
                    "duplicate device id {} ('{}')",
                    descriptor.id, descriptor.name
                )));
            }

            let device = build_device(descriptor)?;
            table.device_index.insert(device.name.clone(), position);
            table.id_index.insert(device.id, position);
            table.devices.push(device);
        }

        debug!(
            devices = table.devices.len(),
            commands = table.command_count(),
            "command catalog loaded"
        );
        Ok(table)
    }

    /// Resolve a (device, command) name pair to ids and argument specs.
    ///
    /// An unknown name means the client and server disagree on the
    /// interface; it is never recoverable locally.
    pub fn resolve(&self, device: &str, command: &str) -> Result<ResolvedCommand<'_>> {
        let device_schema = self.device(device).ok_or_else(|| SchemaError::UnknownDevice {
            device: device.to_string(),
        })?;
        let command_schema =
            device_schema
                .command(command)
                .ok_or_else(|| SchemaError::UnknownCommand {
                    device: device.to_string(),
                    command: command.to_string(),
                })?;
        Ok(ResolvedCommand {
            device: device_schema,
            command: command_schema,
        })
    }

    /// Device id for a name.
    pub fn device_id(&self, name: &str) -> Option<u16> {
        self.device(name).map(|device| device.id)
    }

    /// Look up a device by name.
    pub fn device(&self, name: &str) -> Option<&DeviceSchema> {
        self.device_index.get(name).map(|&idx| &self.devices[idx])
    }

    /// Look up a device by server-assigned id.
    pub fn device_by_id(&self, id: u16) -> Option<&DeviceSchema> {
        self.id_index.get(&id).map(|&idx| &self.devices[idx])
    }

    /// Look up a command by device and command name.
    pub fn command(&self, device: &str, command: &str) -> Option<&CommandSchema> {
        self.device(device)?.command(command)
    }

    /// Devices in catalog order.
    pub fn devices(&self) -> &[DeviceSchema] {
        &self.devices
    }

    /// Total number of commands across all devices.
    pub fn command_count(&self) -> usize {
        self.devices.iter().map(|d| d.commands.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn build_device(descriptor: DeviceDescriptor) -> Result<DeviceSchema> {
    let mut commands = Vec::with_capacity(descriptor.commands.len());
    let mut command_index = BTreeMap::new();
    let mut seen_ids = BTreeMap::new();

    for command in descriptor.commands {
        if command_index.contains_key(&command.name) {
            return Err(SchemaError::InvalidCatalog(format!(
                "device '{}' declares command '{}' twice",
                descriptor.name, command.name
            )));
        }
        if let Some(previous) = seen_ids.insert(command.id, command.name.clone()) {
            return Err(SchemaError::InvalidCatalog(format!(
                "device '{}' assigns id {} to both '{}' and '{}'",
                descriptor.name, command.id, previous, command.name
            )));
        }

        command_index.insert(command.name.clone(), commands.len());
        commands.push(build_command(command)?);
    }

    Ok(DeviceSchema {
        name: descriptor.name,
        id: descriptor.id,
        commands,
        command_index,
    })
}

fn build_command(descriptor: CommandDescriptor) -> Result<CommandSchema> {
    let args = descriptor
        .args
        .into_iter()
        .map(|arg| {
            Ok(ArgSpec {
                spec: TypeSpec::parse(&arg.type_name)?,
                name: arg.name,
                type_name: arg.type_name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let ret_type = descriptor
        .ret_type
        .filter(|ret| !ret.trim().is_empty() && ret.trim() != "void");
    let ret = ret_type.as_deref().map(TypeSpec::parse).transpose()?;

    Ok(CommandSchema {
        name: descriptor.name,
        id: descriptor.id,
        args,
        ret_type,
        ret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayLen, ScalarKind};

    const CATALOG: &str = r#"[
        {"name": "KServer", "id": 1, "commands": [
            {"name": "get_cmds", "id": 1, "args": [], "ret_type": "std::string"}
        ]},
        {"name": "Common", "id": 2, "commands": [
            {"name": "set_led", "id": 0, "args": [{"type": "uint32_t", "name": "value"}], "ret_type": null},
            {"name": "get_led", "id": 1, "args": [], "ret_type": "uint32_t"},
            {"name": "get_float", "id": 2, "args": [], "ret_type": "float"}
        ]},
        {"name": "Oscillo", "id": 5, "commands": [
            {"name": "read_all", "id": 0, "args": [], "ret_type": "std::array<float, 8192>"},
            {"name": "set_dac", "id": 1, "args": [
                {"type": "std::vector<uint32_t>"}, {"type": "uint32_t"}
            ], "ret_type": "void"}
        ]}
    ]"#;

    #[test]
    fn builds_name_and_id_tables() {
        let table = SchemaTable::load(CATALOG).unwrap();

        assert_eq!(table.devices().len(), 3);
        assert_eq!(table.command_count(), 6);
        assert_eq!(table.device_id("Common"), Some(2));
        assert_eq!(table.device_by_id(5).unwrap().name, "Oscillo");

        let common = table.device("Common").unwrap();
        assert_eq!(common.command("get_led").unwrap().id, 1);
        assert_eq!(table.command("Common", "set_led").unwrap().arity(), 1);
        assert!(table.command("Common", "nope").is_none());
        assert_eq!(
            common.command("get_float").unwrap().ret,
            Some(TypeSpec::Scalar(ScalarKind::F32))
        );
    }

    #[test]
    fn resolve_returns_ids_and_arg_specs() {
        let table = SchemaTable::load(CATALOG).unwrap();
        let resolved = table.resolve("Oscillo", "set_dac").unwrap();

        assert_eq!(resolved.device_id(), 5);
        assert_eq!(resolved.command_id(), 1);
        assert_eq!(
            resolved.command.arg_specs(),
            vec![
                TypeSpec::Vector(ScalarKind::U32),
                TypeSpec::Scalar(ScalarKind::U32)
            ]
        );
        assert_eq!(resolved.command.ret, None, "void is no return type");
        assert_eq!(resolved.command.ret_type_name(), "void");
    }

    #[test]
    fn resolve_unknown_names_fail() {
        let table = SchemaTable::load(CATALOG).unwrap();

        let err = table.resolve("Missing", "get_led").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownDevice { ref device } if device == "Missing"));

        let err = table.resolve("Common", "missing").unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownCommand { ref device, ref command }
                if device == "Common" && command == "missing"
        ));
    }

    #[test]
    fn array_return_keeps_declared_length() {
        let table = SchemaTable::load(CATALOG).unwrap();
        let read_all = table.resolve("Oscillo", "read_all").unwrap().command;
        assert_eq!(
            read_all.ret,
            Some(TypeSpec::Array {
                elem: ScalarKind::F32,
                len: ArrayLen::Literal(8192),
            })
        );
        assert_eq!(read_all.ret_type.as_deref(), Some("std::array<float, 8192>"));
    }

    #[test]
    fn loading_is_deterministic() {
        let first = SchemaTable::load(CATALOG).unwrap();
        let second = SchemaTable::load(CATALOG).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn expression_array_lengths_load() {
        let table = SchemaTable::load(
            r#"[{"name":"Adc","id":3,"commands":[
                {"name":"get_led","id":0,"args":[],"ret_type":"uint32_t"},
                {"name":"get_data","id":1,"args":[],"ret_type":"std::array<float, 2*WFM_SIZE>"},
                {"name":"get_raw","id":2,"args":[],"ret_type":"const std::array<uint32_t, mem::adc_range/sizeof(uint32_t)>&"}
            ]}]"#,
        )
        .unwrap();

        assert_eq!(table.resolve("Adc", "get_led").unwrap().command_id(), 0);
        let get_data = table.resolve("Adc", "get_data").unwrap().command;
        assert_eq!(
            get_data.ret,
            Some(TypeSpec::Array {
                elem: ScalarKind::F32,
                len: ArrayLen::Named("2*WFM_SIZE".to_string()),
            })
        );
        let get_raw = table.resolve("Adc", "get_raw").unwrap().command;
        assert_eq!(
            get_raw.ret,
            Some(TypeSpec::Array {
                elem: ScalarKind::U32,
                len: ArrayLen::Named("mem::adc_range/sizeof(uint32_t)".to_string()),
            })
        );
    }

    #[test]
    fn unsupported_arg_type_fails_load() {
        let err = SchemaTable::load(
            r#"[{"name":"D","id":2,"commands":[{"name":"c","id":0,"args":[{"type":"std::map<int,int>"}],"ret_type":null}]}]"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, SchemaError::UnsupportedType { ref type_name } if type_name == "std::map<int,int>")
        );
    }

    #[test]
    fn unsupported_return_type_fails_load() {
        let err = SchemaTable::load(
            r#"[{"name":"D","id":2,"commands":[{"name":"c","id":0,"args":[],"ret_type":"Eigen::Matrix3f"}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { .. }));
    }

    #[test]
    fn duplicate_device_name_rejected() {
        let err = SchemaTable::load(
            r#"[{"name":"D","id":2,"commands":[]},{"name":"D","id":3,"commands":[]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCatalog(_)));
    }

    #[test]
    fn duplicate_device_id_rejected() {
        let err = SchemaTable::load(
            r#"[{"name":"A","id":2,"commands":[]},{"name":"B","id":2,"commands":[]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCatalog(_)));
    }

    #[test]
    fn duplicate_command_id_rejected() {
        let err = SchemaTable::load(
            r#"[{"name":"A","id":2,"commands":[{"name":"x","id":0},{"name":"y","id":0}]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCatalog(ref msg) if msg.contains("'x' and 'y'")));
    }
}
