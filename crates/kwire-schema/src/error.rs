/// Errors that can occur while loading or querying the command catalog.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A type string uses a constructor or keyword the codec does not know.
    #[error("unsupported type: {type_name}")]
    UnsupportedType { type_name: String },

    /// No device with this name exists in the catalog.
    #[error("unknown device '{device}'")]
    UnknownDevice { device: String },

    /// The device exists but has no command with this name.
    #[error("device '{device}' has no command '{command}'")]
    UnknownCommand { device: String, command: String },

    /// The catalog document is well-formed JSON but structurally invalid.
    #[error("invalid command catalog: {0}")]
    InvalidCatalog(String),

    /// The catalog document is not valid JSON.
    #[error("command catalog is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
