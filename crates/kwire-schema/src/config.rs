/// Controls how a command catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, the raw document is checked against the embedded catalog
    /// JSON Schema before tables are built.
    pub validate_catalog: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            validate_catalog: true,
        }
    }
}
