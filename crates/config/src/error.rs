//! Error types for configuration loading.

use crate::variant::SystemVariant;
use std::path::PathBuf;
use thiserror::Error;

/// Errors when loading or interpreting a configuration source file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file is not valid TOML for the expected schema.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The selected system has no Hamiltonian block in `inham.toml`.
    #[error("No Hamiltonian block for system {system} in inham.toml")]
    MissingHamiltonian { system: SystemVariant },
}
