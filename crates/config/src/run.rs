//! Run settings: topology and launch switches.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Settings for one batch invocation, read from `run.toml`.
///
/// These are the per-run knobs the operator edits between submissions;
/// everything physical lives in `inputs.toml` and `inham.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct RunSettings {
    /// Total number of simulation repeats across all folders.
    pub repeats: u32,

    /// Number of run folders ("nodes") to spread the repeats over.
    pub nodes: u32,

    /// Threads granted to each engine process ("cores", max 8).
    pub cores: u32,

    /// Run-folder discriminator. The literal `"default"` requests a
    /// generated random discriminator instead.
    #[serde(default = "default_runfolder")]
    pub runfolder: String,

    /// Whether the engine should generate a fresh basis set.
    #[serde(default = "default_true")]
    pub generate_basis: bool,

    /// Whether the engine should propagate the basis set.
    #[serde(default = "default_true")]
    pub propagate: bool,

    /// Restart a timed-out run. Not supported by this launcher; setting
    /// it is rejected at the entry point.
    #[serde(default)]
    pub restart: bool,
}

fn default_runfolder() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

impl RunSettings {
    /// Load settings from a `run.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the operator left the folder name to be generated.
    pub fn wants_generated_discriminator(&self) -> bool {
        self.runfolder == "default"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_settings() {
        let settings: RunSettings = toml::from_str(
            r#"
            repeats = 40
            nodes = 1
            cores = 4
            "#,
        )
        .unwrap();

        assert_eq!(settings.repeats, 40);
        assert_eq!(settings.nodes, 1);
        assert_eq!(settings.cores, 4);
        assert!(settings.wants_generated_discriminator());
        assert!(settings.generate_basis);
        assert!(settings.propagate);
        assert!(!settings.restart);
    }

    #[test]
    fn test_explicit_runfolder_label() {
        let settings: RunSettings = toml::from_str(
            r#"
            repeats = 8
            nodes = 2
            cores = 2
            runfolder = "t2"
            "#,
        )
        .unwrap();

        assert_eq!(settings.runfolder, "t2");
        assert!(!settings.wants_generated_discriminator());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "repeats = 16\nnodes = 2\ncores = 2\n").unwrap();

        let settings = RunSettings::load(&path).unwrap();
        assert_eq!(settings.repeats, 16);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RunSettings::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
