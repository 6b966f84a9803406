//! Engine build dispatch.
//!
//! The compute engine is compiled from source with a host-specific make
//! recipe. The dispatcher stages the right recipe as `Makefile`, runs the
//! build, and hands the resulting binary to the workspace. Any build
//! problem is fatal: no run folder is populated past a failed build.

use crate::host::HostKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::info;

/// Name of the engine executable produced by the build.
pub const ENGINE_BINARY: &str = "MCE.exe";

/// Make recipe for the cluster toolchain.
const CLUSTER_RECIPE: &str = "makefile_arc";
/// Make recipe for the local workstation toolchain.
const LOCAL_RECIPE: &str = "makefile_chmlin";

/// Builds the engine in its source directory.
#[derive(Debug)]
pub struct BuildDispatcher {
    build_dir: PathBuf,
    host: HostKind,
    make_program: OsString,
}

impl BuildDispatcher {
    /// Create a dispatcher for the given build directory and host.
    pub fn new(build_dir: impl Into<PathBuf>, host: HostKind) -> Self {
        Self {
            build_dir: build_dir.into(),
            host,
            make_program: OsString::from("make"),
        }
    }

    /// Override the build command. Used by tests to stand in for `make`.
    pub fn with_make_program(mut self, program: impl Into<OsString>) -> Self {
        self.make_program = program.into();
        self
    }

    /// The recipe file selected for this host.
    pub fn recipe_name(&self) -> &'static str {
        match self.host {
            HostKind::Cluster => CLUSTER_RECIPE,
            HostKind::Local => LOCAL_RECIPE,
        }
    }

    /// Stage the host's recipe as `Makefile`, run the build, and return
    /// the path of the produced engine binary.
    pub fn build(&self) -> Result<PathBuf, BuildError> {
        let recipe = self.build_dir.join(self.recipe_name());
        if !recipe.is_file() {
            return Err(BuildError::MissingRecipe { path: recipe });
        }

        let makefile = self.build_dir.join("Makefile");
        std::fs::copy(&recipe, &makefile).map_err(|source| BuildError::Io {
            path: makefile.clone(),
            source,
        })?;

        info!(recipe = self.recipe_name(), "building engine");
        let status = Command::new(&self.make_program)
            .current_dir(&self.build_dir)
            .status()
            .map_err(|source| BuildError::Spawn {
                program: self.make_program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(BuildError::Failed {
                code: status.code(),
            });
        }

        let binary = self.build_dir.join(ENGINE_BINARY);
        if !binary.is_file() {
            return Err(BuildError::MissingBinary { path: binary });
        }
        info!(binary = %binary.display(), "engine built");
        Ok(binary)
    }
}

/// Copy the built engine into the workspace root.
pub fn stage_engine(binary: &Path, workspace_root: &Path) -> Result<PathBuf, BuildError> {
    let staged = workspace_root.join(ENGINE_BINARY);
    std::fs::copy(binary, &staged).map_err(|source| BuildError::Io {
        path: staged.clone(),
        source,
    })?;
    Ok(staged)
}

/// Errors during engine build and staging.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The host's make recipe is not in the build directory.
    #[error("Build recipe {path} not found")]
    MissingRecipe { path: PathBuf },

    /// The build command could not be started.
    #[error("Failed to run {program:?}: {source}")]
    Spawn {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    /// The build command exited non-zero.
    #[error("Engine build failed with exit code {code:?}")]
    Failed { code: Option<i32> },

    /// The build succeeded but produced no engine binary.
    #[error("Build completed but {path} was not produced")]
    MissingBinary { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Build I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn test_recipe_selection_follows_host() {
        assert_eq!(
            BuildDispatcher::new("build", HostKind::Cluster).recipe_name(),
            "makefile_arc"
        );
        assert_eq!(
            BuildDispatcher::new("build", HostKind::Local).recipe_name(),
            "makefile_chmlin"
        );
    }

    #[test]
    fn test_missing_recipe_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = BuildDispatcher::new(dir.path(), HostKind::Local).build();
        assert!(matches!(result, Err(BuildError::MissingRecipe { .. })));
    }

    #[test]
    fn test_successful_build_stages_recipe_and_finds_binary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("makefile_chmlin"), "# local recipe\n").unwrap();
        let fake_make = dir.path().join("fake-make");
        write_script(&fake_make, "touch MCE.exe");

        let binary = BuildDispatcher::new(dir.path(), HostKind::Local)
            .with_make_program(&fake_make)
            .build()
            .unwrap();

        assert_eq!(binary, dir.path().join("MCE.exe"));
        // The selected recipe was staged as the canonical Makefile.
        let makefile = std::fs::read_to_string(dir.path().join("Makefile")).unwrap();
        assert_eq!(makefile, "# local recipe\n");
    }

    #[test]
    fn test_failed_build_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("makefile_chmlin"), "").unwrap();
        let fake_make = dir.path().join("fake-make");
        write_script(&fake_make, "exit 2");

        let result = BuildDispatcher::new(dir.path(), HostKind::Local)
            .with_make_program(&fake_make)
            .build();

        assert!(matches!(result, Err(BuildError::Failed { code: Some(2) })));
    }

    #[test]
    fn test_build_without_binary_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("makefile_chmlin"), "").unwrap();
        let fake_make = dir.path().join("fake-make");
        write_script(&fake_make, "true");

        let result = BuildDispatcher::new(dir.path(), HostKind::Local)
            .with_make_program(&fake_make)
            .build();

        assert!(matches!(result, Err(BuildError::MissingBinary { .. })));
    }
}
