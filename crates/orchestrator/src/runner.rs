//! Execution driver.
//!
//! Stages the engine binary and record file into every run folder, then
//! launches the engine folder by folder. Dispatch is strictly sequential:
//! one engine process runs to completion before the next folder starts.
//! The "parallel cores" of the topology refer to threading inside each
//! engine process, granted through `OMP_NUM_THREADS`; cross-folder
//! fan-out is a deliberate non-feature of this launcher.

use crate::build::ENGINE_BINARY;
use crate::record::RECORD_FILENAME;
use crate::workspace::Workspace;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::{error, info};

/// Environment variable granting the engine its thread count.
pub const THREAD_ENV_VAR: &str = "OMP_NUM_THREADS";

/// Outcome of one folder's engine run.
#[derive(Clone, Debug)]
pub struct FolderReport {
    /// Method label of the folder's pipeline instance.
    pub label: String,
    /// The folder the engine ran in.
    pub folder: PathBuf,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Whether the engine exited successfully.
    pub success: bool,
}

/// Runs the engine across a workspace's run folders.
#[derive(Debug)]
pub struct ExecutionDriver<'a> {
    workspace: &'a Workspace,
    cores: u32,
    halt_on_failure: bool,
}

impl<'a> ExecutionDriver<'a> {
    /// Create a driver for a prepared workspace.
    pub fn new(workspace: &'a Workspace, cores: u32) -> Self {
        Self {
            workspace,
            cores,
            halt_on_failure: false,
        }
    }

    /// Stop the batch at the first failed engine run instead of logging
    /// the failure and continuing.
    pub fn with_halt_on_failure(mut self, halt: bool) -> Self {
        self.halt_on_failure = halt;
        self
    }

    /// Copy the engine binary and each instance's record file into every
    /// run folder.
    ///
    /// The record arrives under the fixed name the engine probes for,
    /// regardless of which instance it came from.
    pub fn stage(&self) -> Result<(), RunError> {
        let engine = self.workspace.root.join(ENGINE_BINARY);
        for folder in &self.workspace.run_folders {
            let record = self.workspace.root.join(folder.instance.record_name);
            std::fs::copy(&engine, folder.path.join(ENGINE_BINARY)).map_err(|source| {
                RunError::Stage {
                    path: folder.path.clone(),
                    source,
                }
            })?;
            std::fs::copy(&record, folder.path.join(RECORD_FILENAME)).map_err(|source| {
                RunError::Stage {
                    path: folder.path.clone(),
                    source,
                }
            })?;
        }
        info!(
            folders = self.workspace.run_folders.len(),
            "staged engine and records"
        );
        Ok(())
    }

    /// Run the engine in every folder, in creation order, waiting for
    /// each process before starting the next.
    ///
    /// Failures are captured per folder; by default the batch continues
    /// past them.
    pub fn run(&self) -> Result<Vec<FolderReport>, RunError> {
        let mut reports = Vec::with_capacity(self.workspace.run_folders.len());
        for folder in &self.workspace.run_folders {
            info!(
                folder = %folder.path.display(),
                label = folder.instance.label,
                "launching engine"
            );

            // Full path to the staged binary; relative program paths
            // interact with `current_dir` in a platform-specific way.
            let mut command = Command::new(folder.path.join(ENGINE_BINARY));
            command.current_dir(&folder.path);
            if self.cores > 1 {
                command.env(THREAD_ENV_VAR, self.cores.to_string());
            }

            let status = command.status().map_err(|source| RunError::Spawn {
                folder: folder.path.clone(),
                source,
            })?;

            let report = FolderReport {
                label: folder.instance.label.to_string(),
                folder: folder.path.clone(),
                exit_code: status.code(),
                success: status.success(),
            };

            if !report.success {
                error!(
                    folder = %folder.path.display(),
                    code = ?report.exit_code,
                    "engine run failed"
                );
                if self.halt_on_failure {
                    return Err(RunError::EngineFailed {
                        folder: folder.path.clone(),
                        code: report.exit_code,
                    });
                }
            }
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Errors during staging and execution.
#[derive(Debug, Error)]
pub enum RunError {
    /// Copying the engine or record into a folder failed.
    #[error("Failed to stage run folder {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine process could not be started.
    #[error("Failed to launch engine in {folder}: {source}")]
    Spawn {
        folder: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An engine run failed and halt-on-failure is set.
    #[error("Engine run in {folder} failed with exit code {code:?}")]
    EngineFailed {
        folder: PathBuf,
        code: Option<i32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::{create, OverwritePolicy};
    use mcebatch_config::MethodVariant;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn stage_fake_engine(root: &Path, body: &str) {
        let engine = root.join(ENGINE_BINARY);
        std::fs::write(&engine, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&engine).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&engine, perms).unwrap();
    }

    fn prepared_workspace(
        scratch: &Path,
        method: MethodVariant,
        nodes: u32,
        engine_body: &str,
    ) -> Workspace {
        let name = format!("{}-SB-test", method);
        let workspace = create(scratch, &name, method, nodes, &[], OverwritePolicy::Never)
            .unwrap();
        stage_fake_engine(&workspace.root, engine_body);
        for instance in method.instances() {
            std::fs::write(
                workspace.root.join(instance.record_name),
                format!("control,{}\n", instance.label),
            )
            .unwrap();
        }
        workspace
    }

    #[test]
    fn test_staging_copies_engine_and_record_bytes() {
        let scratch = tempfile::tempdir().unwrap();
        let workspace = prepared_workspace(scratch.path(), MethodVariant::Mce12, 2, "true");

        ExecutionDriver::new(&workspace, 1).stage().unwrap();

        for folder in &workspace.run_folders {
            assert!(folder.path.join(ENGINE_BINARY).is_file());
            let staged = std::fs::read(folder.path.join(RECORD_FILENAME)).unwrap();
            let original = std::fs::read(
                workspace.root.join(folder.instance.record_name),
            )
            .unwrap();
            assert_eq!(staged, original, "record bytes must match the root copy");
        }
    }

    #[test]
    fn test_runs_are_sequential_in_creation_order() {
        let scratch = tempfile::tempdir().unwrap();
        // Each run appends its folder name to a shared log two levels up.
        let workspace = prepared_workspace(
            scratch.path(),
            MethodVariant::Mce12,
            2,
            "echo \"$(basename $(dirname $(pwd)))/$(basename $(pwd))\" >> ../../order.log",
        );
        let driver = ExecutionDriver::new(&workspace, 1);
        driver.stage().unwrap();

        let reports = driver.run().unwrap();
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(|r| r.success));

        let log = std::fs::read_to_string(workspace.root.join("order.log")).unwrap();
        let order: Vec<_> = log.lines().collect();
        assert_eq!(
            order,
            vec!["MCEv1/run-1", "MCEv1/run-2", "MCEv2/run-1", "MCEv2/run-2"]
        );
    }

    #[test]
    fn test_thread_count_env_set_only_for_multicore() {
        let scratch = tempfile::tempdir().unwrap();
        let workspace = prepared_workspace(
            scratch.path(),
            MethodVariant::Ccs,
            1,
            "echo \"${OMP_NUM_THREADS:-unset}\" > omp.txt",
        );

        let driver = ExecutionDriver::new(&workspace, 1);
        driver.stage().unwrap();
        driver.run().unwrap();
        let single = std::fs::read_to_string(workspace.run_folders[0].path.join("omp.txt"))
            .unwrap();
        assert_eq!(single.trim(), "unset");

        let driver = ExecutionDriver::new(&workspace, 4);
        driver.run().unwrap();
        let multi = std::fs::read_to_string(workspace.run_folders[0].path.join("omp.txt"))
            .unwrap();
        assert_eq!(multi.trim(), "4");
    }

    #[test]
    fn test_failure_is_reported_but_batch_continues() {
        let scratch = tempfile::tempdir().unwrap();
        let workspace = prepared_workspace(
            scratch.path(),
            MethodVariant::Ccs,
            2,
            "if [ \"$(basename $(pwd))\" = \"run-1\" ]; then exit 3; fi",
        );
        let driver = ExecutionDriver::new(&workspace, 1);
        driver.stage().unwrap();

        let reports = driver.run().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].success);
        assert_eq!(reports[0].exit_code, Some(3));
        assert!(reports[1].success);
    }

    #[test]
    fn test_halt_on_failure_stops_the_batch() {
        let scratch = tempfile::tempdir().unwrap();
        let workspace = prepared_workspace(
            scratch.path(),
            MethodVariant::Ccs,
            2,
            "if [ \"$(basename $(pwd))\" = \"run-1\" ]; then exit 3; fi; touch ran.txt",
        );
        let driver = ExecutionDriver::new(&workspace, 1).with_halt_on_failure(true);
        driver.stage().unwrap();

        let result = driver.run();
        assert!(matches!(
            result,
            Err(RunError::EngineFailed { code: Some(3), .. })
        ));
        // The second folder never ran.
        assert!(!workspace.run_folders[1].path.join("ran.txt").exists());
    }
}
