//! Workspace construction.
//!
//! A workspace is the on-disk tree for one batch: the run-folder name under
//! the resolved root, a snapshot of the config source files, and one run
//! folder per pipeline instance and node index.

use mcebatch_config::{MethodInstance, MethodVariant, SystemVariant};
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// How to resolve a pre-existing workspace directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Ask on stdin; anything other than `y` aborts. The historical
    /// interactive behaviour.
    Ask,
    /// Remove the existing tree without asking (`--force`).
    Force,
    /// Abort without asking. Safe default for non-interactive use.
    Never,
}

/// One run folder, the unit of work the engine executes in.
#[derive(Clone, Debug)]
pub struct RunFolder {
    /// The pipeline instance this folder belongs to.
    pub instance: MethodInstance,
    /// 1-based node index within the instance.
    pub index: u32,
    /// Absolute or root-relative path of the folder.
    pub path: PathBuf,
}

/// A fully constructed workspace tree.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// Root of the tree, `<scratch>/<name>`.
    pub root: PathBuf,
    /// Run folders in creation order: instance-major, then node index.
    pub run_folders: Vec<RunFolder>,
}

/// Compose the workspace name: `<method>-<system>-<discriminator>`.
pub fn workspace_name(method: MethodVariant, system: SystemVariant, discriminator: &str) -> String {
    format!("{}-{}-{}", method, system, discriminator)
}

/// Generate a random five-digit discriminator, used when the operator
/// leaves the folder label at `default`.
pub fn generated_discriminator() -> String {
    rand::thread_rng().gen_range(10_000..100_000u32).to_string()
}

/// Create the workspace tree at `scratch/name`.
///
/// Copies `sources` (the config source files, for later reproducibility)
/// into the root and creates one empty run folder per instance and node.
/// A pre-existing tree is handled per `policy`; declining leaves it
/// untouched.
pub fn create(
    scratch: &Path,
    name: &str,
    method: MethodVariant,
    nodes: u32,
    sources: &[PathBuf],
    policy: OverwritePolicy,
) -> Result<Workspace, WorkspaceError> {
    std::fs::create_dir_all(scratch).map_err(|source| WorkspaceError::Io {
        path: scratch.to_path_buf(),
        source,
    })?;

    let root = scratch.join(name);
    if root.exists() {
        if !may_overwrite(&root, policy)? {
            return Err(WorkspaceError::AlreadyExists { path: root });
        }
        std::fs::remove_dir_all(&root).map_err(|source| WorkspaceError::Io {
            path: root.clone(),
            source,
        })?;
        info!(path = %root.display(), "removed existing workspace");
    }

    std::fs::create_dir(&root).map_err(|source| WorkspaceError::Io {
        path: root.clone(),
        source,
    })?;

    for source_path in sources {
        let file_name = source_path
            .file_name()
            .ok_or_else(|| WorkspaceError::MissingSource {
                path: source_path.clone(),
            })?;
        std::fs::copy(source_path, root.join(file_name)).map_err(|source| {
            WorkspaceError::Io {
                path: source_path.clone(),
                source,
            }
        })?;
    }

    let mut run_folders = Vec::new();
    for instance in method.instances() {
        let instance_root = match instance.subdir {
            Some(subdir) => {
                let dir = root.join(subdir);
                std::fs::create_dir(&dir).map_err(|source| WorkspaceError::Io {
                    path: dir.clone(),
                    source,
                })?;
                dir
            }
            None => root.clone(),
        };
        for index in 1..=nodes {
            let path = instance_root.join(format!("run-{}", index));
            std::fs::create_dir(&path).map_err(|source| WorkspaceError::Io {
                path: path.clone(),
                source,
            })?;
            run_folders.push(RunFolder {
                instance,
                index,
                path,
            });
        }
    }

    info!(
        root = %root.display(),
        folders = run_folders.len(),
        "workspace created"
    );
    Ok(Workspace { root, run_folders })
}

/// Decide whether an existing tree may be destroyed.
fn may_overwrite(root: &Path, policy: OverwritePolicy) -> Result<bool, WorkspaceError> {
    match policy {
        OverwritePolicy::Force => Ok(true),
        OverwritePolicy::Never => Ok(false),
        OverwritePolicy::Ask => ask_overwrite(root),
    }
}

/// Interactive confirmation for destructive recreation.
fn ask_overwrite(root: &Path) -> Result<bool, WorkspaceError> {
    print!(
        "Workspace {} already exists. Delete it? y/n\n> ",
        root.display()
    );
    std::io::stdout()
        .flush()
        .map_err(|source| WorkspaceError::Io {
            path: root.to_path_buf(),
            source,
        })?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .map_err(|source| WorkspaceError::Io {
            path: root.to_path_buf(),
            source,
        })?;
    Ok(answer.trim() == "y")
}

/// Errors during workspace construction.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The target directory exists and overwriting was declined.
    #[error(
        "Workspace {path} already exists. Change the runfolder name, \
         move it aside, or pass --force"
    )]
    AlreadyExists { path: PathBuf },

    /// A config source file path has no file name component.
    #[error("Config source {path} is not a file")]
    MissingSource { path: PathBuf },

    /// Filesystem operation failed.
    #[error("Workspace I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
