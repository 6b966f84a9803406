//! MCE batch-run orchestrator.
//!
//! Prepares and launches a batch of repeated runs of the MCE/CCS compute
//! engine: validates the run topology, builds a reproducible workspace of
//! run folders, serializes the engine's record file(s), compiles the
//! engine with the host's make recipe, and dispatches it folder by folder.
//!
//! # Pipeline
//!
//! ```text
//! validate topology -> resolve host -> build workspace
//!     -> write records -> build engine -> stage + run
//! ```
//!
//! Everything up to the first engine launch is exclusively owned by the
//! orchestrator; after launch each run folder is shared with its engine
//! process, which writes its result files there.

pub mod build;
pub mod host;
pub mod record;
pub mod runner;
pub mod topology;
pub mod workspace;

pub use build::{stage_engine, BuildDispatcher, BuildError, ENGINE_BINARY};
pub use host::{current_user, HostError, HostKind};
pub use record::{write_records, ControlRow, RecordError, RECORD_FILENAME};
pub use runner::{ExecutionDriver, FolderReport, RunError, THREAD_ENV_VAR};
pub use topology::{RunTopology, ValidationError};
pub use workspace::{OverwritePolicy, RunFolder, Workspace, WorkspaceError};

use mcebatch_config::{ConfigError, HamiltonianConfig, RunSettings, SimulationConfig};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Options for one orchestrated launch.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    /// Directory holding `run.toml`, `inputs.toml` and `inham.toml`.
    pub config_dir: PathBuf,
    /// Directory holding the engine sources and make recipes.
    pub build_dir: PathBuf,
    /// Parent of the local `EXEC` root (ignored on the cluster).
    pub exec_base: PathBuf,
    /// How to resolve a pre-existing workspace.
    pub overwrite: OverwritePolicy,
    /// Stop the batch at the first failed engine run.
    pub halt_on_failure: bool,
}

impl LaunchOptions {
    /// Options with the conventional directory layout rooted at `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.join("config"),
            build_dir: base.join("build"),
            exec_base: base.join(".."),
            overwrite: OverwritePolicy::Ask,
            halt_on_failure: false,
        }
    }
}

/// Run the whole pipeline: validate, prepare, build, dispatch.
///
/// Returns one report per run folder, in dispatch order.
pub fn launch(options: &LaunchOptions) -> Result<Vec<FolderReport>, LaunchError> {
    let settings = RunSettings::load(&options.config_dir.join("run.toml"))?;
    let inputs = SimulationConfig::load(&options.config_dir.join("inputs.toml"))?;
    let inham = HamiltonianConfig::load(&options.config_dir.join("inham.toml"))?;

    if settings.restart {
        return Err(LaunchError::RestartUnsupported);
    }

    let topology = RunTopology::from_settings(&settings);
    topology.validate(inputs.conjugate_repeats)?;
    info!(
        repeats = topology.repeats,
        nodes = topology.nodes,
        cores = topology.cores,
        "arguments checked"
    );

    let host = HostKind::detect();
    host.load_environment_modules();
    let user = if host.is_cluster() {
        current_user()?
    } else {
        String::new()
    };
    let scratch = host.scratch_root(&options.exec_base, &user);

    let discriminator = if settings.wants_generated_discriminator() {
        workspace::generated_discriminator()
    } else {
        settings.runfolder.clone()
    };
    let name = workspace::workspace_name(inputs.method, inputs.system_variant(), &discriminator);

    let sources = vec![
        options.config_dir.join("run.toml"),
        options.config_dir.join("inputs.toml"),
        options.config_dir.join("inham.toml"),
    ];
    let workspace = workspace::create(
        &scratch,
        &name,
        inputs.method,
        topology.nodes,
        &sources,
        options.overwrite,
    )?;

    record::write_records(&workspace.root, &settings, &inputs, &inham, &topology)?;

    let binary = BuildDispatcher::new(&options.build_dir, host).build()?;
    stage_engine(&binary, &workspace.root)?;

    let driver = ExecutionDriver::new(&workspace, topology.cores)
        .with_halt_on_failure(options.halt_on_failure);
    driver.stage()?;
    let reports = driver.run()?;

    let failed = reports.iter().filter(|r| !r.success).count();
    info!(
        total = reports.len(),
        failed,
        workspace = %workspace.root.display(),
        "batch complete"
    );
    Ok(reports)
}

/// Errors from the orchestration pipeline.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// A config source file could not be loaded or interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run topology violates a constraint.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The execution environment could not be resolved.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The workspace could not be constructed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// A record file could not be serialized.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The engine build failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Staging or dispatch failed.
    #[error(transparent)]
    Run(#[from] RunError),

    /// Restart mode was requested but is not supported here.
    #[error("Restart mode is not supported by this launcher; rerun from the execution folder")]
    RestartUnsupported,
}
