//! MCE batch launcher CLI.
//!
//! Validates the run topology from `run.toml`, prepares the execution
//! workspace, builds the engine, and runs it in every folder.

use clap::Parser;
use mcebatch_orchestrator::{launch, LaunchOptions, OverwritePolicy};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcebatch")]
#[command(about = "Batch launcher for MCE/CCS simulation runs")]
#[command(version)]
struct Cli {
    /// Directory containing run.toml, inputs.toml and inham.toml
    #[arg(short, long, default_value = "config")]
    config_dir: PathBuf,

    /// Directory containing the engine sources and make recipes
    #[arg(short, long, default_value = "build")]
    build_dir: PathBuf,

    /// Parent directory of the local EXEC root
    #[arg(long, default_value = "..")]
    exec_base: PathBuf,

    /// Overwrite an existing workspace without prompting
    #[arg(long)]
    force: bool,

    /// Never overwrite an existing workspace, and never prompt
    #[arg(long, conflicts_with = "force")]
    no_overwrite: bool,

    /// Stop the batch at the first failed engine run
    #[arg(long)]
    halt_on_failure: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let overwrite = if cli.force {
        OverwritePolicy::Force
    } else if cli.no_overwrite {
        OverwritePolicy::Never
    } else {
        OverwritePolicy::Ask
    };

    let options = LaunchOptions {
        config_dir: cli.config_dir,
        build_dir: cli.build_dir,
        exec_base: cli.exec_base,
        overwrite,
        halt_on_failure: cli.halt_on_failure,
    };

    match launch(&options) {
        Ok(reports) => {
            let failed: Vec<_> = reports.iter().filter(|r| !r.success).collect();
            println!("Completed {} engine runs", reports.len());
            for report in &failed {
                println!(
                    "  FAILED {} (exit code {:?})",
                    report.folder.display(),
                    report.exit_code
                );
            }
            if !failed.is_empty() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
