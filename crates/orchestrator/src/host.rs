//! Host classification.
//!
//! The launcher behaves differently on the HPC cluster and on a local
//! workstation: the workspace root moves to shared scratch, the build
//! recipe changes, and the numerical libraries need an environment module.
//! This is the only place host identity is derived; everything downstream
//! takes a [`HostKind`].

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// Head nodes of the HPC cluster this launcher knows about.
pub const CLUSTER_HOSTS: [&str; 2] = ["arc3", "arc4"];

/// Shared scratch filesystem on the cluster.
const CLUSTER_SCRATCH: &str = "/nobackup";

/// Name of the local execution root created next to the launch directory.
const LOCAL_EXEC_DIR: &str = "EXEC";

/// Execution environment classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostKind {
    /// A workstation; workspaces live in a sibling `EXEC` directory.
    Local,
    /// An HPC cluster head node; workspaces live on shared scratch.
    Cluster,
}

impl HostKind {
    /// Classify the current host by its hostname.
    pub fn detect() -> Self {
        let hostname = current_hostname();
        let kind = Self::classify(&hostname);
        debug!(hostname = %hostname, ?kind, "resolved host");
        kind
    }

    /// Classify a hostname.
    pub fn classify(hostname: &str) -> Self {
        if CLUSTER_HOSTS.contains(&hostname) {
            HostKind::Cluster
        } else {
            HostKind::Local
        }
    }

    /// Whether this host is the cluster.
    pub fn is_cluster(&self) -> bool {
        matches!(self, HostKind::Cluster)
    }

    /// The filesystem root under which workspaces are created.
    ///
    /// On the cluster this is the invoking user's scratch directory; the
    /// user must be identifiable from the environment. Locally it is an
    /// `EXEC` directory under `exec_base`.
    pub fn scratch_root(&self, exec_base: &Path, user: &str) -> PathBuf {
        match self {
            HostKind::Local => exec_base.join(LOCAL_EXEC_DIR),
            HostKind::Cluster => Path::new(CLUSTER_SCRATCH).join(user),
        }
    }

    /// Load the numerical-library environment module on the cluster.
    ///
    /// A missing `module` command is logged, not fatal: the build will
    /// surface any real linking problem.
    pub fn load_environment_modules(&self) {
        if !self.is_cluster() {
            return;
        }
        match Command::new("module").args(["load", "mkl"]).status() {
            Ok(status) if status.success() => debug!("loaded mkl module"),
            Ok(status) => warn!(?status, "module load mkl failed"),
            Err(source) => warn!(%source, "could not invoke module command"),
        }
    }
}

/// The invoking user's name, for the cluster scratch root.
pub fn current_user() -> Result<String, HostError> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .map_err(|_| HostError::UnknownUser)
}

fn current_hostname() -> String {
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        return hostname.trim().to_string();
    }
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Errors while resolving the execution environment.
#[derive(Debug, Error)]
pub enum HostError {
    /// Neither `$USER` nor `$LOGNAME` is set.
    #[error("Cannot determine user for the cluster scratch root; set $USER or $LOGNAME")]
    UnknownUser,
}
