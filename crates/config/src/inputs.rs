//! Simulation parameter blocks, read from `inputs.toml`.
//!
//! Each block maps to one row of the engine record file. Struct field
//! order is the row order the engine was compiled against.

use crate::error::ConfigError;
use crate::variant::{MethodVariant, SystemVariant};
use crate::{yes_no, ParameterRow};
use serde::Deserialize;
use std::path::Path;

/// Simulation parameters for one run.
#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Propagation method.
    pub method: MethodVariant,

    /// Basis-set compression switch.
    #[serde(default)]
    pub compression: bool,

    /// Run repeats in conjugate pairs. Requires the repeat count to be
    /// divisible by twice the folder-core product.
    #[serde(default)]
    pub conjugate_repeats: bool,

    pub system: SystemBlock,
    pub basis: BasisBlock,
    pub train: TrainingBlock,
    pub clone: CloningBlock,
    pub paramz: SecondaryBlock,
    pub prop: PropagationBlock,
}

impl SimulationConfig {
    /// Load simulation parameters from an `inputs.toml` file.
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

    /// The physical system selected for this run.
    pub fn system_variant(&self) -> SystemVariant {
        self.system.system
    }
}

/// Physical-system selection row.
#[derive(Clone, Debug, Deserialize)]
pub struct SystemBlock {
    /// Which system's Hamiltonian block is appended to the record.
    pub system: SystemVariant,
}

impl ParameterRow for SystemBlock {
    fn row(&self) -> Vec<String> {
        vec![self.system.label().to_string()]
    }
}

/// Basis-set sizing and sampling parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct BasisBlock {
    /// Degrees of freedom per basis function.
    pub ndof: u32,
    /// Number of potential energy surfaces.
    pub npes: u32,
    /// Initial number of basis functions.
    pub in_nbf: u32,
    /// Coherent-state width parameter.
    pub gamma: f64,
    /// Initial-state sampling width.
    pub sigma: f64,
}

impl ParameterRow for BasisBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.ndof.to_string(),
            self.npes.to_string(),
            self.in_nbf.to_string(),
            self.gamma.to_string(),
            self.sigma.to_string(),
        ]
    }
}

/// Basis-train parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct TrainingBlock {
    /// Whether basis functions are grouped into trains.
    pub train: bool,
    /// Spacing between train members, in timesteps.
    pub train_spacing: u32,
    /// Number of basis functions per train.
    pub train_length: u32,
}

impl ParameterRow for TrainingBlock {
    fn row(&self) -> Vec<String> {
        vec![
            yes_no(self.train),
            self.train_spacing.to_string(),
            self.train_length.to_string(),
        ]
    }
}

/// Basis-function cloning parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct CloningBlock {
    /// Whether cloning is enabled.
    pub cloning: bool,
    /// Maximum clones spawned per basis function.
    pub max_clones: u32,
    /// Minimum timesteps between cloning events.
    pub clone_freq: u32,
    /// Population-difference threshold that triggers a clone.
    pub threshold: f64,
}

impl ParameterRow for CloningBlock {
    fn row(&self) -> Vec<String> {
        vec![
            yes_no(self.cloning),
            self.max_clones.to_string(),
            self.clone_freq.to_string(),
            self.threshold.to_string(),
        ]
    }
}

/// Secondary numeric parameters for phase-space sampling.
#[derive(Clone, Debug, Deserialize)]
pub struct SecondaryBlock {
    /// Compression parameter for the initial wavepacket.
    pub alcmprss: f64,
    /// Position-space grid scaling.
    pub qss: f64,
    /// Momentum-space grid scaling.
    pub pss: f64,
}

impl ParameterRow for SecondaryBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.alcmprss.to_string(),
            self.qss.to_string(),
            self.pss.to_string(),
        ]
    }
}

/// Propagation-control parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct PropagationBlock {
    /// Smallest adaptive timestep.
    pub dtmin: f64,
    /// Largest adaptive timestep.
    pub dtmax: f64,
    /// Initial timestep.
    pub dtinit: f64,
    /// Propagation start time.
    pub time_start: f64,
    /// Propagation end time.
    pub time_end: f64,
    /// Steps between output records.
    pub output_freq: u32,
}

impl ParameterRow for PropagationBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.dtmin.to_string(),
            self.dtmax.to_string(),
            self.dtinit.to_string(),
            self.time_start.to_string(),
            self.time_end.to_string(),
            self.output_freq.to_string(),
        ]
    }
}
