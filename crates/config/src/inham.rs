//! Hamiltonian constants, read from `inham.toml`.
//!
//! The file carries the electronic-structure row plus one block per
//! supported system. The record gets exactly one system block, selected
//! by the [`SystemVariant`] in `inputs.toml`; the others are ignored.

use crate::error::ConfigError;
use crate::variant::SystemVariant;
use crate::ParameterRow;
use serde::Deserialize;
use std::path::Path;

/// Hamiltonian constants for one run.
#[derive(Clone, Debug, Deserialize)]
pub struct HamiltonianConfig {
    /// Electronic-structure parameters, always emitted.
    pub el: ElectronicBlock,

    /// Morse potential block.
    pub mp: Option<MorseBlock>,
    /// Harmonic potential block.
    pub hp: Option<HarmonicBlock>,
    /// Spin-boson block.
    pub sb: Option<SpinBosonBlock>,
}

impl HamiltonianConfig {
    /// Load Hamiltonian constants from an `inham.toml` file.
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

    /// The Hamiltonian row for the selected system.
    ///
    /// Fails if `inham.toml` does not carry a block for that system.
    pub fn system_row(&self, system: SystemVariant) -> Result<Vec<String>, ConfigError> {
        let row = match system {
            SystemVariant::Mp => self.mp.as_ref().map(ParameterRow::row),
            SystemVariant::Hp => self.hp.as_ref().map(ParameterRow::row),
            SystemVariant::Sb => self.sb.as_ref().map(ParameterRow::row),
        };
        row.ok_or(ConfigError::MissingHamiltonian { system })
    }
}

/// Electronic-structure parameters.
#[derive(Clone, Debug, Deserialize)]
pub struct ElectronicBlock {
    /// Number of electronic states.
    pub nel: u32,
    /// Energy gap between states.
    pub delta_e: f64,
    /// Interstate coupling strength.
    pub coupling: f64,
}

impl ParameterRow for ElectronicBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.nel.to_string(),
            self.delta_e.to_string(),
            self.coupling.to_string(),
        ]
    }
}

/// Morse potential constants.
#[derive(Clone, Debug, Deserialize)]
pub struct MorseBlock {
    /// Reduced mass.
    pub mass: f64,
    /// Well depth.
    pub well_depth: f64,
    /// Width parameter.
    pub alpha: f64,
    /// Equilibrium bond length.
    pub r_eq: f64,
}

impl ParameterRow for MorseBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.mass.to_string(),
            self.well_depth.to_string(),
            self.alpha.to_string(),
            self.r_eq.to_string(),
        ]
    }
}

/// Harmonic potential constants.
#[derive(Clone, Debug, Deserialize)]
pub struct HarmonicBlock {
    /// Reduced mass.
    pub mass: f64,
    /// Oscillator frequency.
    pub freq: f64,
}

impl ParameterRow for HarmonicBlock {
    fn row(&self) -> Vec<String> {
        vec![self.mass.to_string(), self.freq.to_string()]
    }
}

/// Spin-boson bath constants.
#[derive(Clone, Debug, Deserialize)]
pub struct SpinBosonBlock {
    /// Tunnelling matrix element.
    pub delta: f64,
    /// Energy bias between the two wells.
    pub eps: f64,
    /// Inverse bath temperature.
    pub beta: f64,
    /// Bath cutoff frequency.
    pub wc: f64,
    /// Kondo coupling strength.
    pub kondo: f64,
    /// Highest sampled bath mode frequency.
    pub wmax: f64,
}

impl ParameterRow for SpinBosonBlock {
    fn row(&self) -> Vec<String> {
        vec![
            self.delta.to_string(),
            self.eps.to_string(),
            self.beta.to_string(),
            self.wc.to_string(),
            self.kondo.to_string(),
            self.wmax.to_string(),
        ]
    }
}
