//! Configuration sources for MCE batch runs.
//!
//! The compute engine reads its parameters from a fixed-schema record file
//! assembled out of three static source files:
//!
//! - `run.toml`: run topology and launch switches ([`RunSettings`])
//! - `inputs.toml`: method selection and simulation parameter blocks
//!   ([`SimulationConfig`])
//! - `inham.toml`: electronic-structure constants and the per-system
//!   Hamiltonian blocks ([`HamiltonianConfig`])
//!
//! Every parameter block renders itself as an ordered row of scalar values
//! via [`ParameterRow::row`]. Field order inside each block is part of the
//! wire contract with the engine and must not change.

pub mod error;
pub mod inham;
pub mod inputs;
pub mod run;
pub mod variant;

pub use error::ConfigError;
pub use inham::{ElectronicBlock, HamiltonianConfig, HarmonicBlock, MorseBlock, SpinBosonBlock};
pub use inputs::{
    BasisBlock, CloningBlock, PropagationBlock, SecondaryBlock, SimulationConfig, SystemBlock,
    TrainingBlock,
};
pub use run::RunSettings;
pub use variant::{MethodInstance, MethodVariant, SystemVariant};

/// An ordered row of scalar values destined for the engine record file.
///
/// Implementations list their fields in declared order; the serializer
/// writes them verbatim.
pub trait ParameterRow {
    /// Render the block's values, in wire order.
    fn row(&self) -> Vec<String>;
}

/// Render a switch the way the engine expects it.
pub fn yes_no(value: bool) -> String {
    if value { "YES" } else { "NO" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_no_rendering() {
        assert_eq!(yes_no(true), "YES");
        assert_eq!(yes_no(false), "NO");
    }
}
