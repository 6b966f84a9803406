//! Run topology and parameter validation.

use mcebatch_config::RunSettings;
use thiserror::Error;

/// Hard limit on the number of run folders.
pub const MAX_NODES: u32 = 100;
/// Hard limit on threads per engine process.
pub const MAX_CORES: u32 = 8;
/// Hard limit on repeats handled by a single folder.
pub const MAX_REPEATS_PER_FOLDER: u32 = 5000;
/// Hard limit on the folder-core product.
pub const MAX_TOTAL_CORES: u32 = 100;

/// The shape of one batch: how many repeats, spread over how many
/// folders, with how many threads each.
///
/// Built once per invocation and immutable thereafter. Nothing downstream
/// may proceed until [`RunTopology::validate`] has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunTopology {
    /// Total simulation repeats across all folders.
    pub repeats: u32,
    /// Number of run folders.
    pub nodes: u32,
    /// Threads per engine process.
    pub cores: u32,
}

impl RunTopology {
    /// Create a topology from raw counts.
    pub fn new(repeats: u32, nodes: u32, cores: u32) -> Self {
        Self {
            repeats,
            nodes,
            cores,
        }
    }

    /// Create a topology from operator-supplied run settings.
    pub fn from_settings(settings: &RunSettings) -> Self {
        Self::new(settings.repeats, settings.nodes, settings.cores)
    }

    /// Check every topology constraint, in a fixed order, reporting the
    /// first violation.
    ///
    /// The check order is a contract: when several constraints are
    /// violated at once, callers (and operators reading the message) see
    /// the same one every time.
    pub fn validate(&self, conjugate_repeats: bool) -> Result<(), ValidationError> {
        if self.repeats < 1 {
            return Err(ValidationError::NoRepeats);
        }
        if self.nodes < 1 {
            return Err(ValidationError::NoNodes);
        }
        if self.nodes > MAX_NODES {
            return Err(ValidationError::TooManyNodes);
        }
        if self.cores > MAX_CORES {
            return Err(ValidationError::TooManyCores);
        }
        if self.cores < 1 {
            return Err(ValidationError::NoCores);
        }
        // Compared as a product so a fractional ratio just over the cap
        // still trips this check rather than falling through to the
        // divisibility one. `nodes` is already bounded above.
        if self.repeats > MAX_REPEATS_PER_FOLDER * self.nodes {
            return Err(ValidationError::TooManyRepeatsPerFolder);
        }
        if conjugate_repeats && self.repeats % (2 * self.nodes * self.cores) != 0 {
            return Err(ValidationError::ConjugateIndivisible);
        }
        if self.repeats % (self.nodes * self.cores) != 0 {
            return Err(ValidationError::Indivisible);
        }
        if self.total_cores() > MAX_TOTAL_CORES {
            return Err(ValidationError::TooManyTotalCores);
        }
        Ok(())
    }

    /// Repeats assigned to each folder. Meaningful only after validation.
    pub fn repeats_per_folder(&self) -> u32 {
        self.repeats / self.nodes
    }

    /// The folder-core product.
    pub fn total_cores(&self) -> u32 {
        self.nodes * self.cores
    }
}

/// A violated topology constraint.
///
/// Variants are declared in check order; each maps to one constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Not enough runs selected. Must be 1 or greater")]
    NoRepeats,

    #[error("Not enough nodes selected. Must be 1 or greater")]
    NoNodes,

    #[error("Too many nodes. Maximum of 100 simultaneous submissions")]
    TooManyNodes,

    #[error("Too many cores selected. Maximum of 8 available")]
    TooManyCores,

    #[error("Not enough cores selected. Must be 1 or greater")]
    NoCores,

    #[error("Too many repeats per folder. Must be 5000 or fewer")]
    TooManyRepeatsPerFolder,

    #[error(
        "Number of repeats not valid for conjugate repetition. \
         Should be an integer multiple of 2*cores*nodes"
    )]
    ConjugateIndivisible,

    #[error("Number of repeats must be an integer multiple of cores*folders")]
    Indivisible,

    #[error("Total number of cores should stay below 100")]
    TooManyTotalCores,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_topology_passes() {
        let topology = RunTopology::new(40, 1, 4);
        assert_eq!(topology.validate(false), Ok(()));
        assert_eq!(topology.repeats_per_folder(), 40);
    }

    #[test]
    fn test_indivisible_repeats_fail() {
        let topology = RunTopology::new(41, 1, 4);
        assert_eq!(topology.validate(false), Err(ValidationError::Indivisible));
    }

    #[test]
    fn test_conjugate_requires_double_divisibility() {
        // 40 % (2*2*4) = 40 % 16 != 0
        let topology = RunTopology::new(40, 2, 4);
        assert_eq!(topology.validate(false), Ok(()));
        assert_eq!(
            topology.validate(true),
            Err(ValidationError::ConjugateIndivisible)
        );

        // 32 % 16 == 0
        let topology = RunTopology::new(32, 2, 4);
        assert_eq!(topology.validate(true), Ok(()));
    }

    #[test]
    fn test_node_boundaries() {
        assert_eq!(RunTopology::new(100, 100, 1).validate(false), Ok(()));
        assert_eq!(
            RunTopology::new(101, 101, 1).validate(false),
            Err(ValidationError::TooManyNodes)
        );
        assert_eq!(
            RunTopology::new(8, 0, 1).validate(false),
            Err(ValidationError::NoNodes)
        );
    }

    #[test]
    fn test_core_boundaries() {
        assert_eq!(RunTopology::new(16, 2, 8).validate(false), Ok(()));
        assert_eq!(
            RunTopology::new(16, 2, 9).validate(false),
            Err(ValidationError::TooManyCores)
        );
        assert_eq!(
            RunTopology::new(16, 2, 0).validate(false),
            Err(ValidationError::NoCores)
        );
    }

    #[test]
    fn test_repeats_per_folder_cap() {
        assert_eq!(RunTopology::new(5000, 1, 1).validate(false), Ok(()));
        assert_eq!(
            RunTopology::new(5004, 1, 1).validate(false),
            Err(ValidationError::TooManyRepeatsPerFolder)
        );
    }

    #[test]
    fn test_fractional_ratio_over_cap_is_still_too_many() {
        // 10001 over 2 folders is 5000.5 per folder. The cap check must
        // report it, not the later divisibility check.
        assert_eq!(
            RunTopology::new(10001, 2, 1).validate(false),
            Err(ValidationError::TooManyRepeatsPerFolder)
        );
        // At exactly the cap the divisibility check takes over.
        assert_eq!(RunTopology::new(10000, 2, 1).validate(false), Ok(()));
    }

    #[test]
    fn test_total_core_cap() {
        // 20 folders * 8 threads = 160 > 100
        let topology = RunTopology::new(160, 20, 8);
        assert_eq!(topology.total_cores(), 160);
        assert_eq!(
            topology.validate(false),
            Err(ValidationError::TooManyTotalCores)
        );
        // 12 * 8 = 96 stays under the cap
        assert_eq!(RunTopology::new(96, 12, 8).total_cores(), 96);
        assert_eq!(RunTopology::new(96, 12, 8).validate(false), Ok(()));
    }

    #[test]
    fn test_first_violation_wins() {
        // Violates the repeat minimum, the node cap, and the core cap at
        // once; the repeat check comes first.
        let topology = RunTopology::new(0, 101, 9);
        assert_eq!(topology.validate(false), Err(ValidationError::NoRepeats));

        // With repeats fixed, the node cap is reported before the cores.
        let topology = RunTopology::new(1010, 101, 9);
        assert_eq!(
            topology.validate(false),
            Err(ValidationError::TooManyNodes)
        );

        // With nodes fixed too, the core cap is next.
        let topology = RunTopology::new(900, 100, 9);
        assert_eq!(
            topology.validate(false),
            Err(ValidationError::TooManyCores)
        );
    }
}
