//! Method and system variant enums.
//!
//! The engine branches on two string-typed identifiers: the propagation
//! method and the physical system. Both are closed sets, so they are
//! modelled as enums with exhaustive matching; adding a variant is a
//! compile-time-checked change.

use serde::Deserialize;
use std::fmt;

/// Propagation method selector.
///
/// `Mce12` is the dual-method mode: it generates two sibling pipelines
/// (`MCEv1` and `MCEv2`), each with its own record file and run folders.
/// Every other variant runs a single pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum MethodVariant {
    #[serde(rename = "CCS")]
    Ccs,
    #[serde(rename = "MCEv1")]
    Mcev1,
    #[serde(rename = "MCEv2")]
    Mcev2,
    #[serde(rename = "MCE12")]
    Mce12,
}

impl MethodVariant {
    /// The wire label written into the record control row.
    pub fn label(&self) -> &'static str {
        match self {
            MethodVariant::Ccs => "CCS",
            MethodVariant::Mcev1 => "MCEv1",
            MethodVariant::Mcev2 => "MCEv2",
            MethodVariant::Mce12 => "MCE12",
        }
    }

    /// Whether this method generates two parallel pipelines.
    pub fn is_dual(&self) -> bool {
        matches!(self, MethodVariant::Mce12)
    }

    /// The pipeline instances this method expands to.
    ///
    /// Single-method variants produce one instance with a flat folder
    /// layout; `Mce12` produces two, each nested under its own variant
    /// subdirectory.
    pub fn instances(&self) -> Vec<MethodInstance> {
        if self.is_dual() {
            vec![
                MethodInstance {
                    label: "MCEv1",
                    subdir: Some("MCEv1"),
                    record_name: "rundata1.csv",
                },
                MethodInstance {
                    label: "MCEv2",
                    subdir: Some("MCEv2"),
                    record_name: "rundata2.csv",
                },
            ]
        } else {
            vec![MethodInstance {
                label: self.label(),
                subdir: None,
                record_name: "rundata.csv",
            }]
        }
    }
}

impl fmt::Display for MethodVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pipeline instance of a method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodInstance {
    /// Label written into the record control row.
    pub label: &'static str,
    /// Variant subdirectory holding this instance's run folders, if any.
    pub subdir: Option<&'static str>,
    /// Name of this instance's record file in the workspace root.
    pub record_name: &'static str,
}

/// Physical system selector.
///
/// Picks which Hamiltonian block from `inham.toml` is appended to the
/// record. Exactly one block is emitted per record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum SystemVariant {
    /// Morse potential.
    #[serde(rename = "MP")]
    Mp,
    /// Harmonic potential.
    #[serde(rename = "HP")]
    Hp,
    /// Spin-boson model.
    #[serde(rename = "SB")]
    Sb,
}

impl SystemVariant {
    /// The wire label for this system.
    pub fn label(&self) -> &'static str {
        match self {
            SystemVariant::Mp => "MP",
            SystemVariant::Hp => "HP",
            SystemVariant::Sb => "SB",
        }
    }
}

impl fmt::Display for SystemVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
