//! Record serialization.
//!
//! The engine reads its whole configuration from one delimited record file
//! at startup: a control row, the parameter-block rows in a fixed order,
//! and exactly one Hamiltonian block for the selected system. Row order is
//! the wire contract; nothing here may reorder or drop a row.

use crate::topology::RunTopology;
use mcebatch_config::{
    yes_no, ConfigError, HamiltonianConfig, MethodInstance, ParameterRow, RunSettings,
    SimulationConfig,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Fixed name under which the engine looks for its record file.
pub const RECORD_FILENAME: &str = "rundata.csv";

/// First row of the record: launch switches and per-folder workload.
#[derive(Clone, Debug)]
pub struct ControlRow {
    /// Generate a fresh basis set.
    pub generate_basis: bool,
    /// Propagate the basis set.
    pub propagate: bool,
    /// Restart flag; always `NO` from this launcher.
    pub restart: bool,
    /// Basis-set compression switch.
    pub compression: bool,
    /// Method label for this pipeline instance.
    pub method_label: String,
    /// Repeats each folder works through.
    pub repeats_per_folder: u32,
    /// Conjugate-repeat mode.
    pub conjugate_repeats: bool,
}

impl ControlRow {
    /// Build the control row for one pipeline instance.
    pub fn new(
        settings: &RunSettings,
        inputs: &SimulationConfig,
        topology: &RunTopology,
        instance: &MethodInstance,
    ) -> Self {
        Self {
            generate_basis: settings.generate_basis,
            propagate: settings.propagate,
            restart: settings.restart,
            compression: inputs.compression,
            method_label: instance.label.to_string(),
            repeats_per_folder: topology.repeats_per_folder(),
            conjugate_repeats: inputs.conjugate_repeats,
        }
    }
}

impl ParameterRow for ControlRow {
    fn row(&self) -> Vec<String> {
        vec![
            yes_no(self.generate_basis),
            yes_no(self.propagate),
            yes_no(self.restart),
            yes_no(self.compression),
            self.method_label.clone(),
            self.repeats_per_folder.to_string(),
            yes_no(self.conjugate_repeats),
        ]
    }
}

/// Assemble every row of a record, in wire order.
pub fn record_rows(
    control: &ControlRow,
    inputs: &SimulationConfig,
    inham: &HamiltonianConfig,
) -> Result<Vec<Vec<String>>, ConfigError> {
    Ok(vec![
        control.row(),
        inputs.system.row(),
        inputs.basis.row(),
        inputs.train.row(),
        inputs.clone.row(),
        inputs.paramz.row(),
        inham.el.row(),
        inputs.prop.row(),
        inham.system_row(inputs.system_variant())?,
    ])
}

/// Write one record file.
///
/// Output is deterministic: the same inputs produce byte-identical files.
pub fn write_record(
    path: &Path,
    control: &ControlRow,
    inputs: &SimulationConfig,
    inham: &HamiltonianConfig,
) -> Result<(), RecordError> {
    let rows = record_rows(control, inputs, inham)?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one record file per pipeline instance into the workspace root.
///
/// Returns the written paths in instance order.
pub fn write_records(
    workspace_root: &Path,
    settings: &RunSettings,
    inputs: &SimulationConfig,
    inham: &HamiltonianConfig,
    topology: &RunTopology,
) -> Result<Vec<PathBuf>, RecordError> {
    let mut paths = Vec::new();
    for instance in inputs.method.instances() {
        let path = workspace_root.join(instance.record_name);
        let control = ControlRow::new(settings, inputs, topology, &instance);
        write_record(&path, &control, inputs, inham)?;
        info!(path = %path.display(), label = instance.label, "wrote record file");
        paths.push(path);
    }
    Ok(paths)
}

/// Errors during record serialization.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A row could not be assembled from the config sources.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The record file could not be written.
    #[error("Failed to write record file: {0}")]
    Csv(#[from] csv::Error),
}
