//! Results of one energy evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Energy and diagnostics for one parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyResult {
    /// Σ coefficient × ⟨term⟩ plus the identity coefficient.
    pub energy: f64,
    /// ⟨term⟩ per kernel name. The identity kernel reports 1.
    pub per_term_expectation: BTreeMap<String, f64>,
    /// Flip probability per calibration kernel name: p(1) after preparing |0⟩
    /// and p(0) after preparing |1⟩. Uncorrected.
    pub calibration_probabilities: BTreeMap<String, f64>,
    /// Accelerator executions across all ranks and workers.
    pub total_execution_count: u64,
}

impl EnergyResult {
    /// Expectation recorded for the kernel `name`.
    pub fn expectation(&self, name: &str) -> Option<f64> {
        self.per_term_expectation.get(name).copied()
    }
}
