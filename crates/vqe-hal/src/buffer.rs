//! Result buffers filled by accelerators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use vqe_ir::QubitId;

use crate::counts::Counts;

/// Measurement results of one circuit execution.
///
/// Outcomes are bitstrings over the measured qubits in ascending qubit order:
/// character `k` is the result of the `k`-th measured qubit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceleratorBuffer {
    name: String,
    num_qubits: u32,
    measured: Vec<QubitId>,
    probabilities: BTreeMap<String, f64>,
    counts: Option<Counts>,
}

impl AcceleratorBuffer {
    /// Create an empty buffer for a register of `num_qubits`.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            measured: Vec::new(),
            probabilities: BTreeMap::new(),
            counts: None,
        }
    }

    /// Buffer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register width.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Qubits the outcomes refer to, ascending.
    pub fn measured_qubits(&self) -> &[QubitId] {
        &self.measured
    }

    /// Record an exact outcome distribution.
    pub fn set_probabilities(
        &mut self,
        measured: Vec<QubitId>,
        probabilities: impl IntoIterator<Item = (String, f64)>,
    ) {
        self.measured = measured;
        self.probabilities = probabilities.into_iter().collect();
        self.counts = None;
    }

    /// Record a sampled histogram; probabilities become relative frequencies.
    pub fn set_counts(&mut self, measured: Vec<QubitId>, counts: Counts) {
        self.measured = measured;
        self.probabilities = counts.probabilities().into_iter().collect();
        self.counts = Some(counts);
    }

    /// Outcome probabilities keyed by bitstring.
    pub fn probabilities(&self) -> &BTreeMap<String, f64> {
        &self.probabilities
    }

    /// The raw histogram, when the buffer was filled by sampling.
    pub fn counts(&self) -> Option<&Counts> {
        self.counts.as_ref()
    }

    /// Check whether any results were recorded.
    pub fn has_results(&self) -> bool {
        !self.probabilities.is_empty()
    }

    /// Drop recorded results, keeping name and width.
    pub fn clear(&mut self) {
        self.measured.clear();
        self.probabilities.clear();
        self.counts = None;
    }

    /// ⟨Z⊗…⊗Z⟩ over the measured qubits: Σ p(b)·(−1)^{|b|}.
    ///
    /// `None` when nothing was recorded.
    pub fn expectation_value_z(&self) -> Option<f64> {
        if self.probabilities.is_empty() {
            return None;
        }
        let value = self
            .probabilities
            .iter()
            .map(|(bits, p)| {
                let ones = bits.bytes().filter(|&b| b == b'1').count();
                if ones % 2 == 0 { *p } else { -*p }
            })
            .sum();
        Some(value)
    }

    /// Probability of `bitstring`, NaN when it was never observed.
    pub fn measurement_probability(&self, bitstring: &str) -> f64 {
        self.probabilities.get(bitstring).copied().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectation_from_probabilities() {
        let mut buffer = AcceleratorBuffer::new("Z0Z1", 2);
        assert_eq!(buffer.expectation_value_z(), None);

        buffer.set_probabilities(
            vec![QubitId(0), QubitId(1)],
            [("00".to_string(), 0.5), ("01".to_string(), 0.25), ("11".to_string(), 0.25)],
        );
        let z = buffer.expectation_value_z().unwrap();
        assert!((z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_expectation_from_counts() {
        let mut buffer = AcceleratorBuffer::new("Z0", 1);
        let counts: Counts = [("0".to_string(), 75), ("1".to_string(), 25)]
            .into_iter()
            .collect();
        buffer.set_counts(vec![QubitId(0)], counts);
        assert!((buffer.expectation_value_z().unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(buffer.counts().map(Counts::total), Some(100));
    }

    #[test]
    fn test_missing_outcome_is_nan() {
        let mut buffer = AcceleratorBuffer::new("readout", 1);
        buffer.set_probabilities(vec![QubitId(0)], [("0".to_string(), 1.0)]);
        assert_eq!(buffer.measurement_probability("0"), 1.0);
        assert!(buffer.measurement_probability("1").is_nan());
    }
}
