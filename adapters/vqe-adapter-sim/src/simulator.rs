//! Statevector accelerator implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};

use vqe_hal::{Accelerator, AcceleratorBuffer, Counts, HalError, HalResult};
use vqe_ir::Circuit;

use crate::statevector::{Statevector, flip_bits, outcome_to_bitstring, sample};

/// Local statevector accelerator.
///
/// With `shots == 0` (the default) buffers receive the exact outcome
/// distribution of the measured qubits; otherwise outcomes are sampled.
/// An optional symmetric readout error flips each measured bit with a fixed
/// probability, which is what readout calibration kernels observe.
pub struct StatevectorAccelerator {
    name: String,
    max_qubits: u32,
    shots: u32,
    readout_error: f64,
    rng: Mutex<StdRng>,
}

impl StatevectorAccelerator {
    /// Create an exact, noiseless simulator with default settings.
    pub fn new() -> Self {
        Self {
            name: "statevector".to_string(),
            max_qubits: 20,
            shots: 0,
            readout_error: 0.0,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Limit the register width.
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Sample `shots` outcomes per circuit; 0 selects exact probabilities.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Flip every measured bit with probability `p`.
    pub fn with_readout_error(mut self, p: f64) -> HalResult<Self> {
        if !(0.0..=0.5).contains(&p) {
            return Err(HalError::Unsupported(format!(
                "readout error probability {p} outside [0, 0.5]"
            )));
        }
        self.readout_error = p;
        Ok(self)
    }

    /// Seed the sampling RNG for reproducible shot noise.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Configured shot count.
    pub fn shots(&self) -> u32 {
        self.shots
    }

    #[instrument(skip(self, circuit, buffer), fields(circuit = circuit.name()))]
    fn run(&self, circuit: &Circuit, buffer: &mut AcceleratorBuffer) -> HalResult<()> {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits();

        if num_qubits > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                num_qubits, self.max_qubits
            )));
        }
        if num_qubits > buffer.num_qubits() as usize {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' uses {num_qubits} qubits but buffer '{}' holds {}",
                circuit.name(),
                buffer.name(),
                buffer.num_qubits()
            )));
        }

        let mut sv = Statevector::new(num_qubits);
        for inst in circuit.instructions() {
            sv.apply(inst)?;
        }

        let measured = circuit.measured_qubits();
        if measured.is_empty() {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' measures no qubits",
                circuit.name()
            )));
        }
        let indices: Vec<usize> = measured.iter().map(|q| q.index()).collect();
        let mut probs = sv.marginal(&indices);
        flip_bits(&mut probs, indices.len(), self.readout_error);

        if self.shots == 0 {
            let width = indices.len();
            buffer.set_probabilities(
                measured,
                probs
                    .iter()
                    .enumerate()
                    .map(|(outcome, &p)| (outcome_to_bitstring(outcome, width), p)),
            );
        } else {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let mut counts = Counts::new();
            for _ in 0..self.shots {
                let outcome = sample(&probs, &mut *rng);
                counts.insert(outcome_to_bitstring(outcome, indices.len()), 1);
            }
            buffer.set_counts(measured, counts);
        }

        debug!(
            "Simulated {} qubits in {:?}",
            num_qubits,
            start.elapsed()
        );
        Ok(())
    }
}

impl Default for StatevectorAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Accelerator for StatevectorAccelerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    async fn execute(&self, circuit: &Circuit, buffer: &mut AcceleratorBuffer) -> HalResult<()> {
        self.run(circuit, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vqe_ir::{ClbitId, QubitId};

    fn bell_measured() -> Circuit {
        let mut circuit = Circuit::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .measure(QubitId(1), ClbitId(1))
            .unwrap();
        circuit
    }

    #[tokio::test]
    async fn test_exact_bell_state() {
        let acc = StatevectorAccelerator::new();
        let mut buffer = acc.create_buffer("bell", 2).unwrap();
        acc.execute(&bell_measured(), &mut buffer).await.unwrap();

        assert!((buffer.measurement_probability("00") - 0.5).abs() < 1e-12);
        assert!((buffer.measurement_probability("11") - 0.5).abs() < 1e-12);
        assert_eq!(buffer.measurement_probability("01"), 0.0);
        assert!((buffer.expectation_value_z().unwrap() - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_sampled_bell_state() {
        let acc = StatevectorAccelerator::new().with_shots(1000).with_seed(42);
        let mut buffer = acc.create_buffer("bell", 2).unwrap();
        acc.execute(&bell_measured(), &mut buffer).await.unwrap();

        let counts = buffer.counts().unwrap();
        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
    }

    #[tokio::test]
    async fn test_readout_error_shows_in_calibration() {
        let acc = StatevectorAccelerator::new()
            .with_readout_error(0.05)
            .unwrap();
        let mut circuit = Circuit::with_size("readout_q0_0", 1, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        let mut buffer = acc.create_buffer("cal", 1).unwrap();
        acc.execute(&circuit, &mut buffer).await.unwrap();

        assert!((buffer.measurement_probability("1") - 0.05).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unbound_parameter_rejected() {
        let acc = StatevectorAccelerator::new();
        let mut circuit = Circuit::with_size("p", 1, 1);
        circuit
            .rx(vqe_ir::ParameterExpression::symbol("t"), QubitId(0))
            .unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        let mut buffer = acc.create_buffer("p", 1).unwrap();
        let err = acc.execute(&circuit, &mut buffer).await.unwrap_err();
        assert!(matches!(err, HalError::InvalidCircuit(_)));
    }

    #[tokio::test]
    async fn test_too_many_qubits() {
        let acc = StatevectorAccelerator::new().with_max_qubits(5);
        let circuit = Circuit::with_size("test", 10, 0);
        let mut buffer = AcceleratorBuffer::new("wide", 10);
        let result = acc.execute(&circuit, &mut buffer).await;
        assert!(matches!(result, Err(HalError::CircuitTooLarge(_))));
    }
}
