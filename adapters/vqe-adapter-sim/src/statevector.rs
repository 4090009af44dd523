//! Statevector simulation engine.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::PI;

use vqe_hal::{HalError, HalResult};
use vqe_ir::{Instruction, InstructionKind, StandardGate};

/// A statevector representing a quantum state.
pub(crate) struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub(crate) fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Apply an instruction to the statevector.
    pub(crate) fn apply(&mut self, instruction: &Instruction) -> HalResult<()> {
        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<_> = instruction.qubits.iter().map(|q| q.index()).collect();
                self.apply_standard_gate(gate, &qubits)
            }
            // Measurement is read off the final state.
            InstructionKind::Measure | InstructionKind::Barrier => Ok(()),
        }
    }

    fn apply_standard_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> HalResult<()> {
        let angle = || {
            gate.parameter()
                .and_then(|p| p.as_f64())
                .ok_or_else(|| {
                    HalError::InvalidCircuit(format!("gate '{}' has an unbound angle", gate.name()))
                })
        };
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_z(qubits[0]),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::Rx(_) => self.apply_rx(qubits[0], angle()?),
            StandardGate::Ry(_) => self.apply_ry(qubits[0], angle()?),
            StandardGate::Rz(_) => self.apply_rz(qubits[0], angle()?),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let i_val = Complex64::new(0.0, 1.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -i_val * self.amplitudes[j];
                self.amplitudes[j] = i_val * tmp;
            }
        }
    }

    fn apply_z(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = sqrt2_inv * (a + b);
                self.amplitudes[j] = sqrt2_inv * (a - b);
            }
        }
    }

    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for i in 0..(1 << self.num_qubits) {
            if i & mask != 0 {
                self.amplitudes[i] *= phase;
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let neg_i_s = Complex64::new(0.0, -(theta / 2.0).sin());
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask != 0) {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }

    // =========================================================================
    // Readout
    // =========================================================================

    /// Outcome distribution of `qubits`; bit `k` of the index is `qubits[k]`.
    pub(crate) fn marginal(&self, qubits: &[usize]) -> Vec<f64> {
        let mut probs = vec![0.0; 1 << qubits.len()];
        for (i, amp) in self.amplitudes.iter().enumerate() {
            let p = amp.norm_sqr();
            if p == 0.0 {
                continue;
            }
            let outcome = qubits
                .iter()
                .enumerate()
                .fold(0, |acc, (k, &q)| acc | (((i >> q) & 1) << k));
            probs[outcome] += p;
        }
        probs
    }
}

/// Apply an independent bit-flip with probability `p` to every bit.
pub(crate) fn flip_bits(probs: &mut Vec<f64>, num_bits: usize, p: f64) {
    if p <= 0.0 {
        return;
    }
    for k in 0..num_bits {
        let mask = 1 << k;
        let mut next = vec![0.0; probs.len()];
        for (i, &prob) in probs.iter().enumerate() {
            next[i] += (1.0 - p) * prob;
            next[i ^ mask] += p * prob;
        }
        *probs = next;
    }
}

/// Draw an outcome index from a distribution.
pub(crate) fn sample<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> usize {
    let r: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for (i, p) in probs.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return i;
        }
    }
    // Rounding can leave the total marginally below 1.
    probs.iter().rposition(|&p| p > 0.0).unwrap_or(0)
}

/// Bitstring of `outcome` over `width` bits, bit 0 first.
pub(crate) fn outcome_to_bitstring(outcome: usize, width: usize) -> String {
    (0..width)
        .map(|k| if (outcome >> k) & 1 == 1 { '1' } else { '0' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_h(0);
        sv.apply_cx(0, 1);

        let sqrt2_inv = 1.0 / 2.0_f64.sqrt();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(sqrt2_inv, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(sqrt2_inv, 0.0)));
    }

    #[test]
    fn test_sdg_then_h_maps_y_eigenstate() {
        // |+i⟩ = S·H|0⟩; Sdg then H takes it back to |0⟩.
        let mut sv = Statevector::new(1);
        sv.apply_h(0);
        sv.apply_phase(0, PI / 2.0);
        sv.apply_phase(0, -PI / 2.0);
        sv.apply_h(0);
        assert!((sv.marginal(&[0])[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_marginal_orders_bits_by_list() {
        let mut sv = Statevector::new(3);
        sv.apply_x(2);
        let probs = sv.marginal(&[0, 2]);
        assert!((probs[0b10] - 1.0).abs() < 1e-12);
        assert_eq!(outcome_to_bitstring(0b10, 2), "01");
    }

    #[test]
    fn test_flip_bits() {
        let mut probs = vec![1.0, 0.0];
        flip_bits(&mut probs, 1, 0.1);
        assert!((probs[0] - 0.9).abs() < 1e-12);
        assert!((probs[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sample(&[0.0, 1.0], &mut rng), 1);
        }
    }
}
