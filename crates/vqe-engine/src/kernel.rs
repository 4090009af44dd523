//! Measurement kernels.
//!
//! Every non-negligible term of a qubit Hamiltonian becomes one kernel: a
//! circuit that rotates each factor into the Z basis and measures it. The
//! kernel list is built once at setup and shared read-only afterwards.
//!
//! ```text
//!   X_q  →  h(q)            ; measure q
//!   Y_q  →  sdg(q), h(q)    ; measure q
//!   Z_q  →  (nothing)       ; measure q
//!   I    →  no circuit, coefficient added directly
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vqe_ir::{Circuit, ClbitId, QubitId};
use vqe_ops::{Pauli, PauliSum, PauliTerm};

use crate::error::{EngineError, EngineResult};

/// Largest imaginary coefficient part tolerated when building kernels.
pub const IMAGINARY_TOLERANCE: f64 = 1e-10;

/// Classification of a measurement kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum KernelKind {
    /// A Pauli term that is executed and contributes to the energy.
    Normal,
    /// The identity term; contributes its coefficient without execution.
    Identity,
    /// Prepares `qubit` in |0⟩ or |1⟩ and measures it.
    ReadoutCalibration {
        /// Calibrated qubit.
        qubit: u32,
        /// `true` when the qubit is flipped to |1⟩ before measurement.
        prepared: bool,
    },
}

impl KernelKind {
    /// Whether kernels of this kind run on the accelerator.
    pub fn is_executed(&self) -> bool {
        !matches!(self, KernelKind::Identity)
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Normal => write!(f, "normal"),
            KernelKind::Identity => write!(f, "identity"),
            KernelKind::ReadoutCalibration { .. } => write!(f, "readout-error-calibration"),
        }
    }
}

/// One measurement circuit with its Hamiltonian coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementKernel {
    name: String,
    kind: KernelKind,
    coefficient: f64,
    term: PauliTerm,
    circuit: Circuit,
}

impl MeasurementKernel {
    /// Kernel name, unique within a kernel list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kernel classification.
    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// Real Hamiltonian coefficient. Zero for calibration kernels.
    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// The Pauli term this kernel measures.
    pub fn term(&self) -> &PauliTerm {
        &self.term
    }

    /// The measurement circuit. Empty for the identity kernel.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Whether this kernel contributes to the energy sum.
    pub fn contributes_energy(&self) -> bool {
        !matches!(self.kind, KernelKind::ReadoutCalibration { .. })
    }
}

impl fmt::Display for MeasurementKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<24} {:<26} {:+.12} ({} gates)",
            self.name,
            self.kind.to_string(),
            self.coefficient,
            self.circuit.num_gates()
        )
    }
}

/// Builds the kernel list for a qubit Hamiltonian.
#[derive(Debug, Clone, Default)]
pub struct KernelBuilder {
    num_qubits: Option<u32>,
    readout_calibration: bool,
}

impl KernelBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register width of every kernel circuit. Defaults to the Hamiltonian's width.
    #[must_use]
    pub fn with_num_qubits(mut self, num_qubits: u32) -> Self {
        self.num_qubits = Some(num_qubits);
        self
    }

    /// Append two calibration kernels per qubit.
    #[must_use]
    pub fn with_readout_calibration(mut self, enabled: bool) -> Self {
        self.readout_calibration = enabled;
        self
    }

    /// Build one kernel per term, in term order, then any calibration kernels.
    pub fn build(&self, hamiltonian: &PauliSum) -> EngineResult<Vec<MeasurementKernel>> {
        let num_qubits = self
            .num_qubits
            .unwrap_or_else(|| hamiltonian.num_qubits())
            .max(hamiltonian.num_qubits());

        let mut kernels = Vec::with_capacity(hamiltonian.len());
        for (term, coefficient) in hamiltonian.iter() {
            if coefficient.im.abs() > IMAGINARY_TOLERANCE {
                return Err(EngineError::NonRealCoefficient {
                    term: term.to_string(),
                    imaginary: coefficient.im,
                });
            }
            kernels.push(term_kernel(term, coefficient.re, num_qubits)?);
        }

        if self.readout_calibration {
            for qubit in 0..num_qubits {
                kernels.push(calibration_kernel(qubit, false, num_qubits)?);
                kernels.push(calibration_kernel(qubit, true, num_qubits)?);
            }
        }

        debug!(
            kernels = kernels.len(),
            num_qubits,
            readout_calibration = self.readout_calibration,
            "built measurement kernels"
        );
        Ok(kernels)
    }
}

fn term_kernel(term: &PauliTerm, coefficient: f64, num_qubits: u32) -> EngineResult<MeasurementKernel> {
    let name = term.label();
    if term.is_identity() {
        return Ok(MeasurementKernel {
            circuit: Circuit::with_size(name.clone(), num_qubits, num_qubits),
            name,
            kind: KernelKind::Identity,
            coefficient,
            term: term.clone(),
        });
    }

    let mut circuit = Circuit::with_size(name.clone(), num_qubits, num_qubits);
    for factor in term.factors() {
        let q = QubitId(factor.site);
        match factor.axis {
            Pauli::X => {
                circuit.h(q)?;
            }
            Pauli::Y => {
                circuit.sdg(q)?.h(q)?;
            }
            Pauli::Z => {}
        }
    }
    for factor in term.factors() {
        circuit.measure(QubitId(factor.site), ClbitId(factor.site))?;
    }

    Ok(MeasurementKernel {
        name,
        kind: KernelKind::Normal,
        coefficient,
        term: term.clone(),
        circuit,
    })
}

fn calibration_kernel(qubit: u32, prepared: bool, num_qubits: u32) -> EngineResult<MeasurementKernel> {
    let name = format!("readout_q{qubit}_{}", u8::from(prepared));
    let mut circuit = Circuit::with_size(name.clone(), num_qubits, num_qubits);
    if prepared {
        circuit.x(QubitId(qubit))?;
    }
    circuit.measure(QubitId(qubit), ClbitId(qubit))?;
    Ok(MeasurementKernel {
        name,
        kind: KernelKind::ReadoutCalibration { qubit, prepared },
        coefficient: 0.0,
        term: PauliTerm::single(qubit, Pauli::Z),
        circuit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn term(s: &str) -> PauliTerm {
        s.parse().unwrap()
    }

    #[test]
    fn test_basis_rotations() {
        let mut h = PauliSum::zero();
        h.add_term(term("X0 Y1 Z2"), Complex64::new(0.25, 0.0));
        let kernels = KernelBuilder::new().build(&h).unwrap();
        assert_eq!(kernels.len(), 1);

        let kernel = &kernels[0];
        assert_eq!(kernel.name(), "X0Y1Z2");
        assert_eq!(kernel.kind(), KernelKind::Normal);
        assert!((kernel.coefficient() - 0.25).abs() < 1e-15);

        let names: Vec<&str> = kernel.circuit().instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["h", "sdg", "h", "measure", "measure", "measure"]);
        assert_eq!(
            kernel.circuit().measured_qubits(),
            vec![QubitId(0), QubitId(1), QubitId(2)]
        );
    }

    #[test]
    fn test_identity_kernel_has_no_gates() {
        let mut h = PauliSum::identity(-0.5);
        h.add_term(term("Z0"), Complex64::new(1.0, 0.0));
        let kernels = KernelBuilder::new().build(&h).unwrap();

        let identity = kernels.iter().find(|k| k.kind() == KernelKind::Identity).unwrap();
        assert!(identity.circuit().is_empty());
        assert!((identity.coefficient() + 0.5).abs() < 1e-15);
        assert!(!identity.kind().is_executed());
    }

    #[test]
    fn test_imaginary_coefficient_rejected() {
        let mut h = PauliSum::zero();
        h.add_term(term("X0 Y1"), Complex64::new(1.0, 0.3));
        let err = KernelBuilder::new().build(&h).unwrap_err();
        assert!(matches!(err, EngineError::NonRealCoefficient { .. }));
    }

    #[test]
    fn test_calibration_kernels() {
        let h = PauliSum::from_term(term("Z0 Z1"), 1.0);
        let kernels = KernelBuilder::new()
            .with_readout_calibration(true)
            .build(&h)
            .unwrap();
        assert_eq!(kernels.len(), 1 + 4);

        let calibration: Vec<_> = kernels.iter().filter(|k| !k.contributes_energy()).collect();
        let names: Vec<&str> = calibration.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec!["readout_q0_0", "readout_q0_1", "readout_q1_0", "readout_q1_1"]
        );
        assert_eq!(calibration[1].circuit().instructions()[0].name(), "x");
        assert_eq!(
            calibration[1].kind(),
            KernelKind::ReadoutCalibration {
                qubit: 0,
                prepared: true
            }
        );
    }

    #[test]
    fn test_explicit_width() {
        let h = PauliSum::from_term(term("Z0"), 1.0);
        let kernels = KernelBuilder::new().with_num_qubits(4).build(&h).unwrap();
        assert_eq!(kernels[0].circuit().num_qubits(), 4);
    }
}
