//! State-preparation circuits.
//!
//! An [`Ansatz`] is a symbolic circuit together with the ordered list of its
//! parameter names. Binding a parameter vector is pure and yields a new
//! concrete circuit; the template is never modified.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use vqe_ir::{Bindings, Circuit, ParameterExpression, QubitId};
use vqe_ops::{
    FermionHamiltonian, FermionTerm, FermionToQubit, OpError, Pauli, PauliTerm, TOLERANCE,
};

use crate::error::{EngineError, EngineResult};

/// Bind `values` to `names` in order and evaluate `template`.
pub fn evaluate_parameters(
    template: &Circuit,
    names: &[String],
    values: &[f64],
) -> EngineResult<Circuit> {
    if names.len() != values.len() {
        return Err(EngineError::ParameterCount {
            expected: names.len(),
            got: values.len(),
        });
    }
    let bindings: Bindings = names.iter().cloned().zip(values.iter().copied()).collect();
    Ok(template.bind_parameters(&bindings)?)
}

/// A parameterized state-preparation circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct Ansatz {
    circuit: Circuit,
    parameters: Vec<String>,
}

impl Ansatz {
    /// Wrap `circuit`, binding its symbols in the order of `parameters`.
    ///
    /// Every symbol of the circuit must be listed.
    pub fn new(circuit: Circuit, parameters: Vec<String>) -> EngineResult<Self> {
        if let Some(missing) = circuit
            .parameters()
            .into_iter()
            .find(|symbol| !parameters.contains(symbol))
        {
            return Err(vqe_ir::IrError::UnboundParameter(missing).into());
        }
        Ok(Self {
            circuit,
            parameters,
        })
    }

    /// Wrap `circuit` with its symbols in lexicographic order.
    pub fn from_circuit(circuit: Circuit) -> Self {
        let parameters = circuit.parameters().into_iter().collect();
        Self {
            circuit,
            parameters,
        }
    }

    /// The empty circuit on `num_qubits`; measures the vacuum state.
    pub fn identity(num_qubits: u32) -> Self {
        Self::from_circuit(Circuit::with_size("identity", num_qubits, 0))
    }

    /// Occupy the lowest `electrons` orbitals, encoded by `strategy`.
    pub fn hartree_fock(
        num_qubits: u32,
        electrons: u32,
        strategy: &dyn FermionToQubit,
    ) -> EngineResult<Self> {
        Ok(Self::from_circuit(reference_state(
            "hartree_fock",
            num_qubits,
            electrons,
            strategy,
        )?))
    }

    /// Unitary coupled cluster with singles and doubles on top of the
    /// Hartree-Fock state.
    ///
    /// One parameter `theta{k}` per excitation, singles first. Each
    /// generator `θ(T − T†)` is mapped by `strategy` and exponentiated one
    /// Pauli term at a time.
    pub fn uccsd(
        num_qubits: u32,
        electrons: u32,
        strategy: &dyn FermionToQubit,
    ) -> EngineResult<Self> {
        let mut circuit = reference_state("uccsd", num_qubits, electrons, strategy)?;
        let excitations = Excitation::enumerate(num_qubits, electrons);
        let mut parameters = Vec::with_capacity(excitations.len());

        for (k, excitation) in excitations.iter().enumerate() {
            let symbol = format!("theta{k}");
            let generator = strategy.transform(&excitation.generator(), num_qubits)?;
            // T − T† is anti-Hermitian: every mapped coefficient is imaginary.
            for (term, coefficient) in generator.iter() {
                if term.is_identity() || coefficient.im.abs() < TOLERANCE {
                    continue;
                }
                append_pauli_rotation(&mut circuit, term, coefficient.im, &symbol)?;
            }
            parameters.push(symbol);
        }

        debug!(
            strategy = strategy.name(),
            num_qubits,
            electrons,
            parameters = parameters.len(),
            gates = circuit.num_gates(),
            "built UCCSD ansatz"
        );
        Self::new(circuit, parameters)
    }

    /// The symbolic template.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Parameter names in binding order.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    /// Number of variational parameters.
    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    /// Register width of the template.
    pub fn num_qubits(&self) -> u32 {
        u32::try_from(self.circuit.num_qubits()).unwrap_or(u32::MAX)
    }

    /// Concrete circuit for `values`.
    pub fn bind(&self, values: &[f64]) -> EngineResult<Circuit> {
        evaluate_parameters(&self.circuit, &self.parameters, values)
    }
}

fn reference_state(
    name: &str,
    num_qubits: u32,
    electrons: u32,
    strategy: &dyn FermionToQubit,
) -> EngineResult<Circuit> {
    if electrons > num_qubits {
        return Err(OpError::QubitIndexOutOfRange {
            site: electrons - 1,
            num_qubits,
        }
        .into());
    }
    let occupied: Vec<bool> = (0..num_qubits).map(|site| site < electrons).collect();
    let encoded = strategy.encode_occupation(&occupied);

    let mut circuit = Circuit::with_size(name, num_qubits, 0);
    for (qubit, _) in (0u32..).zip(&encoded).filter(|(_, set)| **set) {
        circuit.x(QubitId(qubit))?;
    }
    Ok(circuit)
}

/// Append exp(i·weight·θ·P) for the symbol θ.
///
/// Each factor is rotated into the Z basis, the parity is collected on the
/// last site by a CNOT ladder, and Rz(−2·weight·θ) applies the phase.
fn append_pauli_rotation(
    circuit: &mut Circuit,
    term: &PauliTerm,
    weight: f64,
    symbol: &str,
) -> EngineResult<()> {
    let sites: Vec<QubitId> = term.sites().map(QubitId).collect();
    let Some(&last) = sites.last() else {
        return Ok(());
    };

    for factor in term.factors() {
        match factor.axis {
            Pauli::X => {
                circuit.h(QubitId(factor.site))?;
            }
            Pauli::Y => {
                circuit.rx(FRAC_PI_2, QubitId(factor.site))?;
            }
            Pauli::Z => {}
        }
    }
    for pair in sites.windows(2) {
        circuit.cx(pair[0], pair[1])?;
    }

    let angle = ParameterExpression::constant(-2.0 * weight) * ParameterExpression::symbol(symbol);
    circuit.rz(angle, last)?;

    for pair in sites.windows(2).rev() {
        circuit.cx(pair[0], pair[1])?;
    }
    for factor in term.factors() {
        match factor.axis {
            Pauli::X => {
                circuit.h(QubitId(factor.site))?;
            }
            Pauli::Y => {
                circuit.rx(-FRAC_PI_2, QubitId(factor.site))?;
            }
            Pauli::Z => {}
        }
    }
    Ok(())
}

/// An excitation from occupied to virtual orbitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Excitation {
    Single { from: u32, to: u32 },
    Double { from: (u32, u32), to: (u32, u32) },
}

impl Excitation {
    /// Singles `i → a`, then doubles `i<j → a<b`.
    fn enumerate(num_qubits: u32, electrons: u32) -> Vec<Excitation> {
        let occupied = 0..electrons.min(num_qubits);
        let virtuals = electrons.min(num_qubits)..num_qubits;

        let mut out = Vec::new();
        for i in occupied.clone() {
            for a in virtuals.clone() {
                out.push(Excitation::Single { from: i, to: a });
            }
        }
        for i in occupied.clone() {
            for j in i + 1..occupied.end {
                for a in virtuals.clone() {
                    for b in a + 1..virtuals.end {
                        out.push(Excitation::Double {
                            from: (i, j),
                            to: (a, b),
                        });
                    }
                }
            }
        }
        out
    }

    /// T − T† for this excitation.
    fn generator(&self) -> FermionHamiltonian {
        let excitation = match *self {
            Excitation::Single { from, to } => {
                FermionTerm::from_pairs(1.0, [(to, true), (from, false)])
            }
            Excitation::Double {
                from: (i, j),
                to: (a, b),
            } => FermionTerm::from_pairs(1.0, [(a, true), (b, true), (j, false), (i, false)]),
        };
        let deexcitation = excitation.hermitian_conjugate();
        let negated = FermionTerm::new(
            -deexcitation.coefficient(),
            deexcitation.factors().to_vec(),
        );
        FermionHamiltonian::new(vec![excitation, negated])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vqe_ops::{BravyiKitaev, JordanWigner};

    #[test]
    fn test_evaluate_parameters_checks_count() {
        let mut template = Circuit::with_size("t", 1, 0);
        template.ry(ParameterExpression::symbol("a"), QubitId(0)).unwrap();
        let names = vec!["a".to_string()];

        let err = evaluate_parameters(&template, &names, &[0.1, 0.2]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ParameterCount {
                expected: 1,
                got: 2
            }
        ));

        let bound = evaluate_parameters(&template, &names, &[0.3]).unwrap();
        assert!(!bound.is_parameterized());
        assert!(template.is_parameterized());
    }

    #[test]
    fn test_new_rejects_unlisted_symbol() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.rz(ParameterExpression::symbol("phi"), QubitId(0)).unwrap();
        assert!(Ansatz::new(circuit, vec!["theta".into()]).is_err());
    }

    #[test]
    fn test_hartree_fock_encodings() {
        let jw = Ansatz::hartree_fock(4, 2, &JordanWigner).unwrap();
        let jw_targets: Vec<u32> = jw
            .circuit()
            .instructions()
            .iter()
            .map(|i| i.qubits[0].0)
            .collect();
        assert_eq!(jw_targets, vec![0, 1]);

        let bk = Ansatz::hartree_fock(4, 2, &BravyiKitaev::new()).unwrap();
        let bk_targets: Vec<u32> = bk
            .circuit()
            .instructions()
            .iter()
            .map(|i| i.qubits[0].0)
            .collect();
        assert_eq!(bk_targets, vec![0]);
        assert_eq!(bk.num_parameters(), 0);
    }

    #[test]
    fn test_too_many_electrons() {
        assert!(Ansatz::hartree_fock(2, 3, &JordanWigner).is_err());
    }

    #[test]
    fn test_excitation_enumeration() {
        let excitations = Excitation::enumerate(4, 2);
        assert_eq!(excitations.len(), 5);
        assert_eq!(excitations[0], Excitation::Single { from: 0, to: 2 });
        assert_eq!(
            excitations[4],
            Excitation::Double {
                from: (0, 1),
                to: (2, 3)
            }
        );
    }

    #[test]
    fn test_generator_is_anti_hermitian() {
        let generator = Excitation::Double {
            from: (0, 1),
            to: (2, 3),
        }
        .generator();
        let mapped = JordanWigner.transform(&generator, 4).unwrap();
        assert!(!mapped.is_empty());
        for (_, coefficient) in mapped.iter() {
            assert!(coefficient.re.abs() < 1e-12);
        }
    }

    #[test]
    fn test_uccsd_parameters() {
        let ansatz = Ansatz::uccsd(4, 2, &JordanWigner).unwrap();
        assert_eq!(
            ansatz.parameter_names(),
            &["theta0", "theta1", "theta2", "theta3", "theta4"]
        );
        assert!(ansatz.circuit().is_parameterized());

        let bound = ansatz.bind(&[0.0; 5]).unwrap();
        assert!(!bound.is_parameterized());
        assert!(ansatz.bind(&[0.0; 4]).is_err());
    }
}
