//! Jordan-Wigner encoding.
//!
//! a†ₛ ↦ ½(Xₛ − iYₛ) Z₀ ⋯ Zₛ₋₁ and aₛ ↦ ½(Xₛ + iYₛ) Z₀ ⋯ Zₛ₋₁.
//! Qubit `s` holds the occupation of orbital `s` directly.

use super::{FermionToQubit, check_site, ladder};
use crate::error::OpResult;
use crate::pauli::{Pauli, PauliTerm};
use crate::sum::PauliSum;

/// The Jordan-Wigner strategy. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct JordanWigner;

impl FermionToQubit for JordanWigner {
    fn name(&self) -> &'static str {
        "jordan-wigner"
    }

    fn transform_single_operator(
        &self,
        site: u32,
        is_creation: bool,
        num_qubits: u32,
    ) -> OpResult<PauliSum> {
        check_site(site, num_qubits)?;
        let string = |axis| (0..site).map(|j| (j, Pauli::Z)).chain([(site, axis)]);
        let c = PauliTerm::new(string(Pauli::X))?;
        let d = PauliTerm::new(string(Pauli::Y))?;
        Ok(ladder(c, d, is_creation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_single_operator_strings() {
        let a2 = JordanWigner.transform_single_operator(2, false, 3).unwrap();
        let expected: PauliSum = [
            ("Z0 Z1 X2".parse().unwrap(), Complex64::new(0.5, 0.0)),
            ("Z0 Z1 Y2".parse().unwrap(), Complex64::new(0.0, 0.5)),
        ]
        .into_iter()
        .collect();
        assert_eq!(a2, expected);

        let a0_dag = JordanWigner.transform_single_operator(0, true, 1).unwrap();
        assert_eq!(
            a0_dag.get(&"Y0".parse().unwrap()),
            Some(Complex64::new(0.0, -0.5))
        );
    }

    #[test]
    fn test_occupation_is_identity() {
        let occ = [true, true, false, false];
        assert_eq!(JordanWigner.encode_occupation(&occ), occ.to_vec());
    }
}
