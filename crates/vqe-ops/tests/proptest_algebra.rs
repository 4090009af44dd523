//! Property-based tests for Pauli-sum algebra and the transformations.

use num_complex::Complex64;
use proptest::prelude::*;
use vqe_ops::{
    Encoding, FermionHamiltonian, FermionTerm, FermionToQubit, Pauli, PauliSum, PauliTerm,
    Transformation,
};

const MAX_QUBITS: u32 = 5;

fn arb_pauli() -> impl Strategy<Value = Pauli> {
    prop_oneof![Just(Pauli::X), Just(Pauli::Y), Just(Pauli::Z)]
}

/// A Pauli term on up to `MAX_QUBITS` sites (each site at most once).
fn arb_term() -> impl Strategy<Value = PauliTerm> {
    prop::collection::vec(prop::option::of(arb_pauli()), MAX_QUBITS as usize).prop_map(|axes| {
        let factors = axes
            .into_iter()
            .enumerate()
            .filter_map(|(site, axis)| axis.map(|a| (site as u32, a)));
        PauliTerm::new(factors).unwrap()
    })
}

fn arb_coefficient() -> impl Strategy<Value = Complex64> {
    (-2.0_f64..2.0, -2.0_f64..2.0).prop_map(|(re, im)| Complex64::new(re, im))
}

fn arb_sum() -> impl Strategy<Value = PauliSum> {
    prop::collection::vec((arb_term(), arb_coefficient()), 0..8)
        .prop_map(|entries| entries.into_iter().collect())
}

/// A fermion term with 2 or 4 ladder operators on up to `MAX_QUBITS` sites.
fn arb_fermion_term() -> impl Strategy<Value = FermionTerm> {
    let pair = (0..MAX_QUBITS, any::<bool>());
    prop_oneof![
        prop::collection::vec(pair.clone(), 2),
        prop::collection::vec(pair, 4),
    ]
    .prop_flat_map(|ops| (Just(ops), -1.0_f64..1.0))
    .prop_map(|(ops, c)| FermionTerm::from_pairs(c, ops))
}

proptest! {
    #[test]
    fn addition_is_commutative(a in arb_sum(), b in arb_sum()) {
        prop_assert!((&a + &b).approx_eq(&(&b + &a), 1e-10));
    }

    #[test]
    fn addition_is_associative(a in arb_sum(), b in arb_sum(), c in arb_sum()) {
        let left = &(&a + &b) + &c;
        let right = &a + &(&b + &c);
        prop_assert!(left.approx_eq(&right, 1e-10));
    }

    #[test]
    fn sum_minus_itself_is_empty(a in arb_sum()) {
        prop_assert!((&a + &(-&a)).is_empty());
    }

    #[test]
    fn no_negligible_coefficients_survive(a in arb_sum(), b in arb_sum()) {
        let product = &a * &b;
        for (_, c) in product.iter() {
            prop_assert!(c.norm() >= vqe_ops::TOLERANCE);
        }
    }

    #[test]
    fn term_squares_to_identity(t in arb_term()) {
        let (product, phase) = t.multiply(&t);
        prop_assert!(product.is_identity());
        prop_assert_eq!(phase, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn multiplication_is_associative(a in arb_term(), b in arb_term(), c in arb_term()) {
        let (ab, p1) = a.multiply(&b);
        let (ab_c, p2) = ab.multiply(&c);
        let (bc, q1) = b.multiply(&c);
        let (a_bc, q2) = a.multiply(&bc);
        prop_assert_eq!(ab_c, a_bc);
        prop_assert!((p1 * p2 - q1 * q2).norm() < 1e-12);
    }

    #[test]
    fn conjugate_symmetric_hamiltonians_map_to_real_sums(
        terms in prop::collection::vec(arb_fermion_term(), 1..6),
        bk in any::<bool>(),
    ) {
        let mut hamiltonian = FermionHamiltonian::default();
        for term in &terms {
            hamiltonian.push(term.clone());
            hamiltonian.push(term.hermitian_conjugate());
        }
        let encoding = if bk { Encoding::BravyiKitaev } else { Encoding::JordanWigner };
        let result = Transformation::new(encoding)
            .transform(&hamiltonian, MAX_QUBITS)
            .unwrap();
        prop_assert!(result.is_real(1e-10), "imaginary part {}", result.max_imaginary());
    }

    #[test]
    fn transform_of_adjoint_is_adjoint_of_transform(term in arb_fermion_term(), bk in any::<bool>()) {
        let encoding = if bk { Encoding::BravyiKitaev } else { Encoding::JordanWigner };
        let t = Transformation::new(encoding);
        let forward = t.transform_term(&term, MAX_QUBITS).unwrap();
        let backward = t.transform_term(&term.hermitian_conjugate(), MAX_QUBITS).unwrap();
        prop_assert!(forward.adjoint().approx_eq(&backward, 1e-10));
    }
}
