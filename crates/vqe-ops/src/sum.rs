//! Weighted sums of Pauli terms.
//!
//! H = Σᵢ cᵢ Pᵢ with complex cᵢ. Keys are unique; coefficients whose
//! magnitude falls below [`TOLERANCE`] are dropped on every update, so a sum
//! never carries numerically dead terms.

use num_complex::Complex64;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::pauli::PauliTerm;

/// Magnitude below which a coefficient is treated as zero.
pub const TOLERANCE: f64 = 1e-12;

/// A sum of Pauli terms with complex coefficients.
#[derive(Debug, Clone, Default)]
pub struct PauliSum {
    terms: BTreeMap<PauliTerm, Complex64>,
}

impl PauliSum {
    /// The empty (zero) operator.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A multiple of the identity.
    pub fn identity(coefficient: impl Into<Complex64>) -> Self {
        Self::from_term(PauliTerm::identity(), coefficient)
    }

    /// A single weighted term.
    pub fn from_term(term: PauliTerm, coefficient: impl Into<Complex64>) -> Self {
        let mut sum = Self::zero();
        sum.add_term(term, coefficient.into());
        sum
    }

    /// Accumulate `coefficient * term` into the sum.
    pub fn add_term(&mut self, term: PauliTerm, coefficient: Complex64) {
        match self.terms.entry(term) {
            btree_map::Entry::Occupied(mut entry) => {
                *entry.get_mut() += coefficient;
                if entry.get().norm() < TOLERANCE {
                    entry.remove();
                }
            }
            btree_map::Entry::Vacant(entry) => {
                if coefficient.norm() >= TOLERANCE {
                    entry.insert(coefficient);
                }
            }
        }
    }

    /// Number of stored terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether the sum is zero.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over `(term, coefficient)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&PauliTerm, &Complex64)> {
        self.terms.iter()
    }

    /// Coefficient of `term`, if present.
    pub fn get(&self, term: &PauliTerm) -> Option<Complex64> {
        self.terms.get(term).copied()
    }

    /// Coefficient of the identity term, zero if absent.
    pub fn identity_coefficient(&self) -> Complex64 {
        self.get(&PauliTerm::identity()).unwrap_or_default()
    }

    /// Largest imaginary part magnitude across all coefficients.
    pub fn max_imaginary(&self) -> f64 {
        self.terms.values().map(|c| c.im.abs()).fold(0.0, f64::max)
    }

    /// Check whether every coefficient is real within `tolerance`.
    pub fn is_real(&self, tolerance: f64) -> bool {
        self.max_imaginary() < tolerance
    }

    /// Number of qubits spanned (highest site + 1).
    pub fn num_qubits(&self) -> u32 {
        self.terms
            .keys()
            .filter_map(PauliTerm::max_site)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Multiply every coefficient by `factor`.
    #[must_use]
    pub fn scale(&self, factor: impl Into<Complex64>) -> Self {
        let factor = factor.into();
        let mut out = Self::zero();
        for (term, c) in &self.terms {
            out.add_term(term.clone(), c * factor);
        }
        out
    }

    /// Operator product `self · rhs`.
    #[must_use]
    pub fn multiply(&self, rhs: &PauliSum) -> Self {
        let mut out = Self::zero();
        for (ta, ca) in &self.terms {
            for (tb, cb) in &rhs.terms {
                let (term, phase) = ta.multiply(tb);
                out.add_term(term, ca * cb * phase);
            }
        }
        out
    }

    /// Hermitian adjoint (Pauli terms are self-adjoint, so conjugate coefficients).
    #[must_use]
    pub fn adjoint(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(t, c)| (t.clone(), c.conj()))
                .collect(),
        }
    }

    /// Compare two sums term by term within `tolerance`.
    pub fn approx_eq(&self, other: &PauliSum, tolerance: f64) -> bool {
        let covers = |a: &PauliSum, b: &PauliSum| {
            a.terms.iter().all(|(term, ca)| {
                let cb = b.get(term).unwrap_or_default();
                (ca - cb).norm() < tolerance
            })
        };
        covers(self, other) && covers(other, self)
    }
}

impl PartialEq for PauliSum {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, TOLERANCE)
    }
}

impl FromIterator<(PauliTerm, Complex64)> for PauliSum {
    fn from_iter<I: IntoIterator<Item = (PauliTerm, Complex64)>>(iter: I) -> Self {
        let mut sum = Self::zero();
        for (term, c) in iter {
            sum.add_term(term, c);
        }
        sum
    }
}

impl AddAssign<&PauliSum> for PauliSum {
    fn add_assign(&mut self, rhs: &PauliSum) {
        for (term, c) in &rhs.terms {
            self.add_term(term.clone(), *c);
        }
    }
}

impl AddAssign for PauliSum {
    fn add_assign(&mut self, rhs: PauliSum) {
        for (term, c) in rhs.terms {
            self.add_term(term, c);
        }
    }
}

impl Add for &PauliSum {
    type Output = PauliSum;

    fn add(self, rhs: &PauliSum) -> PauliSum {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl Add for PauliSum {
    type Output = PauliSum;

    fn add(mut self, rhs: PauliSum) -> PauliSum {
        self += rhs;
        self
    }
}

impl Neg for &PauliSum {
    type Output = PauliSum;

    fn neg(self) -> PauliSum {
        self.scale(-1.0)
    }
}

impl Neg for PauliSum {
    type Output = PauliSum;

    fn neg(self) -> PauliSum {
        -&self
    }
}

impl Sub for &PauliSum {
    type Output = PauliSum;

    fn sub(self, rhs: &PauliSum) -> PauliSum {
        self + &(-rhs)
    }
}

impl Mul for &PauliSum {
    type Output = PauliSum;

    fn mul(self, rhs: &PauliSum) -> PauliSum {
        self.multiply(rhs)
    }
}

impl Mul<Complex64> for &PauliSum {
    type Output = PauliSum;

    fn mul(self, rhs: Complex64) -> PauliSum {
        self.scale(rhs)
    }
}

impl fmt::Display for PauliSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return writeln!(f, "0");
        }
        for (term, c) in &self.terms {
            if c.im.abs() < TOLERANCE {
                writeln!(f, "{:+.12} {term}", c.re)?;
            } else {
                writeln!(f, "({:+.12}, {:+.12}) {term}", c.re, c.im)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pauli::Pauli;

    fn term(s: &str) -> PauliTerm {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_merges_and_prunes() {
        let mut sum = PauliSum::from_term(term("X0 Z1"), 0.5);
        sum.add_term(term("Z1 X0"), Complex64::new(-0.5, 0.0));
        assert!(sum.is_empty());
    }

    #[test]
    fn test_add_negation_is_empty() {
        let p = PauliSum::from_term(term("X0 Y1"), Complex64::new(0.3, -0.2))
            + PauliSum::identity(1.5);
        assert!((&p + &(-&p)).is_empty());
        assert!((&p - &p).is_empty());
    }

    #[test]
    fn test_multiply_single_sites() {
        let x = PauliSum::from_term(PauliTerm::single(0, Pauli::X), 1.0);
        let y = PauliSum::from_term(PauliTerm::single(0, Pauli::Y), 1.0);
        let xy = &x * &y;
        assert_eq!(xy, PauliSum::from_term(term("Z0"), Complex64::i()));
        let yx = &y * &x;
        assert_eq!(yx, PauliSum::from_term(term("Z0"), -Complex64::i()));
    }

    #[test]
    fn test_identity_and_width() {
        let sum = PauliSum::identity(-0.25) + PauliSum::from_term(term("Z3"), 1.0);
        assert_eq!(sum.identity_coefficient(), Complex64::new(-0.25, 0.0));
        assert_eq!(sum.num_qubits(), 4);
        assert!(sum.is_real(TOLERANCE));
    }

    #[test]
    fn test_equality_tolerance() {
        let a = PauliSum::from_term(term("X0"), 1.0);
        let b = PauliSum::from_term(term("X0"), 1.0 + 1e-14);
        let c = PauliSum::from_term(term("X0"), 1.0 + 1e-6);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.approx_eq(&c, 1e-5));
    }

    #[test]
    fn test_display() {
        let sum = PauliSum::from_term(term("Y0 Y1"), -1.585);
        assert_eq!(sum.to_string(), "-1.585000000000 Y0 Y1\n");
    }
}
