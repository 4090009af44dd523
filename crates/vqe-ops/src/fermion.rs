//! Second-quantized fermionic operators.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A creation or annihilation operator on one spin-orbital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FermionOperator {
    /// Spin-orbital index.
    pub site: u32,
    /// `true` for a†, `false` for a.
    pub is_creation: bool,
}

impl FermionOperator {
    /// Creation operator a†ₛ.
    pub fn creation(site: u32) -> Self {
        Self {
            site,
            is_creation: true,
        }
    }

    /// Annihilation operator aₛ.
    pub fn annihilation(site: u32) -> Self {
        Self {
            site,
            is_creation: false,
        }
    }

    /// The adjoint operator.
    #[must_use]
    pub fn dagger(self) -> Self {
        Self {
            site: self.site,
            is_creation: !self.is_creation,
        }
    }
}

impl fmt::Display for FermionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_creation {
            write!(f, "{}^", self.site)
        } else {
            write!(f, "{}", self.site)
        }
    }
}

/// A coefficient times an ordered product of ladder operators.
///
/// Factor order is significant and never rearranged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FermionTerm {
    coefficient: Complex64,
    factors: Vec<FermionOperator>,
}

impl FermionTerm {
    /// Create a term.
    pub fn new(coefficient: impl Into<Complex64>, factors: Vec<FermionOperator>) -> Self {
        Self {
            coefficient: coefficient.into(),
            factors,
        }
    }

    /// A constant term with no operators.
    pub fn constant(coefficient: impl Into<Complex64>) -> Self {
        Self::new(coefficient, Vec::new())
    }

    /// Build from `(site, is_creation)` pairs.
    pub fn from_pairs(
        coefficient: impl Into<Complex64>,
        pairs: impl IntoIterator<Item = (u32, bool)>,
    ) -> Self {
        let factors = pairs
            .into_iter()
            .map(|(site, is_creation)| FermionOperator { site, is_creation })
            .collect();
        Self::new(coefficient, factors)
    }

    /// The term coefficient.
    pub fn coefficient(&self) -> Complex64 {
        self.coefficient
    }

    /// Operators in product order.
    pub fn factors(&self) -> &[FermionOperator] {
        &self.factors
    }

    /// Check whether the term has no operators.
    pub fn is_constant(&self) -> bool {
        self.factors.is_empty()
    }

    /// Highest site touched, if any.
    pub fn max_site(&self) -> Option<u32> {
        self.factors.iter().map(|f| f.site).max()
    }

    /// The Hermitian conjugate: reversed order, flipped ladders, conjugated coefficient.
    #[must_use]
    pub fn hermitian_conjugate(&self) -> Self {
        Self {
            coefficient: self.coefficient.conj(),
            factors: self.factors.iter().rev().map(|f| f.dagger()).collect(),
        }
    }
}

impl fmt::Display for FermionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient.im == 0.0 {
            write!(f, "{}", self.coefficient.re)?;
        } else {
            write!(f, "({},{})", self.coefficient.re, self.coefficient.im)?;
        }
        for op in &self.factors {
            write!(f, " [{op}]")?;
        }
        Ok(())
    }
}

/// An ordered sum of fermion terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FermionHamiltonian {
    terms: Vec<FermionTerm>,
}

impl FermionHamiltonian {
    /// Create from a list of terms.
    pub fn new(terms: Vec<FermionTerm>) -> Self {
        Self { terms }
    }

    /// Append a term.
    pub fn push(&mut self, term: FermionTerm) {
        self.terms.push(term);
    }

    /// Terms in insertion order.
    pub fn terms(&self) -> &[FermionTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of spin-orbitals referenced (highest site + 1).
    pub fn num_sites(&self) -> u32 {
        self.terms
            .iter()
            .filter_map(FermionTerm::max_site)
            .max()
            .map_or(0, |m| m + 1)
    }
}

impl FromIterator<FermionTerm> for FermionHamiltonian {
    fn from_iter<I: IntoIterator<Item = FermionTerm>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for FermionHamiltonian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            writeln!(f, "{term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hermitian_conjugate() {
        let term = FermionTerm::from_pairs(Complex64::new(1.0, 2.0), [(2, true), (0, false)]);
        let dag = term.hermitian_conjugate();
        assert_eq!(dag.coefficient(), Complex64::new(1.0, -2.0));
        assert_eq!(
            dag.factors(),
            &[FermionOperator::creation(0), FermionOperator::annihilation(2)]
        );
        assert_eq!(dag.hermitian_conjugate(), term);
    }

    #[test]
    fn test_num_sites() {
        let h: FermionHamiltonian = [
            FermionTerm::constant(0.7),
            FermionTerm::from_pairs(1.0, [(3, true), (1, false)]),
        ]
        .into_iter()
        .collect();
        assert_eq!(h.num_sites(), 4);
        assert_eq!(h.len(), 2);
    }
}
