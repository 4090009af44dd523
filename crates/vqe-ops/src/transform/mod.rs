//! Fermion-to-qubit transformations.
//!
//! Every strategy maps a single ladder operator to a [`PauliSum`]; a term is
//! the coefficient times the product of its mapped factors (in factor order)
//! and a Hamiltonian is the sum over its terms. Only the single-operator map
//! differs between strategies.

mod bravyi_kitaev;
mod jordan_wigner;

pub use bravyi_kitaev::{BkSets, BravyiKitaev, FenwickTree};
pub use jordan_wigner::JordanWigner;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{OpError, OpResult};
use crate::fermion::{FermionHamiltonian, FermionTerm};
use crate::pauli::PauliTerm;
use crate::sum::PauliSum;

/// A fermion-to-qubit encoding.
pub trait FermionToQubit: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// Map a†ₛ (`is_creation`) or aₛ onto `num_qubits` qubits.
    fn transform_single_operator(
        &self,
        site: u32,
        is_creation: bool,
        num_qubits: u32,
    ) -> OpResult<PauliSum>;

    /// Encode an orbital occupation vector as a computational basis state.
    fn encode_occupation(&self, occupied: &[bool]) -> Vec<bool> {
        occupied.to_vec()
    }

    /// Map one term: coefficient times the ordered product of its factors.
    fn transform_term(&self, term: &FermionTerm, num_qubits: u32) -> OpResult<PauliSum> {
        for op in term.factors() {
            check_site(op.site, num_qubits)?;
        }
        let mut product = PauliSum::identity(term.coefficient());
        for op in term.factors() {
            let mapped = self.transform_single_operator(op.site, op.is_creation, num_qubits)?;
            product = product.multiply(&mapped);
        }
        Ok(product)
    }

    /// Map a whole Hamiltonian.
    fn transform(&self, hamiltonian: &FermionHamiltonian, num_qubits: u32) -> OpResult<PauliSum> {
        let mut total = PauliSum::zero();
        for term in hamiltonian.terms() {
            total += self.transform_term(term, num_qubits)?;
        }
        debug!(
            strategy = self.name(),
            fermion_terms = hamiltonian.len(),
            pauli_terms = total.len(),
            num_qubits,
            "transformed fermion Hamiltonian"
        );
        Ok(total)
    }
}

pub(crate) fn check_site(site: u32, num_qubits: u32) -> OpResult<()> {
    if site >= num_qubits {
        return Err(OpError::QubitIndexOutOfRange { site, num_qubits });
    }
    Ok(())
}

/// Combine the two Majorana strings of a site into a ladder operator:
/// a† = ½(c − i·d), a = ½(c + i·d).
pub(crate) fn ladder(majorana_c: PauliTerm, majorana_d: PauliTerm, is_creation: bool) -> PauliSum {
    let sign = if is_creation { -1.0 } else { 1.0 };
    let mut sum = PauliSum::from_term(majorana_c, 0.5);
    sum.add_term(majorana_d, Complex64::new(0.0, 0.5 * sign));
    sum
}

/// Which encoding to use, as named in configuration and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    /// Jordan-Wigner.
    #[default]
    #[serde(alias = "jw")]
    JordanWigner,
    /// Bravyi-Kitaev.
    #[serde(alias = "bk")]
    BravyiKitaev,
}

impl FromStr for Encoding {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jw" | "jordan-wigner" | "jordan_wigner" => Ok(Encoding::JordanWigner),
            "bk" | "bravyi-kitaev" | "bravyi_kitaev" => Ok(Encoding::BravyiKitaev),
            other => Err(OpError::InvalidOperator(format!(
                "unknown encoding '{other}' (expected jw or bk)"
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::JordanWigner => f.write_str("jordan-wigner"),
            Encoding::BravyiKitaev => f.write_str("bravyi-kitaev"),
        }
    }
}

/// A concrete transformation strategy.
#[derive(Debug, Clone)]
pub enum Transformation {
    /// Jordan-Wigner strategy.
    JordanWigner(JordanWigner),
    /// Bravyi-Kitaev strategy.
    BravyiKitaev(BravyiKitaev),
}

impl Transformation {
    /// Build the strategy for `encoding`.
    pub fn new(encoding: Encoding) -> Self {
        match encoding {
            Encoding::JordanWigner => Transformation::JordanWigner(JordanWigner),
            Encoding::BravyiKitaev => Transformation::BravyiKitaev(BravyiKitaev::new()),
        }
    }

    /// The encoding this strategy implements.
    pub fn encoding(&self) -> Encoding {
        match self {
            Transformation::JordanWigner(_) => Encoding::JordanWigner,
            Transformation::BravyiKitaev(_) => Encoding::BravyiKitaev,
        }
    }

    fn strategy(&self) -> &dyn FermionToQubit {
        match self {
            Transformation::JordanWigner(s) => s as &dyn FermionToQubit,
            Transformation::BravyiKitaev(s) => s as &dyn FermionToQubit,
        }
    }
}

impl From<Encoding> for Transformation {
    fn from(encoding: Encoding) -> Self {
        Self::new(encoding)
    }
}

impl FermionToQubit for Transformation {
    fn name(&self) -> &'static str {
        self.strategy().name()
    }

    fn transform_single_operator(
        &self,
        site: u32,
        is_creation: bool,
        num_qubits: u32,
    ) -> OpResult<PauliSum> {
        self.strategy()
            .transform_single_operator(site, is_creation, num_qubits)
    }

    fn encode_occupation(&self, occupied: &[bool]) -> Vec<bool> {
        self.strategy().encode_occupation(occupied)
    }
}
