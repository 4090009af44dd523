//! Pauli operators and canonical Pauli terms.
//!
//! A [`PauliTerm`] is a tensor product of non-identity single-qubit Paulis
//! with unique sites kept in ascending site order. That canonical order makes
//! the term usable directly as a map key when summing operators.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OpError, OpResult};

/// A single non-identity Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pauli {
    /// Pauli-X operator.
    X,
    /// Pauli-Y operator.
    Y,
    /// Pauli-Z operator.
    Z,
}

impl Pauli {
    /// Get the name of this Pauli operator.
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }

    /// Multiply two single-site Paulis.
    ///
    /// Returns the resulting Pauli (`None` for identity) and the phase.
    pub fn product(self, rhs: Pauli) -> (Option<Pauli>, Complex64) {
        let i = Complex64::i();
        match (self, rhs) {
            (Pauli::X, Pauli::X) | (Pauli::Y, Pauli::Y) | (Pauli::Z, Pauli::Z) => {
                (None, Complex64::new(1.0, 0.0))
            }
            (Pauli::X, Pauli::Y) => (Some(Pauli::Z), i),
            (Pauli::Y, Pauli::X) => (Some(Pauli::Z), -i),
            (Pauli::Y, Pauli::Z) => (Some(Pauli::X), i),
            (Pauli::Z, Pauli::Y) => (Some(Pauli::X), -i),
            (Pauli::Z, Pauli::X) => (Some(Pauli::Y), i),
            (Pauli::X, Pauli::Z) => (Some(Pauli::Y), -i),
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<char> for Pauli {
    type Error = OpError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            other => Err(OpError::InvalidOperator(format!(
                "unknown Pauli axis '{other}'"
            ))),
        }
    }
}

/// One Pauli factor acting on a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PauliFactor {
    /// Qubit index.
    pub site: u32,
    /// Pauli axis applied to the qubit.
    pub axis: Pauli,
}

/// A tensor product of Pauli factors in canonical (site-sorted) order.
///
/// The empty term is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PauliTerm {
    factors: Vec<PauliFactor>,
}

impl PauliTerm {
    /// Build a term from `(site, axis)` pairs in any order.
    ///
    /// A site appearing twice is rejected with [`OpError::InvalidOperator`].
    pub fn new(factors: impl IntoIterator<Item = (u32, Pauli)>) -> OpResult<Self> {
        let mut factors: Vec<PauliFactor> = factors
            .into_iter()
            .map(|(site, axis)| PauliFactor { site, axis })
            .collect();
        factors.sort_by_key(|f| f.site);
        if let Some(pair) = factors.windows(2).find(|w| w[0].site == w[1].site) {
            return Err(OpError::InvalidOperator(format!(
                "site {} appears more than once in Pauli term",
                pair[0].site
            )));
        }
        Ok(Self { factors })
    }

    /// The identity term.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A single-site term.
    pub fn single(site: u32, axis: Pauli) -> Self {
        Self {
            factors: vec![PauliFactor { site, axis }],
        }
    }

    /// Factors in ascending site order.
    pub fn factors(&self) -> &[PauliFactor] {
        &self.factors
    }

    /// Number of non-identity factors.
    pub fn weight(&self) -> usize {
        self.factors.len()
    }

    /// Check whether this is the identity.
    pub fn is_identity(&self) -> bool {
        self.factors.is_empty()
    }

    /// Sites touched by this term, ascending.
    pub fn sites(&self) -> impl Iterator<Item = u32> + '_ {
        self.factors.iter().map(|f| f.site)
    }

    /// Axis on `site`, if any.
    pub fn axis(&self, site: u32) -> Option<Pauli> {
        self.factors
            .binary_search_by_key(&site, |f| f.site)
            .ok()
            .map(|idx| self.factors[idx].axis)
    }

    /// Highest site index, if any.
    pub fn max_site(&self) -> Option<u32> {
        self.factors.last().map(|f| f.site)
    }

    /// Compact label without separators, e.g. `X0Z1X2`, or `I`.
    pub fn label(&self) -> String {
        if self.factors.is_empty() {
            return "I".to_string();
        }
        self.factors
            .iter()
            .map(|f| format!("{}{}", f.axis, f.site))
            .collect()
    }

    /// Multiply two terms, returning the product term and its phase.
    pub fn multiply(&self, rhs: &PauliTerm) -> (PauliTerm, Complex64) {
        let mut phase = Complex64::new(1.0, 0.0);
        let mut out = Vec::with_capacity(self.factors.len() + rhs.factors.len());
        let (lhs, rhs) = (&self.factors, &rhs.factors);
        let (mut i, mut j) = (0, 0);

        while i < lhs.len() && j < rhs.len() {
            let (fa, fb) = (lhs[i], rhs[j]);
            match fa.site.cmp(&fb.site) {
                std::cmp::Ordering::Less => {
                    out.push(fa);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(fb);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    let (axis, p) = fa.axis.product(fb.axis);
                    phase *= p;
                    if let Some(axis) = axis {
                        out.push(PauliFactor {
                            site: fa.site,
                            axis,
                        });
                    }
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&lhs[i..]);
        out.extend_from_slice(&rhs[j..]);

        (PauliTerm { factors: out }, phase)
    }
}

impl fmt::Display for PauliTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return f.write_str("I");
        }
        for (i, factor) in self.factors.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}{}", factor.axis, factor.site)?;
        }
        Ok(())
    }
}

impl FromStr for PauliTerm {
    type Err = OpError;

    /// Parse `X0 Z1 Y3`, `X0Z1Y3` or `I`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "I" {
            return Ok(Self::identity());
        }

        let mut factors = Vec::new();
        let mut chars = s.chars().filter(|c| !c.is_whitespace()).peekable();
        while let Some(c) = chars.next() {
            let axis = Pauli::try_from(c)?;
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            let site = digits.parse::<u32>().map_err(|_| {
                OpError::InvalidOperator(format!("missing site index after '{c}' in '{s}'"))
            })?;
            factors.push((site, axis));
        }
        Self::new(factors)
    }
}
