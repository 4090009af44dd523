//! Bravyi-Kitaev encoding over a Fenwick tree.
//!
//! Qubit `j` stores the parity of the occupations in the subtree rooted at
//! `j`. For each site the tree yields three index sets:
//!
//! - update set U(j): ancestors of `j`, which also store its occupation;
//! - flip set F(j): children of `j`;
//! - remainder set R(j): children of ancestors with index below `j`.
//!
//! The parity set is P(j) = R(j) ∪ F(j). With Majorana strings
//! c = Xⱼ Z_P X_U and d = Yⱼ Z_R X_U the ladder operators are
//! a† = ½(c − i·d) and a = ½(c + i·d).

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{FermionToQubit, check_site, ladder};
use crate::error::OpResult;
use crate::pauli::{Pauli, PauliTerm};
use crate::sum::PauliSum;

/// Update, parity, flip and remainder sets of one site, each ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BkSets {
    /// Ancestors of the site.
    pub update: Vec<u32>,
    /// Sites whose qubits encode the parity of all orbitals below the site.
    pub parity: Vec<u32>,
    /// Children of the site.
    pub flip: Vec<u32>,
    /// `parity` minus `flip`.
    pub remainder: Vec<u32>,
}

/// Fenwick tree over `n` qubits, with the per-site sets precomputed.
///
/// Built by bisection with qubit `n − 1` as root: on a range `[l, r]` the
/// pivot `(l + r) / 2` becomes a child of the range's parent, then the
/// halves `[l, pivot]` (under the pivot) and `[pivot + 1, r]` (under the
/// parent) are built the same way. This also covers non-power-of-two sizes.
#[derive(Debug)]
pub struct FenwickTree {
    parent: Vec<Option<u32>>,
    children: Vec<Vec<u32>>,
    sets: Vec<BkSets>,
}

impl FenwickTree {
    /// Build the tree and its site sets for `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        let n = num_qubits as usize;
        let mut tree = Self {
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            sets: Vec::with_capacity(n),
        };
        if num_qubits > 0 {
            tree.bisect(0, num_qubits - 1, num_qubits - 1);
        }
        for children in &mut tree.children {
            children.sort_unstable();
        }
        tree.sets = (0..num_qubits).map(|j| tree.compute_sets(j)).collect();
        tree
    }

    fn bisect(&mut self, left: u32, right: u32, parent: u32) {
        if left >= right {
            return;
        }
        let pivot = (left + right) >> 1;
        self.parent[pivot as usize] = Some(parent);
        self.children[parent as usize].push(pivot);
        self.bisect(left, pivot, pivot);
        self.bisect(pivot + 1, right, parent);
    }

    fn ancestors(&self, site: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cursor = self.parent[site as usize];
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.parent[p as usize];
        }
        out
    }

    fn compute_sets(&self, site: u32) -> BkSets {
        let update = self.ancestors(site);
        let flip = self.children[site as usize].clone();
        let mut remainder: Vec<u32> = update
            .iter()
            .flat_map(|&a| self.children[a as usize].iter().copied())
            .filter(|&c| c < site)
            .collect();
        remainder.sort_unstable();
        let mut parity: Vec<u32> = remainder.iter().chain(&flip).copied().collect();
        parity.sort_unstable();
        BkSets {
            update,
            parity,
            flip,
            remainder,
        }
    }

    /// Number of qubits covered.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Parent of `site`; `None` for the root.
    pub fn parent(&self, site: u32) -> Option<u32> {
        self.parent.get(site as usize).copied().flatten()
    }

    /// Sets of `site`.
    pub fn sets(&self, site: u32) -> &BkSets {
        &self.sets[site as usize]
    }
}

/// The Bravyi-Kitaev strategy.
///
/// Trees are built once per register size and shared between threads.
#[derive(Debug, Default)]
pub struct BravyiKitaev {
    trees: Mutex<FxHashMap<u32, Arc<FenwickTree>>>,
}

impl BravyiKitaev {
    /// Create a strategy with an empty tree cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The Fenwick tree for `num_qubits`, built on first use.
    pub fn tree(&self, num_qubits: u32) -> Arc<FenwickTree> {
        let mut trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            trees
                .entry(num_qubits)
                .or_insert_with(|| Arc::new(FenwickTree::new(num_qubits))),
        )
    }
}

impl Clone for BravyiKitaev {
    fn clone(&self) -> Self {
        let trees = self.trees.lock().unwrap_or_else(PoisonError::into_inner);
        Self {
            trees: Mutex::new(trees.clone()),
        }
    }
}

impl FermionToQubit for BravyiKitaev {
    fn name(&self) -> &'static str {
        "bravyi-kitaev"
    }

    fn transform_single_operator(
        &self,
        site: u32,
        is_creation: bool,
        num_qubits: u32,
    ) -> OpResult<PauliSum> {
        check_site(site, num_qubits)?;
        let tree = self.tree(num_qubits);
        let sets = tree.sets(site);
        let update = sets.update.iter().map(|&u| (u, Pauli::X));

        let c = PauliTerm::new(
            sets.parity
                .iter()
                .map(|&p| (p, Pauli::Z))
                .chain([(site, Pauli::X)])
                .chain(update.clone()),
        )?;
        let d = PauliTerm::new(
            sets.remainder
                .iter()
                .map(|&r| (r, Pauli::Z))
                .chain([(site, Pauli::Y)])
                .chain(update),
        )?;
        Ok(ladder(c, d, is_creation))
    }

    /// Each qubit holds the parity of its subtree's occupations.
    fn encode_occupation(&self, occupied: &[bool]) -> Vec<bool> {
        let tree = self.tree(occupied.len() as u32);
        let mut bits = occupied.to_vec();
        // Children always have lower indices than their parent.
        for j in 0..bits.len() {
            if let Some(p) = tree.parent(j as u32) {
                bits[p as usize] ^= bits[j];
            }
        }
        bits
    }
}
