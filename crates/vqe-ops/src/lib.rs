//! Operator algebra for fermionic VQE.
//!
//! This crate turns a second-quantized Hamiltonian into a weighted sum of
//! Pauli strings that a qubit processor can measure.
//!
//! # Core Components
//!
//! - **Pauli algebra**: [`Pauli`], [`PauliTerm`] (canonical, site-sorted) and
//!   [`PauliSum`] with addition, scaling, multiplication and tolerance-based
//!   equality
//! - **Fermion model**: [`FermionOperator`], [`FermionTerm`],
//!   [`FermionHamiltonian`]
//! - **Transformations**: the [`FermionToQubit`] trait with the
//!   [`JordanWigner`] and [`BravyiKitaev`] strategies, selected through
//!   [`Encoding`] / [`Transformation`]
//! - **Source format**: [`parse_fermion_source`] for the line-oriented
//!   Hamiltonian text format
//!
//! # Example
//!
//! ```rust
//! use vqe_ops::{Encoding, FermionToQubit, Transformation, molecules};
//!
//! let hamiltonian = molecules::h2_sto3g().unwrap();
//! let bk = Transformation::new(Encoding::BravyiKitaev);
//! let qubit_op = bk.transform(&hamiltonian, 4).unwrap();
//!
//! assert_eq!(qubit_op.len(), 15);
//! assert!(qubit_op.is_real(1e-12));
//! ```

pub mod error;
pub mod fermion;
pub mod molecules;
pub mod pauli;
pub mod source;
pub mod sum;
pub mod transform;

pub use error::{OpError, OpResult};
pub use fermion::{FermionHamiltonian, FermionOperator, FermionTerm};
pub use pauli::{Pauli, PauliFactor, PauliTerm};
pub use source::parse_fermion_source;
pub use sum::{PauliSum, TOLERANCE};
pub use transform::{
    BkSets, BravyiKitaev, Encoding, FenwickTree, FermionToQubit, JordanWigner, Transformation,
};
