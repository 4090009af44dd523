//! Circuit intermediate representation for VQE.
//!
//! This crate holds the circuit data model shared by the operator layer, the
//! accelerator interface and the energy evaluator: qubit identifiers, a
//! compact gate set, symbolic [`ParameterExpression`]s and a value-semantics
//! [`Circuit`] with builder, bind, compose and remap operations.
//!
//! # Example: Binding a Variational Circuit
//!
//! ```rust
//! use vqe_ir::{Bindings, Circuit, ParameterExpression, QubitId};
//!
//! let mut ansatz = Circuit::with_size("ansatz", 2, 0);
//! ansatz.x(QubitId(0)).unwrap();
//! ansatz
//!     .ry(ParameterExpression::parse("0.5 * theta").unwrap(), QubitId(1))
//!     .unwrap();
//! assert!(ansatz.is_parameterized());
//!
//! let mut bindings = Bindings::default();
//! bindings.insert("theta".into(), 0.2);
//! let bound = ansatz.bind_parameters(&bindings).unwrap();
//! assert!(!bound.is_parameterized());
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use parameter::{Bindings, ParameterExpression};
pub use qubit::{ClbitId, QubitId};
