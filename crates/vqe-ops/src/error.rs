//! Error types for operator algebra and transformations.

use thiserror::Error;

/// Errors raised while building or transforming operators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpError {
    /// Structurally invalid operator, e.g. a repeated site in one Pauli term.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// A fermion site does not fit the target qubit register.
    #[error("Site {site} is out of range for {num_qubits} qubits")]
    QubitIndexOutOfRange {
        /// The offending site.
        site: u32,
        /// Size of the qubit register.
        num_qubits: u32,
    },

    /// Malformed Hamiltonian source text.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result type for operator operations.
pub type OpResult<T> = Result<T, OpError>;
