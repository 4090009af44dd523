//! Error types for the evaluation engine.

use thiserror::Error;

use vqe_hal::HalError;
use vqe_ir::IrError;
use vqe_ops::OpError;

/// Errors raised while building kernels or evaluating energies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Operator construction or transformation failed.
    #[error(transparent)]
    Operator(#[from] OpError),

    /// Circuit construction, binding or remapping failed.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// A measurement kernel could not be executed or read out.
    #[error("Kernel '{kernel}' failed: {source}")]
    KernelExecution {
        /// Name of the offending kernel.
        kernel: String,
        /// Accelerator error.
        #[source]
        source: HalError,
    },

    /// Reduced kernel count disagrees with the kernel list.
    #[error("Partition mismatch: expected {expected} kernel results, reduction reported {reported}")]
    PartitionMismatch {
        /// Kernels scheduled for execution.
        expected: usize,
        /// Kernels accounted for after the global reduction.
        reported: usize,
    },

    /// A Pauli term has a non-negligible imaginary coefficient.
    #[error("Term '{term}' has imaginary coefficient part {imaginary:e}")]
    NonRealCoefficient {
        /// Offending term.
        term: String,
        /// Imaginary part.
        imaginary: f64,
    },

    /// Parameter vector does not match the ansatz.
    #[error("Ansatz takes {expected} parameters, got {got}")]
    ParameterCount {
        /// Parameters the ansatz declares.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },

    /// Cross-rank communication failed.
    #[error("Communicator error: {0}")]
    Communicator(String),

    /// A worker task panicked or was cancelled.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Writing an iteration record failed.
    #[error("Record error: {0}")]
    Record(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
