//! Error types for the HAL crate.

use thiserror::Error;

/// Errors that can occur in accelerator operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Accelerator is not available.
    #[error("Accelerator not available: {0}")]
    Unavailable(String),

    /// Circuit execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Invalid circuit.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Circuit exceeds accelerator capabilities.
    #[error("Circuit exceeds accelerator capabilities: {0}")]
    CircuitTooLarge(String),

    /// A buffer holds no measurement data to compute an expectation from.
    #[error("Buffer '{0}' holds no measurement results")]
    MissingExpectation(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// One circuit of a batch failed.
    #[error("Batch circuit {index} failed: {source}")]
    BatchFailed {
        /// Position of the circuit in the batch.
        index: usize,
        /// Error raised by that circuit.
        #[source]
        source: Box<HalError>,
    },
}

impl HalError {
    /// Tag this error with the batch position it came from.
    pub fn in_batch(self, index: usize) -> Self {
        HalError::BatchFailed {
            index,
            source: Box::new(self),
        }
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
