//! The accelerator trait.
//!
//! An accelerator runs fully bound circuits and writes measurement results
//! into an [`AcceleratorBuffer`]:
//!
//! ```text
//!   create_buffer() ──→ execute() ──→ buffer.expectation_value_z()
//!                   └─→ execute_all() ──→ Vec<AcceleratorBuffer>
//! ```
//!
//! Implementations must be `Send + Sync`; the energy evaluator shares one
//! accelerator between all of its workers.

use async_trait::async_trait;
use tracing::debug;

use vqe_ir::Circuit;

use crate::buffer::AcceleratorBuffer;
use crate::error::{HalError, HalResult};

/// A device or simulator that executes circuits.
#[async_trait]
pub trait Accelerator: Send + Sync {
    /// Get the name of this accelerator.
    fn name(&self) -> &str;

    /// Largest register this accelerator accepts.
    fn max_qubits(&self) -> u32;

    /// Allocate a result buffer for a register of `num_qubits`.
    fn create_buffer(&self, name: &str, num_qubits: u32) -> HalResult<AcceleratorBuffer> {
        if num_qubits > self.max_qubits() {
            debug!(
                accelerator = self.name(),
                buffer = name,
                num_qubits,
                max_qubits = self.max_qubits(),
                "buffer rejected"
            );
            return Err(HalError::CircuitTooLarge(format!(
                "buffer '{name}' needs {num_qubits} qubits but {} supports {}",
                self.name(),
                self.max_qubits()
            )));
        }
        Ok(AcceleratorBuffer::new(name, num_qubits))
    }

    /// Execute one circuit, replacing the buffer's results.
    async fn execute(&self, circuit: &Circuit, buffer: &mut AcceleratorBuffer) -> HalResult<()>;

    /// Execute a batch of circuits.
    ///
    /// Returns one child buffer per circuit, in input order, each named after
    /// its circuit and as wide as `buffer`. The default runs them one by one.
    ///
    /// A failing circuit is reported as [`HalError::BatchFailed`] carrying its
    /// position in `circuits`.
    async fn execute_all(
        &self,
        circuits: &[Circuit],
        buffer: &AcceleratorBuffer,
    ) -> HalResult<Vec<AcceleratorBuffer>> {
        debug!(
            accelerator = self.name(),
            circuits = circuits.len(),
            num_qubits = buffer.num_qubits(),
            "executing batch"
        );
        let mut children = Vec::with_capacity(circuits.len());
        for (index, circuit) in circuits.iter().enumerate() {
            let mut child = self
                .create_buffer(circuit.name(), buffer.num_qubits())
                .map_err(|e| e.in_batch(index))?;
            self.execute(circuit, &mut child)
                .await
                .map_err(|e| e.in_batch(index))?;
            children.push(child);
        }
        Ok(children)
    }
}
