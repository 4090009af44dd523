//! Accelerator abstraction layer.
//!
//! The energy evaluator talks to quantum hardware and simulators only
//! through the [`Accelerator`] trait defined here. An accelerator executes a
//! fully bound [`vqe_ir::Circuit`] and records the measurement distribution
//! of its measured qubits in an [`AcceleratorBuffer`], from which the
//! evaluator reads ⟨Z…Z⟩ or single outcome probabilities.
//!
//! # Implementing an Accelerator
//!
//! ```ignore
//! use async_trait::async_trait;
//! use vqe_hal::{Accelerator, AcceleratorBuffer, HalResult};
//! use vqe_ir::Circuit;
//!
//! struct MyDevice;
//!
//! #[async_trait]
//! impl Accelerator for MyDevice {
//!     fn name(&self) -> &str { "my_device" }
//!     fn max_qubits(&self) -> u32 { 20 }
//!
//!     async fn execute(&self, circuit: &Circuit, buffer: &mut AcceleratorBuffer) -> HalResult<()> {
//!         // Run the circuit and record outcomes
//!         # todo!()
//!     }
//! }
//! ```

pub mod accelerator;
pub mod buffer;
pub mod counts;
pub mod error;

pub use accelerator::Accelerator;
pub use buffer::AcceleratorBuffer;
pub use counts::Counts;
pub use error::{HalError, HalResult};
