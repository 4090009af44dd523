//! Local statevector accelerator.
//!
//! This crate provides an in-process [`vqe_hal::Accelerator`] for testing,
//! development and small molecules. It uses statevector simulation, which
//! gives exact expectation values but is limited to ~20-25 qubits.
//!
//! # Features
//!
//! - **Exact mode**: buffers receive the exact outcome distribution
//! - **Shot sampling**: seeded, reproducible sampling with a configurable shot count
//! - **Readout noise**: symmetric bit-flip error on measured qubits
//!
//! # Example
//!
//! ```ignore
//! use vqe_adapter_sim::StatevectorAccelerator;
//! use vqe_hal::Accelerator;
//! use vqe_ir::{Circuit, ClbitId, QubitId};
//!
//! let acc = StatevectorAccelerator::new();
//! let mut circuit = Circuit::with_size("z0", 1, 1);
//! circuit.x(QubitId(0)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//!
//! let mut buffer = acc.create_buffer("z0", 1).unwrap();
//! acc.execute(&circuit, &mut buffer).await.unwrap();
//! assert_eq!(buffer.expectation_value_z(), Some(-1.0));
//! ```

mod simulator;
mod statevector;

pub use simulator::StatevectorAccelerator;
