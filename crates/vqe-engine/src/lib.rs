//! Distributed energy evaluation and the VQE driver.
//!
//! This crate turns a qubit Hamiltonian into measurement kernels and
//! evaluates ⟨ψ(θ)|H|ψ(θ)⟩ on any [`vqe_hal::Accelerator`]:
//!
//! - [`kernel`]: one basis-rotation-and-measure circuit per Pauli term
//! - [`ansatz`]: parameterized state preparation (Hartree-Fock, UCCSD)
//! - [`partition`]: static contiguous work ranges
//! - [`comm`]: cross-rank reduction ([`SingleProcess`], [`LocalGroup`])
//! - [`evaluator`]: the per-iteration map/reduce over kernels
//! - [`optimizer`], [`task`]: the Nelder-Mead loop and its bookkeeping
//! - [`record`]: per-iteration output sinks
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vqe_engine::{Ansatz, EnergyEvaluator, KernelBuilder};
//! use vqe_ops::molecules::h2_sto3g;
//! use vqe_ops::{FermionToQubit, JordanWigner};
//!
//! let hamiltonian = JordanWigner.transform(&h2_sto3g()?, 4)?;
//! let kernels = KernelBuilder::new().build(&hamiltonian)?;
//! let ansatz = Ansatz::hartree_fock(4, 2, &JordanWigner)?;
//! let evaluator = EnergyEvaluator::new(Arc::new(accelerator), kernels, ansatz);
//! let result = evaluator.evaluate(&[]).await?;
//! println!("E = {:.10}", result.energy);
//! ```

pub mod ansatz;
pub mod comm;
pub mod error;
pub mod evaluator;
pub mod kernel;
pub mod optimizer;
pub mod partition;
pub mod record;
pub mod result;
pub mod task;

pub use ansatz::{Ansatz, evaluate_parameters};
pub use comm::{Communicator, LocalGroup, PartialEnergy, SingleProcess, WorkerFailure};
pub use error::{EngineError, EngineResult};
pub use evaluator::{EnergyEvaluator, EvaluatorConfig};
pub use kernel::{KernelBuilder, KernelKind, MeasurementKernel};
pub use optimizer::{ConvergenceCriteria, NelderMead, Objective, OptimizationResult};
pub use partition::{partition_range, subpartition};
pub use record::{IterationRecord, JsonLinesSink, MemorySink, RecordSink};
pub use result::EnergyResult;
pub use task::{TaskKind, TaskResult, VqeTask, initial_parameters};
