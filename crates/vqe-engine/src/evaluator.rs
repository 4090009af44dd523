//! Distributed energy evaluation.
//!
//! One call to [`EnergyEvaluator::evaluate`] turns a parameter vector into an
//! energy:
//!
//! ```text
//!   bind ansatz ──→ rank slice ──→ worker sub-slices (JoinSet)
//!                                   │  compose ansatz ∘ kernel (private copy)
//!                                   │  execute, read ⟨Z…Z⟩
//!                                   └─ local Σ c·⟨P⟩, execution count
//!               ←── all_reduce across ranks ──→ + identity coefficient
//! ```
//!
//! Kernels are shared read-only. Each worker builds its own circuits and
//! buffers, so nothing is mutated across tasks until the reduction.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use vqe_hal::{Accelerator, AcceleratorBuffer, HalError};
use vqe_ir::Circuit;

use crate::ansatz::Ansatz;
use crate::comm::{Communicator, PartialEnergy, SingleProcess, WorkerFailure};
use crate::error::{EngineError, EngineResult};
use crate::kernel::{KernelKind, MeasurementKernel};
use crate::partition::{partition_range, subpartition};
use crate::result::EnergyResult;

/// Evaluator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// Worker tasks per rank.
    pub threads: usize,
    /// Submit each worker's kernels through one `execute_all` call.
    pub batch: bool,
    /// Execute readout calibration kernels.
    pub readout_error: bool,
    /// Logical → physical qubit map applied to every executed circuit.
    pub qubit_map: Option<Vec<u32>>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            batch: false,
            readout_error: false,
            qubit_map: None,
        }
    }
}

impl EvaluatorConfig {
    /// Set the number of worker tasks per rank.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Enable batched submission.
    #[must_use]
    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Enable readout calibration.
    #[must_use]
    pub fn with_readout_error(mut self, readout_error: bool) -> Self {
        self.readout_error = readout_error;
        self
    }

    /// Route logical qubit `q` to physical qubit `map[q]`.
    #[must_use]
    pub fn with_qubit_map(mut self, map: Vec<u32>) -> Self {
        self.qubit_map = Some(map);
        self
    }
}

/// Computes ⟨ψ(θ)|H|ψ(θ)⟩ from a fixed kernel list.
pub struct EnergyEvaluator {
    accelerator: Arc<dyn Accelerator>,
    kernels: Arc<[MeasurementKernel]>,
    ansatz: Ansatz,
    communicator: Arc<dyn Communicator>,
    config: EvaluatorConfig,
    /// Indices of kernels that run on the accelerator.
    scheduled: Arc<[usize]>,
    identity_sum: f64,
}

impl EnergyEvaluator {
    /// Create a single-rank evaluator with default settings.
    pub fn new(
        accelerator: Arc<dyn Accelerator>,
        kernels: Vec<MeasurementKernel>,
        ansatz: Ansatz,
    ) -> Self {
        let identity_sum = kernels
            .iter()
            .filter(|k| k.kind() == KernelKind::Identity)
            .map(MeasurementKernel::coefficient)
            .sum();
        let mut evaluator = Self {
            accelerator,
            kernels: kernels.into(),
            ansatz,
            communicator: Arc::new(SingleProcess),
            config: EvaluatorConfig::default(),
            scheduled: Arc::from(Vec::new()),
            identity_sum,
        };
        evaluator.schedule();
        evaluator
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self.schedule();
        self
    }

    /// Join a rank group.
    #[must_use]
    pub fn with_communicator(mut self, communicator: Arc<dyn Communicator>) -> Self {
        self.communicator = communicator;
        self
    }

    fn schedule(&mut self) {
        let readout_error = self.config.readout_error;
        self.scheduled = self
            .kernels
            .iter()
            .enumerate()
            .filter(|(_, k)| match k.kind() {
                KernelKind::Normal => true,
                KernelKind::Identity => false,
                KernelKind::ReadoutCalibration { .. } => readout_error,
            })
            .map(|(i, _)| i)
            .collect();
    }

    /// All kernels, in construction order.
    pub fn kernels(&self) -> &[MeasurementKernel] {
        &self.kernels
    }

    /// The state-preparation template.
    pub fn ansatz(&self) -> &Ansatz {
        &self.ansatz
    }

    /// Settings in use.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Kernels executed per evaluation, summed over all ranks.
    pub fn num_scheduled(&self) -> usize {
        self.scheduled.len()
    }

    /// This evaluator's rank.
    pub fn rank(&self) -> usize {
        self.communicator.rank()
    }

    /// Sum of identity-term coefficients.
    pub fn identity_sum(&self) -> f64 {
        self.identity_sum
    }

    /// Register width handed to the accelerator.
    fn buffer_width(&self) -> u32 {
        let logical = self
            .kernels
            .iter()
            .map(|k| k.circuit().num_qubits())
            .chain(std::iter::once(self.ansatz.circuit().num_qubits()))
            .max()
            .unwrap_or(0);
        let logical = u32::try_from(logical).unwrap_or(u32::MAX);
        match &self.config.qubit_map {
            Some(map) => map
                .iter()
                .take(logical as usize)
                .map(|&q| q + 1)
                .max()
                .unwrap_or(0)
                .max(logical),
            None => logical,
        }
    }

    /// Energy at `parameters`.
    ///
    /// Every rank of the group must call this with the same parameters. Any
    /// kernel failure on any rank fails the call on every rank.
    #[instrument(skip(self, parameters), fields(rank = self.communicator.rank()))]
    pub async fn evaluate(&self, parameters: &[f64]) -> EngineResult<EnergyResult> {
        let local = match self.ansatz.bind(parameters) {
            Ok(ansatz) => self.run_rank(ansatz).await,
            Err(err) => Err(err),
        };

        let reduced = match local {
            Ok(partial) => self.communicator.all_reduce(partial).await?,
            // Peers are waiting in the reduction; release them before failing.
            Err(err) => return Err(self.abort(err).await),
        };

        if let Some(failure) = reduced.failure {
            return Err(failure.into_error());
        }
        if reduced.kernels != self.scheduled.len() {
            return Err(EngineError::PartitionMismatch {
                expected: self.scheduled.len(),
                reported: reduced.kernels,
            });
        }

        let mut per_term_expectation = BTreeMap::new();
        let mut calibration_probabilities = BTreeMap::new();
        for kernel in self.kernels.iter().filter(|k| k.kind() == KernelKind::Identity) {
            per_term_expectation.insert(kernel.name().to_string(), 1.0);
        }
        for (index, value) in reduced.values {
            let kernel = self.kernels.get(index).ok_or_else(|| {
                EngineError::Communicator(format!("reduction reported unknown kernel {index}"))
            })?;
            let target = match kernel.kind() {
                KernelKind::ReadoutCalibration { .. } => &mut calibration_probabilities,
                _ => &mut per_term_expectation,
            };
            target.insert(kernel.name().to_string(), value);
        }

        let energy = reduced.sum + self.identity_sum;
        debug!(
            energy,
            executions = reduced.executions,
            kernels = reduced.kernels,
            "energy evaluated"
        );

        Ok(EnergyResult {
            energy,
            per_term_expectation,
            calibration_probabilities,
            total_execution_count: reduced.executions,
        })
    }

    /// Fail the group's current evaluation with `err`.
    ///
    /// Stands in for [`evaluate`](Self::evaluate) on this rank: it joins the
    /// reduction the peers are about to enter with a failure marker, so every
    /// rank returns an error for the same step. Returns `err`.
    pub async fn abort(&self, err: EngineError) -> EngineError {
        let rank = self.communicator.rank();
        let marker = PartialEnergy::failed(WorkerFailure::from_error(rank, &err));
        if let Err(comm_err) = self.communicator.all_reduce(marker).await {
            warn!(%comm_err, "reduction after local failure also failed");
        }
        err
    }

    /// Execute this rank's slice across worker tasks.
    async fn run_rank(&self, ansatz: Circuit) -> EngineResult<PartialEnergy> {
        let rank_range = partition_range(
            self.communicator.rank(),
            self.communicator.size(),
            self.scheduled.len(),
        );
        let threads = self.config.threads.max(1);
        let context = Arc::new(WorkContext {
            accelerator: Arc::clone(&self.accelerator),
            kernels: Arc::clone(&self.kernels),
            scheduled: Arc::clone(&self.scheduled),
            ansatz,
            qubit_map: self.config.qubit_map.clone(),
            width: self.buffer_width(),
        });

        debug!(
            range = ?rank_range,
            threads,
            batch = self.config.batch,
            "dispatching kernels"
        );

        let mut workers = JoinSet::new();
        for worker in 0..threads {
            let range = subpartition(&rank_range, worker, threads);
            if range.is_empty() {
                continue;
            }
            let context = Arc::clone(&context);
            let batch = self.config.batch;
            workers.spawn(async move {
                let outcome = if batch {
                    context.run_batch(range).await
                } else {
                    context.run_sequential(range).await
                };
                (worker, outcome)
            });
        }

        let mut outputs: Vec<Option<PartialEnergy>> = vec![None; threads];
        let mut failures: Vec<(usize, EngineError)> = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((worker, Ok(partial))) => outputs[worker] = Some(partial),
                Ok((worker, Err(err))) => failures.push((worker, err)),
                Err(join_err) => failures.push((usize::MAX, EngineError::Worker(join_err.to_string()))),
            }
        }

        // Report the failure of the lowest worker so the error is reproducible.
        if let Some((_, err)) = failures.into_iter().min_by_key(|(worker, _)| *worker) {
            return Err(err);
        }
        Ok(PartialEnergy::combine(outputs.into_iter().flatten()))
    }
}

/// Read-only state shared by the workers of one evaluation.
struct WorkContext {
    accelerator: Arc<dyn Accelerator>,
    kernels: Arc<[MeasurementKernel]>,
    scheduled: Arc<[usize]>,
    ansatz: Circuit,
    qubit_map: Option<Vec<u32>>,
    width: u32,
}

fn kernel_error(kernel: &MeasurementKernel, source: HalError) -> EngineError {
    EngineError::KernelExecution {
        kernel: kernel.name().to_string(),
        source,
    }
}

impl WorkContext {
    /// Private executable circuit for `kernel`.
    fn prepare(&self, kernel: &MeasurementKernel) -> EngineResult<Circuit> {
        let circuit = match kernel.kind() {
            KernelKind::ReadoutCalibration { .. } => kernel.circuit().clone(),
            _ => self.ansatz.compose(kernel.circuit()),
        };
        match &self.qubit_map {
            Some(map) => Ok(circuit.remap_qubits(map)?),
            None => Ok(circuit),
        }
    }

    async fn run_sequential(&self, range: Range<usize>) -> EngineResult<PartialEnergy> {
        let mut partial = PartialEnergy::default();
        for slot in range {
            let index = self.scheduled[slot];
            let kernel = &self.kernels[index];
            let circuit = self.prepare(kernel)?;
            let mut buffer = self
                .accelerator
                .create_buffer(kernel.name(), self.width)
                .map_err(|e| kernel_error(kernel, e))?;
            self.accelerator
                .execute(&circuit, &mut buffer)
                .await
                .map_err(|e| kernel_error(kernel, e))?;
            partial.executions += 1;
            record(kernel, index, &buffer, &mut partial)?;
        }
        Ok(partial)
    }

    async fn run_batch(&self, range: Range<usize>) -> EngineResult<PartialEnergy> {
        let mut partial = PartialEnergy::default();
        let indices: Vec<usize> = self.scheduled[range].to_vec();
        let Some(&first) = indices.first() else {
            return Ok(partial);
        };
        let first = &self.kernels[first];

        let circuits = indices
            .iter()
            .map(|&i| self.prepare(&self.kernels[i]))
            .collect::<EngineResult<Vec<_>>>()?;
        let parent = self
            .accelerator
            .create_buffer("qreg", self.width)
            .map_err(|e| kernel_error(first, e))?;
        let children = self
            .accelerator
            .execute_all(&circuits, &parent)
            .await
            .map_err(|e| match e {
                HalError::BatchFailed { index, source } => match indices.get(index) {
                    Some(&kernel) => kernel_error(&self.kernels[kernel], *source),
                    None => kernel_error(first, HalError::BatchFailed { index, source }),
                },
                other => kernel_error(first, other),
            })?;
        if children.len() != circuits.len() {
            return Err(kernel_error(
                first,
                HalError::ExecutionFailed(format!(
                    "batch of {} circuits returned {} buffers",
                    circuits.len(),
                    children.len()
                )),
            ));
        }
        partial.executions += circuits.len() as u64;

        for (&index, buffer) in indices.iter().zip(&children) {
            record(&self.kernels[index], index, buffer, &mut partial)?;
        }
        Ok(partial)
    }
}

/// Fold one executed kernel into `partial`.
fn record(
    kernel: &MeasurementKernel,
    index: usize,
    buffer: &AcceleratorBuffer,
    partial: &mut PartialEnergy,
) -> EngineResult<()> {
    let value = match kernel.kind() {
        KernelKind::ReadoutCalibration { prepared, .. } => {
            let flipped = if prepared { "0" } else { "1" };
            let p = buffer.measurement_probability(flipped);
            if p.is_nan() {
                warn!(kernel = kernel.name(), "calibration outcome never observed, using 0");
                0.0
            } else {
                p
            }
        }
        _ => {
            let expectation = buffer.expectation_value_z().ok_or_else(|| {
                kernel_error(
                    kernel,
                    HalError::MissingExpectation(format!("buffer '{}' holds no results", buffer.name())),
                )
            })?;
            partial.sum += kernel.coefficient() * expectation;
            expectation
        }
    };
    debug!(kernel = kernel.name(), value, "kernel measured");
    partial.kernels += 1;
    partial.values.push((index, value));
    Ok(())
}
