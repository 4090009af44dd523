//! The compute-energy and VQE tasks.
//!
//! Iteration and accelerator-call counters live in the task and are
//! returned in [`TaskResult`]; nothing is tracked globally.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::evaluator::EnergyEvaluator;
use crate::optimizer::{NelderMead, Objective};
use crate::record::{IterationRecord, RecordSink};
use crate::result::EnergyResult;

/// Which task to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// One evaluation at the given parameters.
    ComputeEnergy,
    /// Optimizer loop starting from the given parameters.
    #[default]
    Vqe,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::ComputeEnergy => write!(f, "compute-energy"),
            TaskKind::Vqe => write!(f, "vqe"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compute-energy" | "energy" => Ok(TaskKind::ComputeEnergy),
            "vqe" => Ok(TaskKind::Vqe),
            other => Err(format!("unknown task '{other}' (expected compute-energy or vqe)")),
        }
    }
}

/// Outcome of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Every `(parameters, energy)` pair evaluated, in order.
    pub history: Vec<(Vec<f64>, f64)>,
    /// Best energy found.
    pub energy: f64,
    /// Parameters at `energy`.
    pub angles: Vec<f64>,
    /// Accelerator executions across all evaluations.
    pub accelerator_calls: u64,
    /// Optimizer iterations; zero for compute-energy.
    pub iterations: usize,
    /// Whether the optimizer met its convergence criteria.
    pub converged: bool,
}

impl TaskResult {
    /// Number of energy evaluations performed.
    pub fn evaluations(&self) -> usize {
        self.history.len()
    }
}

/// Initial parameter vector: `explicit` if given, else uniform in `[-π, π)`.
pub fn initial_parameters(
    count: usize,
    explicit: Option<&[f64]>,
    seed: Option<u64>,
) -> EngineResult<Vec<f64>> {
    if let Some(values) = explicit {
        if values.len() != count {
            return Err(EngineError::ParameterCount {
                expected: count,
                got: values.len(),
            });
        }
        return Ok(values.to_vec());
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((0..count).map(|_| rng.gen_range(-PI..PI)).collect())
}

/// Drives an [`EnergyEvaluator`] for one of the [`TaskKind`]s.
pub struct VqeTask {
    evaluator: EnergyEvaluator,
    optimizer: NelderMead,
    sink: Option<Box<dyn RecordSink>>,
    iteration: usize,
}

impl VqeTask {
    /// Create a task with the default optimizer and no record sink.
    pub fn new(evaluator: EnergyEvaluator) -> Self {
        Self {
            evaluator,
            optimizer: NelderMead::default(),
            sink: None,
            iteration: 0,
        }
    }

    /// Use `optimizer` for [`TaskKind::Vqe`].
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Write one record per evaluation (rank 0 only).
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The underlying evaluator.
    pub fn evaluator(&self) -> &EnergyEvaluator {
        &self.evaluator
    }

    /// Evaluations performed by this task so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Run `kind` starting from `parameters`.
    pub async fn execute(&mut self, kind: TaskKind, parameters: &[f64]) -> EngineResult<TaskResult> {
        match kind {
            TaskKind::ComputeEnergy => self.compute_energy(parameters).await,
            TaskKind::Vqe => self.run(parameters).await,
        }
    }

    /// Evaluate the energy once.
    pub async fn compute_energy(&mut self, parameters: &[f64]) -> EngineResult<TaskResult> {
        let mut tracker = self.tracker();
        let energy = tracker.evaluate(parameters).await?;
        let result = tracker.finish(energy, parameters.to_vec(), 0, true)?;
        self.iteration += result.evaluations();
        Ok(result)
    }

    /// Minimize the energy starting at `initial`.
    pub async fn run(&mut self, initial: &[f64]) -> EngineResult<TaskResult> {
        let optimizer = self.optimizer.clone();
        let mut tracker = self.tracker();
        let outcome = optimizer.minimize(&mut tracker, initial).await?;
        let result = tracker.finish(
            outcome.optimal_value,
            outcome.optimal_params,
            outcome.num_iterations,
            outcome.converged,
        )?;
        self.iteration += result.evaluations();
        Ok(result)
    }

    fn tracker(&mut self) -> Tracker<'_> {
        Tracker {
            evaluator: &self.evaluator,
            sink: self.sink.as_mut(),
            iteration: self.iteration,
            accelerator_calls: 0,
            history: Vec::new(),
            deferred: None,
        }
    }
}

/// Objective adapter that counts, logs and records each evaluation.
///
/// A sink failure on rank 0 must not leave the other ranks waiting in a
/// reduction, so it is held until the next evaluation, which then fails on
/// every rank. If no evaluation follows, [`Tracker::finish`] returns it.
struct Tracker<'a> {
    evaluator: &'a EnergyEvaluator,
    sink: Option<&'a mut Box<dyn RecordSink>>,
    iteration: usize,
    accelerator_calls: u64,
    history: Vec<(Vec<f64>, f64)>,
    deferred: Option<EngineError>,
}

impl Tracker<'_> {
    fn observe(&mut self, parameters: &[f64], result: &EnergyResult) {
        self.accelerator_calls += result.total_execution_count;
        self.history.push((parameters.to_vec(), result.energy));

        if self.evaluator.rank() == 0 {
            let angles = parameters
                .iter()
                .map(|p| format!("{p:.10}"))
                .collect::<Vec<_>>()
                .join(" ");
            info!(
                "Iteration {}, Computed VQE Energy = {:.10} at ({angles})",
                self.iteration, result.energy
            );
            if let Some(sink) = self.sink.as_mut() {
                let record = IterationRecord::new(self.iteration, parameters, result);
                if let Err(err) = sink.record(&record) {
                    warn!(error = %err, iteration = self.iteration, "record sink failed");
                    self.sink = None;
                    self.deferred = Some(err);
                }
            }
        }
        self.iteration += 1;
    }

    fn finish(
        mut self,
        energy: f64,
        angles: Vec<f64>,
        iterations: usize,
        converged: bool,
    ) -> EngineResult<TaskResult> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(TaskResult {
            history: self.history,
            energy,
            angles,
            accelerator_calls: self.accelerator_calls,
            iterations,
            converged,
        })
    }
}

#[async_trait]
impl<'a> Objective for Tracker<'a> {
    async fn evaluate(&mut self, parameters: &[f64]) -> EngineResult<f64> {
        if let Some(err) = self.deferred.take() {
            return Err(self.evaluator.abort(err).await);
        }
        let result = self.evaluator.evaluate(parameters).await?;
        self.observe(parameters, &result);
        Ok(result.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_parsing() {
        assert_eq!("vqe".parse::<TaskKind>().unwrap(), TaskKind::Vqe);
        assert_eq!(
            "compute-energy".parse::<TaskKind>().unwrap(),
            TaskKind::ComputeEnergy
        );
        assert!("gradient".parse::<TaskKind>().is_err());
        assert_eq!(TaskKind::ComputeEnergy.to_string(), "compute-energy");
    }

    #[test]
    fn test_explicit_initial_parameters() {
        let params = initial_parameters(2, Some(&[0.1, 0.2]), None).unwrap();
        assert_eq!(params, vec![0.1, 0.2]);
        assert!(initial_parameters(3, Some(&[0.1]), None).is_err());
    }

    #[test]
    fn test_seeded_initial_parameters() {
        let a = initial_parameters(5, None, Some(7)).unwrap();
        let b = initial_parameters(5, None, Some(7)).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|p| (-PI..PI).contains(p)));
    }
}
