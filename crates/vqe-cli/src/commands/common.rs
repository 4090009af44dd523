//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tokio::task::JoinSet;
use tracing::{debug, info};

use vqe_adapter_sim::StatevectorAccelerator;
use vqe_engine::{
    Ansatz, Communicator, EnergyEvaluator, EvaluatorConfig, JsonLinesSink, KernelBuilder,
    LocalGroup, MeasurementKernel, NelderMead, RecordSink, TaskKind, TaskResult, VqeTask,
};
use vqe_hal::Accelerator;
use vqe_ops::molecules::h2_sto3g;
use vqe_ops::{FermionHamiltonian, FermionToQubit, PauliSum, Transformation, parse_fermion_source};

use crate::config::{AnsatzKind, VqeConfig};
use crate::{EvalArgs, ProblemArgs};

/// A Hamiltonian mapped onto a qubit register.
pub struct Problem {
    /// Where the Hamiltonian came from.
    pub source: String,
    pub fermion: FermionHamiltonian,
    pub qubit: PauliSum,
    pub num_qubits: u32,
    pub strategy: Transformation,
}

/// Merge file, environment and command-line settings, then validate.
pub fn resolve_config(problem: &ProblemArgs, eval: Option<&EvalArgs>) -> Result<VqeConfig> {
    let mut config = VqeConfig::load(problem.config.as_deref())?;

    if let Some(path) = &problem.hamiltonian {
        config.problem.hamiltonian = Some(path.clone());
    }
    if let Some(encoding) = &problem.encoding {
        config.problem.encoding = encoding.parse()?;
    }
    if let Some(qubits) = problem.qubits {
        config.problem.num_qubits = Some(qubits);
    }
    if let Some(electrons) = problem.electrons {
        config.problem.electrons = electrons;
    }

    if let Some(eval) = eval {
        if let Some(ansatz) = &eval.ansatz {
            config.ansatz.kind = ansatz.parse()?;
        }
        if let Some(threads) = eval.threads {
            config.evaluator.threads = Some(threads);
        }
        if let Some(ranks) = eval.ranks {
            config.evaluator.ranks = ranks;
        }
        config.evaluator.batch |= eval.batch;
        config.evaluator.readout_error |= eval.readout_error;
        if let Some(shots) = eval.shots {
            config.evaluator.shots = shots;
        }
        if let Some(noise) = eval.readout_noise {
            config.evaluator.readout_noise = noise;
        }
        if let Some(map) = &eval.qubit_map {
            config.evaluator.qubit_map = Some(parse_list(map, "qubit map")?);
        }
        if let Some(values) = &eval.parameters {
            config.parameters = Some(parse_list(values, "parameters")?);
        }
        if let Some(seed) = eval.seed {
            config.seed = Some(seed);
        }
        if let Some(output) = &eval.output {
            config.output = Some(output.clone());
        }
    }

    config.validate()?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

/// Parse a comma-separated list.
pub fn parse_list<T>(input: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<T>()
                .with_context(|| format!("Invalid {what} entry: '{item}'"))
        })
        .collect()
}

/// Load the fermion Hamiltonian named by `path`, or the built-in H2 example.
pub fn load_hamiltonian(path: Option<&Path>) -> Result<(FermionHamiltonian, String)> {
    let Some(path) = path else {
        return Ok((h2_sto3g()?, "built-in H2/STO-3G".to_string()));
    };
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let hamiltonian = parse_fermion_source(&source)
        .with_context(|| format!("Failed to parse Hamiltonian: {}", path.display()))?;
    Ok((hamiltonian, path.display().to_string()))
}

/// Load and map the Hamiltonian described by `config`.
pub fn load_problem(config: &VqeConfig) -> Result<Problem> {
    let (fermion, source) = load_hamiltonian(config.problem.hamiltonian.as_deref())?;
    if fermion.is_empty() {
        anyhow::bail!("Hamiltonian {source} has no terms");
    }
    let num_qubits = config
        .problem
        .num_qubits
        .unwrap_or_else(|| fermion.num_sites());
    config.check_register(num_qubits)?;

    let strategy = Transformation::new(config.problem.encoding);
    let qubit = strategy
        .transform(&fermion, num_qubits)
        .with_context(|| format!("Failed to apply {} to {source}", strategy.name()))?;
    info!(
        encoding = strategy.name(),
        fermion_terms = fermion.len(),
        pauli_terms = qubit.len(),
        num_qubits,
        "mapped Hamiltonian"
    );

    Ok(Problem {
        source,
        fermion,
        qubit,
        num_qubits,
        strategy,
    })
}

/// Build the configured ansatz for `problem`.
pub fn build_ansatz(kind: AnsatzKind, electrons: u32, problem: &Problem) -> Result<Ansatz> {
    let ansatz = match kind {
        AnsatzKind::Uccsd => Ansatz::uccsd(problem.num_qubits, electrons, &problem.strategy)?,
        AnsatzKind::HartreeFock => {
            Ansatz::hartree_fock(problem.num_qubits, electrons, &problem.strategy)?
        }
        AnsatzKind::Identity => Ansatz::identity(problem.num_qubits),
    };
    Ok(ansatz)
}

/// Build the measurement kernels of `problem`.
pub fn build_kernels(problem: &Problem, readout_error: bool) -> Result<Vec<MeasurementKernel>> {
    Ok(KernelBuilder::new()
        .with_num_qubits(problem.num_qubits)
        .with_readout_calibration(readout_error)
        .build(&problem.qubit)?)
}

/// Create the simulator described by `config`.
pub fn build_accelerator(config: &VqeConfig) -> Result<Arc<dyn Accelerator>> {
    let mut simulator = StatevectorAccelerator::new().with_shots(config.evaluator.shots);
    if let Some(seed) = config.seed {
        simulator = simulator.with_seed(seed);
    }
    if config.evaluator.readout_noise > 0.0 {
        simulator = simulator.with_readout_error(config.evaluator.readout_noise)?;
    }
    Ok(Arc::new(simulator))
}

/// One evaluator per configured rank, sharing a single simulator.
pub fn build_evaluators(
    config: &VqeConfig,
    kernels: Vec<MeasurementKernel>,
    ansatz: Ansatz,
) -> Result<Vec<EnergyEvaluator>> {
    let accelerator = build_accelerator(config)?;

    let mut settings = EvaluatorConfig::default()
        .with_batch(config.evaluator.batch)
        .with_readout_error(config.evaluator.readout_error);
    if let Some(threads) = config.evaluator.threads {
        settings = settings.with_threads(threads);
    }
    if let Some(map) = &config.evaluator.qubit_map {
        settings = settings.with_qubit_map(map.clone());
    }

    let ranks = config.evaluator.ranks;
    if ranks <= 1 {
        let evaluator = EnergyEvaluator::new(accelerator, kernels, ansatz).with_config(settings);
        return Ok(vec![evaluator]);
    }

    Ok(LocalGroup::create(ranks)
        .into_iter()
        .map(|member| {
            let communicator: Arc<dyn Communicator> = Arc::new(member);
            EnergyEvaluator::new(Arc::clone(&accelerator), kernels.clone(), ansatz.clone())
                .with_config(settings.clone())
                .with_communicator(communicator)
        })
        .collect())
}

/// Optimizer from the configured criteria.
pub fn build_optimizer(config: &VqeConfig) -> NelderMead {
    NelderMead::new()
        .with_criteria(config.optimizer.criteria())
        .with_initial_step(config.optimizer.initial_step)
}

/// Open the configured record sink.
pub fn open_sink(path: Option<&Path>) -> Result<Option<Box<dyn RecordSink>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let sink = JsonLinesSink::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(Some(Box::new(sink)))
}

/// Print a one-line problem summary.
pub fn print_problem(problem: &Problem) {
    println!(
        "  Hamiltonian: {} ({} fermion terms → {} Pauli terms, {} qubits, {})",
        style(&problem.source).green(),
        problem.fermion.len(),
        problem.qubit.len(),
        problem.num_qubits,
        style(problem.strategy.name()).yellow()
    );
}

/// Format angles for display.
pub fn format_angles(angles: &[f64]) -> String {
    angles
        .iter()
        .map(|a| format!("{a:.6}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Run `kind` on every rank concurrently and return rank 0's result.
///
/// The sink, if any, is attached to rank 0. When ranks fail, the error of the
/// lowest failing rank is returned.
pub async fn run_task(
    evaluators: Vec<EnergyEvaluator>,
    optimizer: NelderMead,
    kind: TaskKind,
    parameters: Vec<f64>,
    mut sink: Option<Box<dyn RecordSink>>,
) -> Result<TaskResult> {
    let mut ranks = JoinSet::new();
    for evaluator in evaluators {
        let rank = evaluator.rank();
        let mut task = VqeTask::new(evaluator).with_optimizer(optimizer.clone());
        if rank == 0 {
            if let Some(sink) = sink.take() {
                task = task.with_sink(sink);
            }
        }
        let parameters = parameters.clone();
        ranks.spawn(async move { (rank, task.execute(kind, &parameters).await) });
    }

    let mut root = None;
    let mut failures = Vec::new();
    while let Some(joined) = ranks.join_next().await {
        let (rank, outcome) = joined.context("Rank task panicked")?;
        match outcome {
            Ok(result) if rank == 0 => root = Some(result),
            Ok(_) => {}
            Err(e) => {
                debug!(rank, error = %e, "rank failed");
                failures.push((rank, e));
            }
        }
    }

    // Lowest rank first so the reported error is reproducible.
    if let Some((_, e)) = failures.into_iter().min_by_key(|(rank, _)| *rank) {
        return Err(e.into());
    }
    root.ok_or_else(|| anyhow::anyhow!("Rank 0 produced no result"))
}
