//! Run command implementation.

use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use vqe_engine::{TaskKind, initial_parameters};

use super::common::{
    build_ansatz, build_evaluators, build_kernels, build_optimizer, format_angles, load_problem,
    open_sink, print_problem, resolve_config, run_task,
};
use crate::{EvalArgs, ProblemArgs};

/// Execute the run command.
pub async fn execute(
    problem_args: &ProblemArgs,
    eval: &EvalArgs,
    max_iterations: Option<usize>,
    energy_delta: Option<f64>,
) -> Result<()> {
    let mut config = resolve_config(problem_args, Some(eval))?;
    if let Some(max_iterations) = max_iterations {
        config.optimizer.max_iterations = max_iterations;
    }
    if let Some(energy_delta) = energy_delta {
        config.optimizer.energy_delta = energy_delta;
    }
    config.validate()?;

    let problem = load_problem(&config)?;
    let ansatz = build_ansatz(config.ansatz.kind, config.problem.electrons, &problem)?;
    let parameters = initial_parameters(
        ansatz.num_parameters(),
        config.parameters.as_deref(),
        config.seed,
    )?;

    println!(
        "{} Running VQE with {} ({} parameters, {} rank(s))",
        style("→").cyan().bold(),
        style(config.ansatz.kind).yellow(),
        ansatz.num_parameters(),
        config.evaluator.ranks
    );
    print_problem(&problem);
    println!("  Initial: ({})", format_angles(&parameters));

    let kernels = build_kernels(&problem, config.evaluator.readout_error)?;
    let evaluators = build_evaluators(&config, kernels, ansatz)?;
    let sink = open_sink(config.output.as_deref())?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Optimizing...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let outcome = run_task(
        evaluators,
        build_optimizer(&config),
        TaskKind::Vqe,
        parameters,
        sink,
    )
    .await;
    spinner.finish_and_clear();
    let result = outcome?;

    let status = if result.converged {
        style("converged").green()
    } else {
        style("iteration limit reached").yellow()
    };
    println!(
        "{} Optimization {} after {} iterations ({:.2?})",
        style("✓").green().bold(),
        status,
        result.iterations,
        started.elapsed()
    );
    println!("  Evaluations:       {}", result.evaluations());
    println!("  Accelerator calls: {}", result.accelerator_calls);
    println!("  Angles: ({})", format_angles(&result.angles));
    println!(
        "  {} {}",
        style("Energy:").bold(),
        style(format!("{:.10}", result.energy)).green().bold()
    );
    if let Some(path) = &config.output {
        println!("  Records: {}", style(path.display()).green());
    }

    Ok(())
}
