//! Energy command implementation.

use anyhow::Result;
use console::style;

use vqe_engine::{
    IterationRecord, JsonLinesSink, MemorySink, RecordSink, TaskKind, initial_parameters,
};

use super::common::{
    build_ansatz, build_evaluators, build_kernels, build_optimizer, format_angles, load_problem,
    print_problem, resolve_config, run_task,
};
use crate::{EvalArgs, ProblemArgs};

/// Execute the energy command.
pub async fn execute(problem_args: &ProblemArgs, eval: &EvalArgs, format: &str) -> Result<()> {
    let json = match format.to_lowercase().as_str() {
        "json" => true,
        "table" => false,
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    };

    let config = resolve_config(problem_args, Some(eval))?;
    let problem = load_problem(&config)?;
    let ansatz = build_ansatz(config.ansatz.kind, config.problem.electrons, &problem)?;

    // Unlike `run`, a missing parameter vector means all zeros.
    let zeros = vec![0.0; ansatz.num_parameters()];
    let parameters = initial_parameters(
        ansatz.num_parameters(),
        Some(config.parameters.as_deref().unwrap_or(&zeros)),
        None,
    )?;

    if !json {
        println!(
            "{} Computing energy with {} ({} parameters)",
            style("→").cyan().bold(),
            style(config.ansatz.kind).yellow(),
            ansatz.num_parameters()
        );
        print_problem(&problem);
    }

    let kernels = build_kernels(&problem, config.evaluator.readout_error)?;
    let evaluators = build_evaluators(&config, kernels, ansatz)?;
    let memory = MemorySink::new();
    let result = run_task(
        evaluators,
        build_optimizer(&config),
        TaskKind::ComputeEnergy,
        parameters,
        Some(Box::new(memory.clone())),
    )
    .await?;

    let records = memory.records();
    let Some(record) = records.last() else {
        anyhow::bail!("No evaluation was recorded");
    };

    if let Some(path) = &config.output {
        let mut sink = JsonLinesSink::create(path)?;
        sink.record(record)?;
        sink.flush()?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_record(record);
        println!(
            "  {} {}",
            style("Accelerator calls:").bold(),
            result.accelerator_calls
        );
    }

    Ok(())
}

fn print_record(record: &IterationRecord) {
    println!();
    println!("  {:<28} {:>18}", style("Kernel").bold(), style("<P>").bold());
    println!("  {}", "-".repeat(48));
    for (name, value) in &record.expectations {
        println!("  {name:<28} {value:>+18.12}");
    }
    if !record.calibration.is_empty() {
        println!();
        println!(
            "  {:<28} {:>18}",
            style("Calibration").bold(),
            style("P(flip)").bold()
        );
        println!("  {}", "-".repeat(48));
        for (name, value) in &record.calibration {
            println!("  {name:<28} {value:>18.12}");
        }
    }
    println!();
    println!("  {} ({})", style("Parameters:").bold(), format_angles(&record.parameters));
    println!(
        "  {} {}",
        style("Energy:").bold(),
        style(format!("{:.10}", record.energy)).green().bold()
    );
}
