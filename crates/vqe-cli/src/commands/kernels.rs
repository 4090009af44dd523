//! Kernels command implementation.

use anyhow::Result;
use console::style;

use vqe_engine::KernelKind;

use super::common::{build_kernels, load_problem, print_problem, resolve_config};
use crate::ProblemArgs;

/// Execute the kernels command.
pub async fn execute(args: &ProblemArgs, readout_error: bool, circuits: bool) -> Result<()> {
    let config = resolve_config(args, None)?;
    let problem = load_problem(&config)?;

    println!(
        "{} Measurement kernels for {}",
        style("→").cyan().bold(),
        style(&problem.source).green()
    );
    print_problem(&problem);

    let kernels = build_kernels(&problem, readout_error)?;
    let executed = kernels.iter().filter(|k| k.kind().is_executed()).count();
    let calibration = kernels
        .iter()
        .filter(|k| matches!(k.kind(), KernelKind::ReadoutCalibration { .. }))
        .count();

    println!();
    println!(
        "  {:<24} {:<26} {:>16}",
        style("Name").bold(),
        style("Kind").bold(),
        style("Coefficient").bold()
    );
    println!("  {}", "-".repeat(80));
    for kernel in &kernels {
        println!("  {kernel}");
        if circuits {
            let gates: Vec<String> = kernel
                .circuit()
                .instructions()
                .iter()
                .map(|inst| {
                    let qubits: Vec<String> = inst.qubits.iter().map(|q| q.0.to_string()).collect();
                    format!("{}({})", inst.name(), qubits.join(","))
                })
                .collect();
            println!("      {}", style(gates.join(" ")).dim());
        }
    }

    println!();
    println!(
        "  {} kernels ({} executed, {} calibration)",
        kernels.len(),
        executed,
        calibration
    );

    Ok(())
}
