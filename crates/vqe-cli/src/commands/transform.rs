//! Transform command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use super::common::{load_problem, print_problem, resolve_config};
use crate::ProblemArgs;

/// Execute the transform command.
pub async fn execute(args: &ProblemArgs, output: Option<&Path>) -> Result<()> {
    let config = resolve_config(args, None)?;

    println!(
        "{} Transforming with {}",
        style("→").cyan().bold(),
        style(config.problem.encoding).yellow()
    );

    let problem = load_problem(&config)?;
    print_problem(&problem);

    let rendered = problem.qubit.to_string();
    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            println!(
                "{} Wrote {} terms to {}",
                style("✓").green().bold(),
                problem.qubit.len(),
                style(path.display()).green()
            );
        }
        None => {
            println!();
            print!("{rendered}");
        }
    }

    Ok(())
}
