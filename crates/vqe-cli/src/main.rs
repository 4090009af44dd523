//! VQE Command-Line Interface
//!
//! Maps fermion Hamiltonians to qubit operators, lists their measurement
//! kernels, and evaluates or minimizes the energy on the statevector
//! simulator.
//!
//! ```text
//! vqe transform -H h2.kernel --encoding bk
//! vqe kernels --readout-error
//! vqe energy --ansatz hartree-fock
//! vqe run --threads 4 --ranks 2 --seed 7 --output iterations.jsonl
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{energy, kernels, run, transform};

/// VQE - fermionic variational eigensolver on a distributed simulator
#[derive(Parser)]
#[command(name = "vqe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Problem selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ProblemArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fermion Hamiltonian source file (built-in H2/STO-3G if omitted)
    #[arg(short = 'H', long)]
    pub hamiltonian: Option<PathBuf>,

    /// Fermion-to-qubit encoding (jordan-wigner, bravyi-kitaev)
    #[arg(short, long)]
    pub encoding: Option<String>,

    /// Register width (defaults to the highest orbital index plus one)
    #[arg(long)]
    pub qubits: Option<u32>,

    /// Electrons in the reference state
    #[arg(long)]
    pub electrons: Option<u32>,
}

/// Evaluator settings shared by `energy` and `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct EvalArgs {
    /// Ansatz (uccsd, hartree-fock, identity)
    #[arg(short, long)]
    pub ansatz: Option<String>,

    /// Worker tasks per rank
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// In-process ranks
    #[arg(long)]
    pub ranks: Option<usize>,

    /// Submit each worker's kernels as one batch
    #[arg(long)]
    pub batch: bool,

    /// Run readout calibration kernels
    #[arg(long)]
    pub readout_error: bool,

    /// Shots per circuit (0 for exact probabilities)
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Simulated readout bit-flip probability
    #[arg(long)]
    pub readout_noise: Option<f64>,

    /// Logical-to-physical qubit map, comma separated
    #[arg(long)]
    pub qubit_map: Option<String>,

    /// Parameter values, comma separated
    #[arg(short, long, allow_hyphen_values = true)]
    pub parameters: Option<String>,

    /// Seed for initial parameters and shot sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write one JSON line per evaluation to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a fermion Hamiltonian to a qubit Hamiltonian
    Transform {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the measurement kernels of a Hamiltonian
    Kernels {
        #[command(flatten)]
        problem: ProblemArgs,

        /// Include readout calibration kernels
        #[arg(long)]
        readout_error: bool,

        /// Print each kernel's circuit
        #[arg(long)]
        circuits: bool,
    },

    /// Evaluate the energy once
    Energy {
        #[command(flatten)]
        problem: ProblemArgs,

        #[command(flatten)]
        eval: EvalArgs,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Minimize the energy with Nelder-Mead
    Run {
        #[command(flatten)]
        problem: ProblemArgs,

        #[command(flatten)]
        eval: EvalArgs,

        /// Upper bound on optimizer iterations
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Convergence threshold on the energy spread
        #[arg(long)]
        energy_delta: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG takes precedence over -v.
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Transform { problem, output } => {
            transform::execute(&problem, output.as_deref()).await
        }

        Commands::Kernels {
            problem,
            readout_error,
            circuits,
        } => kernels::execute(&problem, readout_error, circuits).await,

        Commands::Energy {
            problem,
            eval,
            format,
        } => energy::execute(&problem, &eval, &format).await,

        Commands::Run {
            problem,
            eval,
            max_iterations,
            energy_delta,
        } => run::execute(&problem, &eval, max_iterations, energy_delta).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
