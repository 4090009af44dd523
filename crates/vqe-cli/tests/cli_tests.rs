//! CLI command parsing and utility tests.
//!
//! Tests cover argument parsing (via clap `try_parse_from`),
//! the helpers in `commands::common`, and error paths.

// The CLI is a binary crate, so the clap structures are mirrored here and the
// helpers are exercised through the underlying crates.

// ============================================================================
// Argument parsing
// ============================================================================

mod arg_parsing {
    use clap::{Args, Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[command(name = "vqe")]
    struct Cli {
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Args, Debug, Clone, Default)]
    struct ProblemArgs {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short = 'H', long)]
        hamiltonian: Option<PathBuf>,
        #[arg(short, long)]
        encoding: Option<String>,
        #[arg(long)]
        qubits: Option<u32>,
        #[arg(long)]
        electrons: Option<u32>,
    }

    #[derive(Args, Debug, Clone, Default)]
    struct EvalArgs {
        #[arg(short, long)]
        ansatz: Option<String>,
        #[arg(short, long)]
        threads: Option<usize>,
        #[arg(long)]
        ranks: Option<usize>,
        #[arg(long)]
        batch: bool,
        #[arg(long)]
        readout_error: bool,
        #[arg(short, long)]
        shots: Option<u32>,
        #[arg(long)]
        readout_noise: Option<f64>,
        #[arg(long)]
        qubit_map: Option<String>,
        #[arg(short, long, allow_hyphen_values = true)]
        parameters: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    }

    #[derive(Subcommand, Debug)]
    enum Commands {
        Transform {
            #[command(flatten)]
            problem: ProblemArgs,
            #[arg(short, long)]
            output: Option<PathBuf>,
        },
        Kernels {
            #[command(flatten)]
            problem: ProblemArgs,
            #[arg(long)]
            readout_error: bool,
            #[arg(long)]
            circuits: bool,
        },
        Energy {
            #[command(flatten)]
            problem: ProblemArgs,
            #[command(flatten)]
            eval: EvalArgs,
            #[arg(short, long, default_value = "table")]
            format: String,
        },
        Run {
            #[command(flatten)]
            problem: ProblemArgs,
            #[command(flatten)]
            eval: EvalArgs,
            #[arg(long)]
            max_iterations: Option<usize>,
            #[arg(long)]
            energy_delta: Option<f64>,
        },
    }

    #[test]
    fn test_transform_defaults() {
        let cli = Cli::try_parse_from(["vqe", "transform"]).unwrap();
        match cli.command {
            Commands::Transform { problem, output } => {
                assert!(problem.hamiltonian.is_none());
                assert!(problem.encoding.is_none());
                assert!(output.is_none());
            }
            other => panic!("Expected Transform, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_with_options() {
        let cli = Cli::try_parse_from([
            "vqe", "transform", "-H", "h2.kernel", "-e", "bk", "--qubits", "6", "-o", "out.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Transform { problem, output } => {
                assert_eq!(problem.hamiltonian, Some(PathBuf::from("h2.kernel")));
                assert_eq!(problem.encoding.as_deref(), Some("bk"));
                assert_eq!(problem.qubits, Some(6));
                assert_eq!(output, Some(PathBuf::from("out.txt")));
            }
            other => panic!("Expected Transform, got {other:?}"),
        }
    }

    #[test]
    fn test_kernels_flags() {
        let cli =
            Cli::try_parse_from(["vqe", "kernels", "--readout-error", "--circuits"]).unwrap();
        match cli.command {
            Commands::Kernels {
                readout_error,
                circuits,
                ..
            } => {
                assert!(readout_error);
                assert!(circuits);
            }
            other => panic!("Expected Kernels, got {other:?}"),
        }
    }

    #[test]
    fn test_energy_default_format() {
        let cli = Cli::try_parse_from(["vqe", "energy"]).unwrap();
        match cli.command {
            Commands::Energy { format, eval, .. } => {
                assert_eq!(format, "table");
                assert!(!eval.batch);
                assert!(eval.parameters.is_none());
            }
            other => panic!("Expected Energy, got {other:?}"),
        }
    }

    #[test]
    fn test_energy_negative_parameters() {
        let cli = Cli::try_parse_from([
            "vqe",
            "energy",
            "--ansatz",
            "uccsd",
            "-p",
            "-0.1,0.2,0,0,-0.05",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Energy { eval, format, .. } => {
                assert_eq!(eval.parameters.as_deref(), Some("-0.1,0.2,0,0,-0.05"));
                assert_eq!(eval.ansatz.as_deref(), Some("uccsd"));
                assert_eq!(format, "json");
            }
            other => panic!("Expected Energy, got {other:?}"),
        }
    }

    #[test]
    fn test_run_all_options() {
        let cli = Cli::try_parse_from([
            "vqe",
            "-vv",
            "run",
            "-c",
            "vqe.yaml",
            "--threads",
            "4",
            "--ranks",
            "2",
            "--batch",
            "--readout-error",
            "--shots",
            "8192",
            "--readout-noise",
            "0.02",
            "--qubit-map",
            "3,2,1,0",
            "--seed",
            "42",
            "-o",
            "iterations.jsonl",
            "--max-iterations",
            "200",
            "--energy-delta",
            "1e-8",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                problem,
                eval,
                max_iterations,
                energy_delta,
            } => {
                assert_eq!(problem.config, Some(PathBuf::from("vqe.yaml")));
                assert_eq!(eval.threads, Some(4));
                assert_eq!(eval.ranks, Some(2));
                assert!(eval.batch);
                assert!(eval.readout_error);
                assert_eq!(eval.shots, Some(8192));
                assert_eq!(eval.readout_noise, Some(0.02));
                assert_eq!(eval.qubit_map.as_deref(), Some("3,2,1,0"));
                assert_eq!(eval.seed, Some(42));
                assert_eq!(eval.output, Some(PathBuf::from("iterations.jsonl")));
                assert_eq!(max_iterations, Some(200));
                assert_eq!(energy_delta, Some(1e-8));
            }
            other => panic!("Expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["vqe", "kernels", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["vqe"]).is_err());
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["vqe", "gradient"]).is_err());
    }

    #[test]
    fn test_invalid_thread_count() {
        assert!(Cli::try_parse_from(["vqe", "run", "--threads", "many"]).is_err());
    }

    #[test]
    fn test_run_flags_not_on_energy() {
        assert!(Cli::try_parse_from(["vqe", "energy", "--max-iterations", "5"]).is_err());
    }
}

// ============================================================================
// commands::common tests
// ============================================================================

mod common_tests {
    use std::str::FromStr;

    use anyhow::Context;

    /// Equivalent to commands::common::parse_list
    fn parse_list<T>(input: &str, what: &str) -> anyhow::Result<Vec<T>>
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

    #[test]
    fn test_parse_parameters() {
        let values: Vec<f64> = parse_list("0.1, -0.2,3e-2", "parameters").unwrap();
        assert_eq!(values, vec![0.1, -0.2, 0.03]);
    }

    #[test]
    fn test_parse_qubit_map() {
        let map: Vec<u32> = parse_list("3,2,1,0", "qubit map").unwrap();
        assert_eq!(map, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_parse_skips_empty_entries() {
        let values: Vec<f64> = parse_list("1.0,,2.0,", "parameters").unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
        let empty: Vec<f64> = parse_list("", "parameters").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_list::<u32>("0,one,2", "qubit map").unwrap_err();
        assert!(err.to_string().contains("Invalid qubit map entry: 'one'"));
    }

    #[test]
    fn test_negative_qubit_rejected() {
        assert!(parse_list::<u32>("0,-1", "qubit map").is_err());
    }
}

// ============================================================================
// Hamiltonian loading tests
// ============================================================================

mod hamiltonian_loading {
    use std::fs;

    use vqe_ops::molecules::{H2_STO3G, h2_sto3g};
    use vqe_ops::{Encoding, FermionToQubit, Transformation, parse_fermion_source};

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h2.kernel");
        fs::write(&path, H2_STO3G).unwrap();

        let source = fs::read_to_string(&path).unwrap();
        let from_file = parse_fermion_source(&source).unwrap();
        let builtin = h2_sto3g().unwrap();
        assert_eq!(from_file.len(), builtin.len());
        assert_eq!(from_file.num_sites(), 4);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fs::read_to_string(dir.path().join("absent.kernel")).is_err());
    }

    #[test]
    fn test_malformed_source() {
        assert!(parse_fermion_source("0.5 0 x\n").is_err());
    }

    #[test]
    fn test_encodings_share_identity_coefficient() {
        let hamiltonian = h2_sto3g().unwrap();
        let jw = Transformation::new(Encoding::JordanWigner)
            .transform(&hamiltonian, 4)
            .unwrap();
        let bk = Transformation::new(Encoding::BravyiKitaev)
            .transform(&hamiltonian, 4)
            .unwrap();
        assert!((jw.identity_coefficient() - bk.identity_coefficient()).norm() < 1e-12);
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!("jw".parse::<Encoding>().unwrap(), Encoding::JordanWigner);
        assert_eq!("BK".parse::<Encoding>().unwrap(), Encoding::BravyiKitaev);
        assert!("parity".parse::<Encoding>().is_err());
    }
}

// ============================================================================
// Task execution across ranks
// ============================================================================

mod task_execution {
    use std::sync::Arc;

    use tokio::task::JoinSet;

    use vqe_adapter_sim::StatevectorAccelerator;
    use vqe_engine::{
        Ansatz, Communicator, EnergyEvaluator, EvaluatorConfig, JsonLinesSink, KernelBuilder,
        LocalGroup, TaskKind, VqeTask,
    };
    use vqe_hal::Accelerator;
    use vqe_ops::molecules::{H2_HARTREE_FOCK_ENERGY, h2_sto3g};
    use vqe_ops::{Encoding, FermionToQubit, Transformation};

    fn evaluators(ranks: usize) -> Vec<EnergyEvaluator> {
        let strategy = Transformation::new(Encoding::BravyiKitaev);
        let qubit = strategy.transform(&h2_sto3g().unwrap(), 4).unwrap();
        let kernels = KernelBuilder::new().with_num_qubits(4).build(&qubit).unwrap();
        let ansatz = Ansatz::hartree_fock(4, 2, &strategy).unwrap();
        let accelerator: Arc<dyn Accelerator> = Arc::new(StatevectorAccelerator::new());
        let config = EvaluatorConfig::default().with_threads(2);

        LocalGroup::create(ranks)
            .into_iter()
            .map(|member| {
                let communicator: Arc<dyn Communicator> = Arc::new(member);
                EnergyEvaluator::new(Arc::clone(&accelerator), kernels.clone(), ansatz.clone())
                    .with_config(config.clone())
                    .with_communicator(communicator)
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ranks_agree_on_energy() {
        let mut ranks = JoinSet::new();
        for evaluator in evaluators(3) {
            let mut task = VqeTask::new(evaluator);
            ranks.spawn(async move { task.execute(TaskKind::ComputeEnergy, &[]).await });
        }
        let mut energies = Vec::new();
        while let Some(joined) = ranks.join_next().await {
            energies.push(joined.unwrap().unwrap().energy);
        }
        assert_eq!(energies.len(), 3);
        for energy in energies {
            assert!((energy - H2_HARTREE_FOCK_ENERGY).abs() < 1e-8);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_records_written_by_root_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");

        let mut ranks = JoinSet::new();
        for evaluator in evaluators(2) {
            let mut task = VqeTask::new(evaluator);
            if task.evaluator().rank() == 0 {
                task = task.with_sink(Box::new(JsonLinesSink::create(&path).unwrap()));
            }
            ranks.spawn(async move { task.execute(TaskKind::ComputeEnergy, &[]).await });
        }
        while let Some(joined) = ranks.join_next().await {
            joined.unwrap().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        let energy = record["energy"].as_f64().unwrap();
        assert!((energy - H2_HARTREE_FOCK_ENERGY).abs() < 1e-8);
    }
}
