//! Run configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. YAML configuration file
//! 3. Environment variables (with `VQE_` prefix)
//! 4. Command-line flags
//!
//! ```yaml
//! problem:
//!   hamiltonian: h2.kernel
//!   encoding: bk
//!   electrons: 2
//! ansatz:
//!   kind: uccsd
//! evaluator:
//!   threads: 4
//!   readout_error: true
//! optimizer:
//!   max_iterations: 200
//! seed: 42
//! output: iterations.jsonl
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vqe_engine::ConvergenceCriteria;
use vqe_ops::Encoding;

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VqeConfig {
    /// Hamiltonian and encoding.
    pub problem: ProblemConfig,

    /// State preparation.
    pub ansatz: AnsatzConfig,

    /// Kernel execution.
    pub evaluator: EvaluatorSection,

    /// Stopping criteria and simplex size.
    pub optimizer: OptimizerConfig,

    /// Explicit initial parameters.
    pub parameters: Option<Vec<f64>>,

    /// Seed for random initial parameters and shot sampling.
    pub seed: Option<u64>,

    /// JSON-lines file receiving one record per evaluation.
    pub output: Option<PathBuf>,
}

/// Problem definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProblemConfig {
    /// Hamiltonian source file. The built-in H2 example when absent.
    pub hamiltonian: Option<PathBuf>,

    /// Register width. Defaults to the highest orbital index plus one.
    pub num_qubits: Option<u32>,

    /// Fermion-to-qubit encoding.
    pub encoding: Encoding,

    /// Electrons in the reference state.
    pub electrons: u32,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            hamiltonian: None,
            num_qubits: None,
            encoding: Encoding::JordanWigner,
            electrons: 2,
        }
    }
}

/// State-preparation choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnsatzKind {
    /// Unitary coupled cluster, singles and doubles.
    #[default]
    Uccsd,
    /// The Hartree-Fock determinant, no parameters.
    HartreeFock,
    /// The empty circuit, no parameters.
    Identity,
}

impl fmt::Display for AnsatzKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnsatzKind::Uccsd => f.write_str("uccsd"),
            AnsatzKind::HartreeFock => f.write_str("hartree-fock"),
            AnsatzKind::Identity => f.write_str("identity"),
        }
    }
}

impl FromStr for AnsatzKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uccsd" => Ok(AnsatzKind::Uccsd),
            "hartree-fock" | "hf" => Ok(AnsatzKind::HartreeFock),
            "identity" | "none" => Ok(AnsatzKind::Identity),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown ansatz: '{other}' (expected uccsd, hartree-fock or identity)"
            ))),
        }
    }
}

/// Ansatz settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnsatzConfig {
    /// Which ansatz to build.
    pub kind: AnsatzKind,
}

/// Evaluator and simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorSection {
    /// Worker tasks per rank. Defaults to the available parallelism.
    pub threads: Option<usize>,

    /// In-process ranks.
    pub ranks: usize,

    /// Submit each worker's kernels as one batch.
    pub batch: bool,

    /// Execute readout calibration kernels.
    pub readout_error: bool,

    /// Shots per circuit; 0 for exact probabilities.
    pub shots: u32,

    /// Simulated readout bit-flip probability.
    pub readout_noise: f64,

    /// Logical → physical qubit map.
    pub qubit_map: Option<Vec<u32>>,
}

impl Default for EvaluatorSection {
    fn default() -> Self {
        Self {
            threads: None,
            ranks: 1,
            batch: false,
            readout_error: false,
            shots: 0,
            readout_noise: 0.0,
            qubit_map: None,
        }
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Upper bound on optimizer iterations.
    pub max_iterations: usize,

    /// Convergence threshold on the energy spread.
    pub energy_delta: f64,

    /// Initial simplex edge length.
    pub initial_step: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let criteria = ConvergenceCriteria::default();
        Self {
            max_iterations: criteria.max_iterations,
            energy_delta: criteria.energy_delta,
            initial_step: 0.5,
        }
    }
}

impl OptimizerConfig {
    /// Stopping criteria for the optimizer.
    pub fn criteria(&self) -> ConvergenceCriteria {
        ConvergenceCriteria {
            max_iterations: self.max_iterations,
            energy_delta: self.energy_delta,
        }
    }
}

impl VqeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml_ng::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    ///
    /// Command-line overrides are applied by the caller, which then validates.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => VqeConfig::default(),
        };
        config.merge_env()
    }

    /// Merge `VQE_*` environment variables into this configuration.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge variables from `lookup`. Absent variables leave fields unchanged.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Problem
        if let Some(v) = lookup("VQE_HAMILTONIAN") {
            self.problem.hamiltonian = Some(PathBuf::from(v));
        }
        if let Some(v) = parsed::<u32>(&lookup, "VQE_QUBITS")? {
            self.problem.num_qubits = Some(v);
        }
        if let Some(v) = lookup("VQE_ENCODING") {
            self.problem.encoding = v
                .parse()
                .map_err(|e| ConfigError::ValidationError(format!("VQE_ENCODING: {e}")))?;
        }
        if let Some(v) = parsed::<u32>(&lookup, "VQE_ELECTRONS")? {
            self.problem.electrons = v;
        }

        // Ansatz
        if let Some(v) = lookup("VQE_ANSATZ") {
            self.ansatz.kind = v.parse()?;
        }

        // Evaluator
        if let Some(v) = parsed::<usize>(&lookup, "VQE_THREADS")? {
            self.evaluator.threads = Some(v);
        }
        if let Some(v) = parsed::<usize>(&lookup, "VQE_RANKS")? {
            self.evaluator.ranks = v;
        }
        if let Some(v) = parsed::<bool>(&lookup, "VQE_BATCH")? {
            self.evaluator.batch = v;
        }
        if let Some(v) = parsed::<bool>(&lookup, "VQE_READOUT_ERROR")? {
            self.evaluator.readout_error = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "VQE_SHOTS")? {
            self.evaluator.shots = v;
        }

        // Optimizer
        if let Some(v) = parsed::<usize>(&lookup, "VQE_MAX_ITERATIONS")? {
            self.optimizer.max_iterations = v;
        }
        if let Some(v) = parsed::<f64>(&lookup, "VQE_ENERGY_DELTA")? {
            self.optimizer.energy_delta = v;
        }

        if let Some(v) = parsed::<u64>(&lookup, "VQE_SEED")? {
            self.seed = Some(v);
        }
        if let Some(v) = lookup("VQE_OUTPUT") {
            self.output = Some(PathBuf::from(v));
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluator.threads == Some(0) {
            return Err(ConfigError::ValidationError(
                "evaluator.threads must be at least 1".into(),
            ));
        }
        if self.evaluator.ranks == 0 {
            return Err(ConfigError::ValidationError(
                "evaluator.ranks must be at least 1".into(),
            ));
        }
        if !(0.0..=0.5).contains(&self.evaluator.readout_noise) {
            return Err(ConfigError::ValidationError(format!(
                "evaluator.readout_noise must be in [0, 0.5], got {}",
                self.evaluator.readout_noise
            )));
        }
        if !(self.optimizer.energy_delta > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "optimizer.energy_delta must be positive, got {}",
                self.optimizer.energy_delta
            )));
        }
        if !(self.optimizer.initial_step > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "optimizer.initial_step must be positive, got {}",
                self.optimizer.initial_step
            )));
        }
        if let Some(map) = &self.evaluator.qubit_map {
            let mut seen = map.clone();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != map.len() {
                return Err(ConfigError::ValidationError(format!(
                    "evaluator.qubit_map maps two qubits to the same target: {map:?}"
                )));
            }
        }
        match self.problem.num_qubits {
            Some(n) => self.check_register(n),
            None => Ok(()),
        }
    }

    /// Check the settings that depend on the register width.
    ///
    /// [`validate`](Self::validate) runs this only when `problem.num_qubits`
    /// is set; otherwise call it once the width is inferred from the
    /// Hamiltonian.
    pub fn check_register(&self, num_qubits: u32) -> Result<(), ConfigError> {
        if let Some(map) = &self.evaluator.qubit_map {
            if map.len() < num_qubits as usize {
                return Err(ConfigError::ValidationError(format!(
                    "evaluator.qubit_map covers {} qubits but the problem has {num_qubits}",
                    map.len()
                )));
            }
        }
        if self.problem.electrons > num_qubits {
            return Err(ConfigError::ValidationError(format!(
                "problem.electrons ({}) exceeds the {num_qubits} qubit register",
                self.problem.electrons
            )));
        }
        Ok(())
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::ValidationError(format!("{key}='{v}': {e}")))
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = VqeConfig::default();
        assert_eq!(config.problem.encoding, Encoding::JordanWigner);
        assert_eq!(config.problem.electrons, 2);
        assert_eq!(config.ansatz.kind, AnsatzKind::Uccsd);
        assert_eq!(config.evaluator.ranks, 1);
        assert_eq!(config.optimizer.max_iterations, 1000);
        assert!((config.optimizer.energy_delta - 1e-6).abs() < 1e-18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let config = VqeConfig::from_yaml(
            r"
problem:
  hamiltonian: h2.kernel
  encoding: bk
ansatz:
  kind: hartree-fock
evaluator:
  threads: 3
  readout_error: true
  qubit_map: [3, 2, 1, 0]
optimizer:
  max_iterations: 50
seed: 7
",
        )
        .unwrap();
        assert_eq!(config.problem.hamiltonian, Some(PathBuf::from("h2.kernel")));
        assert_eq!(config.problem.encoding, Encoding::BravyiKitaev);
        assert_eq!(config.ansatz.kind, AnsatzKind::HartreeFock);
        assert_eq!(config.evaluator.threads, Some(3));
        assert!(config.evaluator.readout_error);
        assert_eq!(config.evaluator.qubit_map, Some(vec![3, 2, 1, 0]));
        assert_eq!(config.optimizer.max_iterations, 50);
        assert!((config.optimizer.energy_delta - 1e-6).abs() < 1e-18);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = VqeConfig::from_yaml("evaluator:\n  treads: 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = VqeConfig::from_yaml("problem:\n  encoding: jw\nevaluator:\n  threads: 2\n")
            .unwrap()
            .merge_vars(vars(&[
                ("VQE_ENCODING", "bk"),
                ("VQE_THREADS", "8"),
                ("VQE_ANSATZ", "identity"),
                ("VQE_BATCH", "true"),
            ]))
            .unwrap();
        assert_eq!(config.problem.encoding, Encoding::BravyiKitaev);
        assert_eq!(config.evaluator.threads, Some(8));
        assert_eq!(config.ansatz.kind, AnsatzKind::Identity);
        assert!(config.evaluator.batch);
    }

    #[test]
    fn test_absent_env_leaves_values() {
        let config = VqeConfig::from_yaml("seed: 3\n")
            .unwrap()
            .merge_vars(vars(&[]))
            .unwrap();
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_malformed_env_rejected() {
        let err = VqeConfig::default()
            .merge_vars(vars(&[("VQE_THREADS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("VQE_THREADS"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = VqeConfig::default();
        config.evaluator.threads = Some(0);
        assert!(config.validate().is_err());

        let mut config = VqeConfig::default();
        config.evaluator.ranks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tolerances() {
        let mut config = VqeConfig::default();
        config.optimizer.energy_delta = 0.0;
        assert!(config.validate().is_err());

        let mut config = VqeConfig::default();
        config.optimizer.initial_step = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_qubit_map() {
        let mut config = VqeConfig::default();
        config.evaluator.qubit_map = Some(vec![0, 1, 1, 2]);
        assert!(config.validate().is_err());

        config.evaluator.qubit_map = Some(vec![1, 0]);
        config.problem.num_qubits = Some(4);
        assert!(config.validate().is_err());

        config.evaluator.qubit_map = Some(vec![3, 2, 1, 0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_check_register_with_inferred_width() {
        let mut config = VqeConfig::default();
        config.evaluator.qubit_map = Some(vec![1, 0]);
        assert!(config.problem.num_qubits.is_none());
        assert!(config.validate().is_ok());

        assert!(config.check_register(2).is_ok());
        let err = config.check_register(4).unwrap_err();
        assert!(err.to_string().contains("covers 2 qubits"), "{err}");

        config.evaluator.qubit_map = None;
        config.problem.electrons = 3;
        assert!(config.check_register(2).is_err());
    }

    #[test]
    fn test_ansatz_kind_parsing() {
        assert_eq!("HF".parse::<AnsatzKind>().unwrap(), AnsatzKind::HartreeFock);
        assert_eq!("uccsd".parse::<AnsatzKind>().unwrap(), AnsatzKind::Uccsd);
        assert!("ucc".parse::<AnsatzKind>().is_err());
        assert_eq!(AnsatzKind::HartreeFock.to_string(), "hartree-fock");
    }
}
