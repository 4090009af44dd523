//! Per-iteration records.
//!
//! The driver hands one [`IterationRecord`] per energy evaluation to a
//! [`RecordSink`]. [`JsonLinesSink`] writes one JSON object per line;
//! [`MemorySink`] keeps them for inspection.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::result::EnergyResult;

/// Snapshot of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 0-based evaluation counter.
    pub iteration: usize,
    /// Parameter vector evaluated.
    pub parameters: Vec<f64>,
    /// Energy at `parameters`.
    pub energy: f64,
    /// ⟨term⟩ per kernel name.
    pub expectations: BTreeMap<String, f64>,
    /// Calibration probabilities per kernel name.
    pub calibration: BTreeMap<String, f64>,
    /// Accelerator executions for this evaluation.
    pub executions: u64,
    /// Wall-clock time the record was taken.
    pub timestamp: DateTime<Utc>,
}

impl IterationRecord {
    /// Record `result` as evaluation number `iteration`.
    pub fn new(iteration: usize, parameters: &[f64], result: &EnergyResult) -> Self {
        Self {
            iteration,
            parameters: parameters.to_vec(),
            energy: result.energy,
            expectations: result.per_term_expectation.clone(),
            calibration: result.calibration_probabilities.clone(),
            executions: result.total_execution_count,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for iteration records.
pub trait RecordSink: Send {
    /// Store one record.
    fn record(&mut self, record: &IterationRecord) -> EngineResult<()>;

    /// Push buffered records to their destination.
    fn flush(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

/// Writes records as JSON lines.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path` and write records to it.
    pub fn create(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| EngineError::Record(format!("{}: {e}", path.display())))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Write records to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn record(&mut self, record: &IterationRecord) -> EngineResult<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| EngineError::Record(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| EngineError::Record(e.to_string()))
    }

    fn flush(&mut self) -> EngineResult<()> {
        self.writer
            .flush()
            .map_err(|e| EngineError::Record(e.to_string()))
    }
}

/// Keeps records in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<IterationRecord>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn records(&self) -> Vec<IterationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordSink for MemorySink {
    fn record(&mut self, record: &IterationRecord) -> EngineResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
