//! Cross-rank communication.
//!
//! A rank is an independent evaluator instance that owns one contiguous
//! slice of the kernel list. Ranks share nothing but the reduction: each
//! deposits its [`PartialEnergy`] and receives the combination of all of them.
//!
//! [`SingleProcess`] is the trivial group of one. [`LocalGroup`] runs several
//! ranks inside one process and synchronizes them on a barrier.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Barrier;

use vqe_hal::HalError;

use crate::error::{EngineError, EngineResult};

/// Why a rank could not produce its share of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerFailure {
    /// Rank that failed.
    pub rank: usize,
    /// Kernel being executed, if the failure is tied to one.
    pub kernel: Option<String>,
    /// Rendered error.
    pub message: String,
}

impl WorkerFailure {
    /// Describe `error` raised on `rank`.
    pub fn from_error(rank: usize, error: &EngineError) -> Self {
        let kernel = match error {
            EngineError::KernelExecution { kernel, .. } => Some(kernel.clone()),
            _ => None,
        };
        Self {
            rank,
            kernel,
            message: error.to_string(),
        }
    }

    /// The error a peer rank reports for this failure.
    pub fn into_error(self) -> EngineError {
        match self.kernel {
            Some(kernel) => EngineError::KernelExecution {
                kernel,
                source: HalError::ExecutionFailed(format!(
                    "reported by rank {}: {}",
                    self.rank, self.message
                )),
            },
            None => EngineError::Communicator(format!("rank {} failed: {}", self.rank, self.message)),
        }
    }
}

/// One worker's or rank's share of an energy evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialEnergy {
    /// Σ coefficient × expectation over the kernels covered.
    pub sum: f64,
    /// Accelerator executions performed.
    pub executions: u64,
    /// Kernels accounted for.
    pub kernels: usize,
    /// `(kernel index, value)` for every kernel covered.
    pub values: Vec<(usize, f64)>,
    /// Set when this share could not be computed.
    pub failure: Option<WorkerFailure>,
}

impl PartialEnergy {
    /// A share that carries only a failure.
    pub fn failed(failure: WorkerFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Fold `other` into `self`. The first failure wins.
    pub fn merge(&mut self, other: PartialEnergy) {
        self.sum += other.sum;
        self.executions += other.executions;
        self.kernels += other.kernels;
        self.values.extend(other.values);
        if self.failure.is_none() {
            self.failure = other.failure;
        }
    }

    /// Combine shares in the order given, with values sorted by kernel index.
    pub fn combine(parts: impl IntoIterator<Item = PartialEnergy>) -> PartialEnergy {
        let mut total = PartialEnergy::default();
        for part in parts {
            total.merge(part);
        }
        total.values.sort_by_key(|&(index, _)| index);
        total
    }
}

/// A group of cooperating ranks.
#[async_trait]
pub trait Communicator: Send + Sync {
    /// This instance's rank, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Combine every rank's share. Every rank must call this once per
    /// evaluation, including ranks that failed locally.
    async fn all_reduce(&self, local: PartialEnergy) -> EngineResult<PartialEnergy>;
}

/// A group with a single rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

#[async_trait]
impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    async fn all_reduce(&self, local: PartialEnergy) -> EngineResult<PartialEnergy> {
        Ok(PartialEnergy::combine([local]))
    }
}

struct GroupState {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Option<PartialEnergy>>>,
}

/// Several ranks in one process, reduced through shared slots.
///
/// Each round deposits into the rank's slot, waits for everyone, reads all
/// slots in rank order and waits again before the slots can be reused.
#[derive(Clone)]
pub struct LocalGroup {
    rank: usize,
    state: Arc<GroupState>,
}

impl LocalGroup {
    /// Create the members of a group of `size` ranks (at least one).
    pub fn create(size: usize) -> Vec<LocalGroup> {
        let size = size.max(1);
        let state = Arc::new(GroupState {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new(vec![None; size]),
        });
        (0..size)
            .map(|rank| LocalGroup {
                rank,
                state: Arc::clone(&state),
            })
            .collect()
    }
}

impl std::fmt::Debug for LocalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalGroup")
            .field("rank", &self.rank)
            .field("size", &self.state.size)
            .finish()
    }
}

#[async_trait]
impl Communicator for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.state.size
    }

    async fn all_reduce(&self, local: PartialEnergy) -> EngineResult<PartialEnergy> {
        {
            let mut slots = self.state.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots[self.rank] = Some(local);
        }
        self.state.barrier.wait().await;

        let parts: EngineResult<Vec<PartialEnergy>> = {
            let slots = self.state.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .enumerate()
                .map(|(rank, slot)| {
                    slot.clone().ok_or_else(|| {
                        EngineError::Communicator(format!("rank {rank} deposited no result"))
                    })
                })
                .collect()
        };
        self.state.barrier.wait().await;

        Ok(PartialEnergy::combine(parts?))
    }
}
