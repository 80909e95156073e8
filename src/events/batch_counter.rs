//! Per-plan-execution counters deciding when a batched log event is due.
//!
//! A counter holds the events seen since the last flush. The event that reaches the batch
//! size triggers a flush and resets the counter to 1, opening the next batch.

use super::errors::CacheError;
use dashmap::DashMap;

/// Shared counter cache keyed by plan execution id. Increments must be atomic per key.
pub trait BatchCounterCache: Send + Sync {
    /// Count one event; `true` when it completes a batch
    fn increment(&self, plan_execution_id: &str, batch_size: u64) -> Result<bool, CacheError>;

    fn current(&self, plan_execution_id: &str) -> Option<u64>;

    fn remove(&self, plan_execution_id: &str);
}

/// Process-local counter cache. Each increment holds the key's shard lock for the whole
/// read-modify-write.
#[derive(Debug, Default)]
pub struct InMemoryBatchCounter {
    counters: DashMap<String, u64>,
}

impl InMemoryBatchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

impl BatchCounterCache for InMemoryBatchCounter {
    fn increment(&self, plan_execution_id: &str, batch_size: u64) -> Result<bool, CacheError> {
        if batch_size == 0 {
            return Err(CacheError::InvalidBatchSize { batch_size });
        }
        let mut count = self
            .counters
            .entry(plan_execution_id.to_string())
            .or_insert(0);
        *count += 1;
        if *count >= batch_size {
            *count = 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn current(&self, plan_execution_id: &str) -> Option<u64> {
        self.counters.get(plan_execution_id).map(|count| *count)
    }

    fn remove(&self, plan_execution_id: &str) {
        self.counters.remove(plan_execution_id);
    }
}
