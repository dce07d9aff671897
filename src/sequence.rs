// Year-scoped identifier allocation. Uniqueness comes from the storage
// layer's atomic counter; this module adds formatting and bounded retry
// under contention.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SequenceConfig;
use crate::errors::EngineError;
use crate::requisition::RequisitionId;
use crate::storage::{RequisitionStore, StorageError};

/// Produces the next `SP-<year>-<NNNNNN>` identifier.
///
/// Contended or transient allocation failures are retried here with
/// jittered exponential backoff; every other engine operation leaves
/// retrying to the caller.
pub struct SequenceAllocator {
    store: Arc<dyn RequisitionStore>,
    config: SequenceConfig,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn RequisitionStore>, config: SequenceConfig) -> Self {
        Self { store, config }
    }

    /// Reserves and formats the next identifier for `year`. Gaps are
    /// possible when a caller aborts after allocation; duplicates are not.
    pub async fn next(&self, year: i32) -> Result<RequisitionId, EngineError> {
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.store.allocate_next_sequence(year).await {
                Ok(sequence) => {
                    let id = RequisitionId::new(year, sequence);
                    debug!(requisition.id = %id, attempt, "allocated sequence");
                    return Ok(id);
                }
                Err(err @ (StorageError::Conflict { .. } | StorageError::Transient(_)))
                    if attempt < attempts =>
                {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        year,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "sequence allocation contended, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(EngineError::Transient {
                        reason: format!("sequence allocation for {} failed: {}", year, err),
                    });
                }
            }
        }
        Err(EngineError::Transient {
            reason: format!(
                "sequence allocation for {} still contended after {} attempts",
                year, attempts
            ),
        })
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = (attempt - 1).min(16);
        let exponential = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.config.max_delay_ms);
        let jitter = rand::rng().random_range(0..=exponential / 2);
        Duration::from_millis(exponential + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn allocator(store: Arc<InMemoryStore>) -> SequenceAllocator {
        SequenceAllocator::new(store, SequenceConfig::default())
    }

    #[tokio::test]
    async fn test_first_allocation_of_a_year_is_one() {
        let store = Arc::new(InMemoryStore::new());
        let id = allocator(store).next(2025).await.unwrap();
        assert_eq!(id.as_str(), "SP-2025-000001");
    }

    #[tokio::test]
    async fn test_sequences_are_dense_and_increasing() {
        let store = Arc::new(InMemoryStore::new());
        let allocator = allocator(store);
        for expected in 1..=5 {
            let id = allocator.next(2025).await.unwrap();
            assert_eq!(id.sequence(), expected);
        }
    }

    #[tokio::test]
    async fn test_years_have_independent_counters() {
        let store = Arc::new(InMemoryStore::new());
        let allocator = allocator(store);
        allocator.next(2025).await.unwrap();
        allocator.next(2025).await.unwrap();
        let first_of_next_year = allocator.next(2026).await.unwrap();
        assert_eq!(first_of_next_year.as_str(), "SP-2026-000001");
    }
}
