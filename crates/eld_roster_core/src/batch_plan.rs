use std::time::Duration;

use crate::contract::ValidationError;

/// Pacing parameters for one rate-limited batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Companies fetched concurrently per chunk.
    pub batch_size: usize,
    /// Pause between chunks (not applied after the last chunk).
    pub inter_batch_delay: Duration,
    /// Worker at index `k` inside a chunk waits `k * stagger_step` before
    /// starting, spreading the request burst.
    pub stagger_step: Duration,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::new("batch_size must be a positive integer"));
        }
        Ok(())
    }

    pub fn stagger_offset(&self, index_in_batch: usize) -> Duration {
        self.stagger_step * index_in_batch.min(u32::MAX as usize) as u32
    }
}

/// Number of chunks a run of `total` items produces: `ceil(total / batch_size)`.
pub fn chunk_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size)
}
