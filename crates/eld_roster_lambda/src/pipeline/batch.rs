use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::task::JoinSet;

use crate::adapters::object_store::{SnapshotStore, StoreError};
use crate::adapters::upstream::UpstreamError;
use crate::logging::{log_error, log_info};
use crate::pipeline::PipelineError;
use crate::runtime::batch_plan::{chunk_count, BatchConfig};
use crate::runtime::contract::{Company, CompanyRoster, DriverRecord, RosterRunSummary, Vendor};

const COMPONENT: &str = "batch_runner";

/// Per-company unit of work run by the batch runner. Implementations own
/// their retry budget; a returned error is absorbed into the batch results
/// rather than aborting the run.
#[async_trait]
pub trait RosterFetcher: Send + Sync {
    async fn fetch_roster(&self, company: &Company) -> Result<Vec<DriverRecord>, UpstreamError>;
}

/// Side-effecting sink the accumulated results are persisted through after
/// every completed chunk, so a crash mid-run loses at most one chunk.
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    async fn persist_partial(&self, rosters: &[CompanyRoster]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchRunOutcome {
    /// One roster per input company, in input order.
    pub rosters: Vec<CompanyRoster>,
    pub summary: RosterRunSummary,
}

/// Fetch driver rosters for every company in fixed-size chunks.
///
/// Within a chunk all workers run concurrently, worker `k` delayed by
/// `k * stagger_step`. Individual failures become `_error` roster entries.
/// After each chunk the full accumulated list is checkpointed; between
/// chunks (except after the last) the runner sleeps `inter_batch_delay`.
pub async fn run_batches(
    vendor: Vendor,
    companies: &[Company],
    fetcher: Arc<dyn RosterFetcher>,
    config: &BatchConfig,
    checkpoint: &dyn CheckpointSink,
) -> Result<BatchRunOutcome, PipelineError> {
    config.validate()?;

    let total = companies.len();
    if total == 0 {
        return Ok(BatchRunOutcome {
            rosters: Vec::new(),
            summary: RosterRunSummary::default(),
        });
    }

    let total_batches = chunk_count(total, config.batch_size);
    log_info(
        COMPONENT,
        "run_started",
        json!({
            "vendor": vendor.as_str(),
            "companies": total,
            "batch_size": config.batch_size,
            "batches": total_batches,
        }),
    );

    let mut rosters: Vec<CompanyRoster> = Vec::with_capacity(total);
    let mut errors = 0usize;

    for (batch_index, chunk) in companies.chunks(config.batch_size).enumerate() {
        let mut workers: JoinSet<(usize, CompanyRoster)> = JoinSet::new();
        for (offset_in_chunk, company) in chunk.iter().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            let company = company.clone();
            let stagger = config.stagger_offset(offset_in_chunk);

            workers.spawn(async move {
                tokio::time::sleep(stagger).await;
                let roster = match fetcher.fetch_roster(&company).await {
                    Ok(drivers) => CompanyRoster::success(vendor, &company, drivers),
                    Err(error) => CompanyRoster::failure(vendor, &company, error.to_string()),
                };
                (offset_in_chunk, roster)
            });
        }

        let mut chunk_results: Vec<Option<CompanyRoster>> = vec![None; chunk.len()];
        while let Some(joined) = workers.join_next().await {
            let (offset_in_chunk, roster) = joined
                .map_err(|error| PipelineError::Internal(format!("worker task failed: {error}")))?;
            chunk_results[offset_in_chunk] = Some(roster);
        }

        for (offset_in_chunk, slot) in chunk_results.into_iter().enumerate() {
            let roster = slot.ok_or_else(|| {
                PipelineError::Internal(format!(
                    "worker for chunk offset {offset_in_chunk} produced no result"
                ))
            })?;
            if let Some(message) = roster.error.as_deref() {
                errors += 1;
                log_error(
                    COMPONENT,
                    "company_failed",
                    json!({
                        "vendor": vendor.as_str(),
                        "company_id": roster.company_id,
                        "name": roster.name,
                        "error": message,
                    }),
                );
            }
            rosters.push(roster);
        }

        checkpoint.persist_partial(&rosters).await?;

        let drivers: usize = rosters.iter().map(CompanyRoster::driver_count).sum();
        log_info(
            COMPONENT,
            "batch_completed",
            json!({
                "vendor": vendor.as_str(),
                "batch": batch_index + 1,
                "batches": total_batches,
                "processed": rosters.len(),
                "total": total,
                "drivers": drivers,
                "errors": errors,
            }),
        );

        if batch_index + 1 < total_batches {
            tokio::time::sleep(config.inter_batch_delay).await;
        }
    }

    let drivers = rosters.iter().map(CompanyRoster::driver_count).sum();
    let summary = RosterRunSummary {
        total,
        processed: rosters.len(),
        errors,
        drivers,
    };

    log_info(
        COMPONENT,
        "run_completed",
        json!({
            "vendor": vendor.as_str(),
            "processed": summary.processed,
            "total": summary.total,
            "drivers": summary.drivers,
            "errors": summary.errors,
        }),
    );

    Ok(BatchRunOutcome { rosters, summary })
}

/// Checkpoint sink that overwrites a fixed object in snapshot storage.
pub struct ObjectStoreCheckpoint {
    store: Arc<dyn SnapshotStore>,
    object_name: &'static str,
}

impl ObjectStoreCheckpoint {
    pub fn new(store: Arc<dyn SnapshotStore>, object_name: &'static str) -> Self {
        Self { store, object_name }
    }
}

#[async_trait]
impl CheckpointSink for ObjectStoreCheckpoint {
    async fn persist_partial(&self, rosters: &[CompanyRoster]) -> Result<(), StoreError> {
        let body = serde_json::to_vec(rosters)
            .map_err(|error| StoreError::Io(format!("failed to serialize checkpoint: {error}")))?;
        self.store.upload(self.object_name, &body).await
    }
}
