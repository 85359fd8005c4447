use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapters::object_store::SnapshotStore;
use crate::adapters::upstream::UpstreamError;
use crate::adapters::zero::ZeroApi;
use crate::handlers::http::{require_method, success_response, ApiGatewayResponse};
use crate::handlers::{pipeline_error_response, AggregationReport};
use crate::logging::log_info;
use crate::pipeline::batch::{run_batches, ObjectStoreCheckpoint, RosterFetcher};
use crate::pipeline::{retry, PipelineError};
use crate::runtime::clock::bishkek_timestamp;
use crate::runtime::config::{
    zero_batch_config, PAGE_DELAY, PIPELINE_TIMEOUT, ZERO_COMPANIES_PAGE_SIZE,
};
use crate::runtime::contract::{
    normalize_zero_driver, snapshot_fingerprint, Company, DriverRecord, Snapshot, Vendor,
};
use crate::runtime::filters::{
    filter_companies, is_recently_seen, retain_active_drivers, strip_internal_fields,
};
use crate::runtime::retry::{COMPANY_CALL, PIPELINE_AUTH, PIPELINE_COMPANIES};
use crate::runtime::storage_keys::{
    checkpoint_object_name, companies_object_name, snapshot_object_name,
};

const COMPONENT: &str = "zero_pipeline";

pub struct ZeroPipelineDeps {
    pub api: Arc<dyn ZeroApi>,
    pub store: Arc<dyn SnapshotStore>,
}

/// Aggregate the Zero fleet into a fresh `zero.json` snapshot.
pub async fn handle_zero_event(event: Value, deps: &ZeroPipelineDeps) -> ApiGatewayResponse {
    if let Err(response) = require_method(&event, "GET") {
        return response;
    }

    let started = Instant::now();
    match tokio::time::timeout(PIPELINE_TIMEOUT, run_zero_pipeline(deps)).await {
        Err(_) => pipeline_error_response(&PipelineError::Timeout {
            budget_secs: PIPELINE_TIMEOUT.as_secs(),
        }),
        Ok(Err(error)) => pipeline_error_response(&error),
        Ok(Ok(mut report)) => {
            report.execution_time_ms = started.elapsed().as_millis();
            success_response(200, report)
        }
    }
}

async fn run_zero_pipeline(deps: &ZeroPipelineDeps) -> Result<AggregationReport, PipelineError> {
    let api = &deps.api;
    let token = retry::execute("zero sign-in", PIPELINE_AUTH, || api.sign_in()).await?;

    let companies = retry::execute("zero companies listing", PIPELINE_COMPANIES, || {
        list_all_companies(api.as_ref(), &token)
    })
    .await?;
    // No operational exclusion list on this vendor; only the name denylist.
    let companies = filter_companies(companies, &Default::default());
    log_info(
        COMPONENT,
        "companies_listed",
        json!({"kept": companies.len()}),
    );

    let companies_body = serde_json::to_vec(&companies)
        .map_err(|error| PipelineError::Internal(format!("failed to serialize companies: {error}")))?;
    deps.store
        .upload(companies_object_name(Vendor::Zero), &companies_body)
        .await?;

    let fetcher = Arc::new(ZeroRosterFetcher {
        api: Arc::clone(&deps.api),
        token: token.clone(),
    });
    let checkpoint = ObjectStoreCheckpoint::new(
        Arc::clone(&deps.store),
        checkpoint_object_name(Vendor::Zero),
    );
    let outcome = run_batches(
        Vendor::Zero,
        &companies,
        fetcher,
        &zero_batch_config(),
        &checkpoint,
    )
    .await?;

    let now = Utc::now();
    let mut rosters = outcome.rosters;
    retain_active_drivers(&mut rosters, |driver| is_recently_seen(driver, now));

    let snapshot = Snapshot {
        timestamp: bishkek_timestamp(now),
        total_companies: companies.len(),
        company_drivers: strip_internal_fields(rosters),
    };
    let fingerprint = snapshot_fingerprint(&snapshot);
    let snapshot_body = serde_json::to_vec(&snapshot)
        .map_err(|error| PipelineError::Internal(format!("failed to serialize snapshot: {error}")))?;
    deps.store
        .upload(snapshot_object_name(Vendor::Zero), &snapshot_body)
        .await?;

    let drivers = snapshot
        .company_drivers
        .iter()
        .map(|company| company.drivers.len())
        .sum();
    log_info(
        COMPONENT,
        "snapshot_published",
        json!({
            "object": snapshot_object_name(Vendor::Zero),
            "companies": snapshot.total_companies,
            "drivers": drivers,
            "errors": outcome.summary.errors,
            "fingerprint": fingerprint,
        }),
    );

    Ok(AggregationReport {
        status: "completed".to_string(),
        vendor: Vendor::Zero.as_str().to_string(),
        snapshot_object: snapshot_object_name(Vendor::Zero).to_string(),
        total_companies: snapshot.total_companies,
        processed: outcome.summary.processed,
        errors: outcome.summary.errors,
        drivers,
        fingerprint,
        execution_time_ms: 0,
    })
}

/// Walk the `limit`/`offset` listing until a short page marks the end.
async fn list_all_companies(api: &dyn ZeroApi, token: &str) -> Result<Vec<Company>, UpstreamError> {
    let mut companies = Vec::new();
    let mut offset = 0;
    loop {
        let page = api
            .list_companies(token, ZERO_COMPANIES_PAGE_SIZE, offset)
            .await?;
        let page_len = page.len();
        companies.extend(page);
        if page_len < ZERO_COMPANIES_PAGE_SIZE {
            return Ok(companies);
        }
        offset += page_len;
        tokio::time::sleep(PAGE_DELAY).await;
    }
}

struct ZeroRosterFetcher {
    api: Arc<dyn ZeroApi>,
    token: String,
}

#[async_trait]
impl RosterFetcher for ZeroRosterFetcher {
    async fn fetch_roster(&self, company: &Company) -> Result<Vec<DriverRecord>, UpstreamError> {
        let name = format!("zero roster for {}", company.company_id);
        retry::execute(&name, COMPANY_CALL, || async {
            let raw = self
                .api
                .drivers_for_company(&self.token, &company.company_id)
                .await?;
            Ok(raw.iter().filter_map(normalize_zero_driver).collect())
        })
        .await
        .map_err(|error| UpstreamError {
            status: error.last_error.status,
            message: error.to_string(),
        })
    }
}
