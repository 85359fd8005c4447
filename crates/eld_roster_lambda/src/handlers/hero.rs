use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapters::hero::HeroApi;
use crate::adapters::object_store::SnapshotStore;
use crate::adapters::upstream::UpstreamError;
use crate::handlers::http::{require_method, success_response, ApiGatewayResponse};
use crate::handlers::{pipeline_error_response, AggregationReport};
use crate::logging::log_info;
use crate::pipeline::batch::{run_batches, ObjectStoreCheckpoint, RosterFetcher};
use crate::pipeline::{retry, PipelineError};
use crate::runtime::clock::bishkek_timestamp;
use crate::runtime::config::{
    hero_batch_config, HERO_COMPANIES_PAGE_SIZE, PAGE_DELAY, PIPELINE_TIMEOUT, POST_AUTH_DELAY,
};
use crate::runtime::contract::{
    normalize_hero_driver, snapshot_fingerprint, Company, DriverRecord, Snapshot, Vendor,
};
use crate::runtime::filters::{filter_companies, is_active_hero, retain_active_drivers, strip_internal_fields};
use crate::runtime::retry::{COMPANY_CALL, PIPELINE_AUTH, PIPELINE_COMPANIES};
use crate::runtime::storage_keys::{
    checkpoint_object_name, companies_object_name, snapshot_object_name,
};

const COMPONENT: &str = "hero_pipeline";

pub struct HeroPipelineDeps {
    pub api: Arc<dyn HeroApi>,
    pub store: Arc<dyn SnapshotStore>,
    pub excluded_company_ids: HashSet<String>,
}

/// Aggregate the Hero fleet into a fresh `hero.json` snapshot.
pub async fn handle_hero_event(event: Value, deps: &HeroPipelineDeps) -> ApiGatewayResponse {
    if let Err(response) = require_method(&event, "GET") {
        return response;
    }

    let started = Instant::now();
    match tokio::time::timeout(PIPELINE_TIMEOUT, run_hero_pipeline(deps)).await {
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

async fn run_hero_pipeline(deps: &HeroPipelineDeps) -> Result<AggregationReport, PipelineError> {
    let api = &deps.api;
    let token = retry::execute("hero authentication", PIPELINE_AUTH, || api.authenticate()).await?;

    let companies = retry::execute("hero companies listing", PIPELINE_COMPANIES, || {
        list_all_companies(api.as_ref(), &token)
    })
    .await?;
    let companies = filter_companies(companies, &deps.excluded_company_ids);
    log_info(
        COMPONENT,
        "companies_listed",
        json!({"kept": companies.len()}),
    );

    let companies_body = serde_json::to_vec(&companies)
        .map_err(|error| PipelineError::Internal(format!("failed to serialize companies: {error}")))?;
    deps.store
        .upload(companies_object_name(Vendor::Hero), &companies_body)
        .await?;

    let fetcher = Arc::new(HeroRosterFetcher {
        api: Arc::clone(&deps.api),
    });
    let checkpoint = ObjectStoreCheckpoint::new(
        Arc::clone(&deps.store),
        checkpoint_object_name(Vendor::Hero),
    );
    let outcome = run_batches(
        Vendor::Hero,
        &companies,
        fetcher,
        &hero_batch_config(),
        &checkpoint,
    )
    .await?;

    let mut rosters = outcome.rosters;
    retain_active_drivers(&mut rosters, is_active_hero);

    let snapshot = Snapshot {
        timestamp: bishkek_timestamp(Utc::now()),
        total_companies: companies.len(),
        company_drivers: strip_internal_fields(rosters),
    };
    let fingerprint = snapshot_fingerprint(&snapshot);
    let snapshot_body = serde_json::to_vec(&snapshot)
        .map_err(|error| PipelineError::Internal(format!("failed to serialize snapshot: {error}")))?;
    deps.store
        .upload(snapshot_object_name(Vendor::Hero), &snapshot_body)
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
            "object": snapshot_object_name(Vendor::Hero),
            "companies": snapshot.total_companies,
            "drivers": drivers,
            "errors": outcome.summary.errors,
            "fingerprint": fingerprint,
        }),
    );

    Ok(AggregationReport {
        status: "completed".to_string(),
        vendor: Vendor::Hero.as_str().to_string(),
        snapshot_object: snapshot_object_name(Vendor::Hero).to_string(),
        total_companies: snapshot.total_companies,
        processed: outcome.summary.processed,
        errors: outcome.summary.errors,
        drivers,
        fingerprint,
        execution_time_ms: 0,
    })
}

/// Walk the `$limit`/`$skip` listing until a short page marks the end,
/// pausing briefly between pages.
async fn list_all_companies(api: &dyn HeroApi, token: &str) -> Result<Vec<Company>, UpstreamError> {
    let mut companies = Vec::new();
    let mut skip = 0;
    loop {
        let page = api
            .list_companies(token, HERO_COMPANIES_PAGE_SIZE, skip)
            .await?;
        let page_len = page.len();
        companies.extend(page);
        if page_len < HERO_COMPANIES_PAGE_SIZE {
            return Ok(companies);
        }
        skip += page_len;
        tokio::time::sleep(PAGE_DELAY).await;
    }
}

struct HeroRosterFetcher {
    api: Arc<dyn HeroApi>,
}

#[async_trait]
impl RosterFetcher for HeroRosterFetcher {
    async fn fetch_roster(&self, company: &Company) -> Result<Vec<DriverRecord>, UpstreamError> {
        let name = format!("hero roster for {}", company.company_id);
        retry::execute(&name, COMPANY_CALL, || {
            fetch_company_roster(self.api.as_ref(), &company.company_id)
        })
        .await
        .map_err(|error| UpstreamError {
            status: error.last_error.status,
            message: error.to_string(),
        })
    }
}

/// Drivers require a second, company-scoped login; the vendor rejects a
/// drivers call issued immediately after the token grant.
async fn fetch_company_roster(
    api: &dyn HeroApi,
    company_id: &str,
) -> Result<Vec<DriverRecord>, UpstreamError> {
    let company_token = api.company_token(company_id).await?;
    tokio::time::sleep(POST_AUTH_DELAY).await;
    let raw = api.drivers(&company_token).await?;
    Ok(raw.iter().filter_map(normalize_hero_driver).collect())
}
