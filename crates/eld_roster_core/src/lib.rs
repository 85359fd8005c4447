//! Shared ELD roster domain primitives.
//!
//! This crate owns deterministic aggregation behavior: vendor contracts,
//! payload normalization, roster filtering, retry/backoff schedules, batch
//! partitioning, configuration validation, and the UTC+6 business calendar.
//! It intentionally excludes AWS SDK, HTTP client, and Lambda runtime
//! concerns; those live in `eld_roster_lambda`.

pub mod batch_plan;
pub mod clock;
pub mod config;
pub mod contract;
pub mod filters;
pub mod retry;
pub mod storage_keys;
