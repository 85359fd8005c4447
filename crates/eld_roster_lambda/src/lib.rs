//! AWS-oriented adapters and handlers for the ELD roster functions.
//!
//! This crate owns runtime integration details (Lambda handlers, vendor HTTP
//! clients, storage and table adapters) and exposes a single runtime module
//! boundary for the deterministic contract, filter, and policy primitives.

pub mod adapters;
pub mod handlers;
pub mod logging;
pub mod pipeline;
pub mod runtime;
