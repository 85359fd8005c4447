//! Runtime-facing re-exports of the deterministic core modules.

pub use eld_roster_core::batch_plan;
pub use eld_roster_core::clock;
pub use eld_roster_core::config;
pub use eld_roster_core::contract;
pub use eld_roster_core::filters;
pub use eld_roster_core::retry;
pub use eld_roster_core::storage_keys;
