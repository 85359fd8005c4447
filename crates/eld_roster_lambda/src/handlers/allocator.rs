use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapters::allocation_table::{
    AllocationTable, TableError, ALLOCATIONS_TABLE, BLACKLIST_TABLE, MASTER_TABLE,
};
use crate::adapters::object_store::{SnapshotStore, StoreError};
use crate::handlers::http::{
    error_response, normalize_apigw_event, require_method, success_response,
    validation_error_response, ApiGatewayResponse,
};
use crate::logging::log_info;
use crate::runtime::clock::bishkek_date;
use crate::runtime::contract::{Snapshot, SnapshotCompany, SnapshotDriver, Vendor};
use crate::runtime::storage_keys::snapshot_object_name;

const COMPONENT: &str = "allocator";

pub struct AllocatorDeps {
    pub store: Arc<dyn SnapshotStore>,
    pub table: Arc<dyn AllocationTable>,
}

#[derive(Debug)]
pub enum AllocationError {
    /// The id is absent from every snapshot that was searched.
    DriverNotFound { driver_eld_id: String },
    /// No prior allocation exists for the company to seed the owning user.
    NoAllocationOwner { company_eld_id: String },
    /// Deallocation found no master row to take the original date from.
    NoStoredAllocationDate { driver_eld_id: String },
    Store(StoreError),
    Table(TableError),
    Snapshot(String),
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DriverNotFound { driver_eld_id } => {
                write!(f, "driver {driver_eld_id} not found in any snapshot")
            }
            Self::NoAllocationOwner { company_eld_id } => write!(
                f,
                "no existing allocation for company {company_eld_id} to take the owning user from"
            ),
            Self::NoStoredAllocationDate { driver_eld_id } => write!(
                f,
                "no stored allocation date for driver {driver_eld_id}"
            ),
            Self::Store(error) => error.fmt(f),
            Self::Table(error) => error.fmt(f),
            Self::Snapshot(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AllocationError {}

impl From<StoreError> for AllocationError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

impl From<TableError> for AllocationError {
    fn from(error: TableError) -> Self {
        Self::Table(error)
    }
}

/// A driver located inside a published snapshot, with the company context
/// the allocation rows need.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverMatch {
    pub vendor: Vendor,
    pub company_eld_id: String,
    pub company_name: String,
    pub driver: SnapshotDriver,
}

/// The written allocation, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    pub driver_eld_id: String,
    pub driver_name: String,
    pub company_eld_id: String,
    pub company_name: String,
    pub vehicle_eld_id: Option<String>,
    pub date_of_data: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeallocationOutcome {
    /// The driver was found and re-recorded under its original date.
    Reallocated(AllocationOutcome),
    /// No roster match; only the blacklist entry was cleared.
    BlacklistClearedOnly { driver_eld_id: String },
}

/// Allocate a driver for today: record the assignment in the master table,
/// clear any blacklist entry, and insert an allocation row owned by the
/// user already allocating for the same company.
pub async fn allocate(
    deps: &AllocatorDeps,
    driver_eld_id: &str,
) -> Result<AllocationOutcome, AllocationError> {
    let matched = find_driver_in_snapshots(
        deps.store.as_ref(),
        driver_eld_id,
        &[Vendor::Hero, Vendor::Zero],
    )
    .await?
    .ok_or_else(|| AllocationError::DriverNotFound {
        driver_eld_id: driver_eld_id.to_string(),
    })?;

    let date = bishkek_date(Utc::now());
    let outcome = record_allocation(deps, &matched, &date).await?;
    log_info(
        COMPONENT,
        "driver_allocated",
        json!({
            "driver_eld_id": outcome.driver_eld_id,
            "company_eld_id": outcome.company_eld_id,
            "date_of_data": outcome.date_of_data,
        }),
    );
    Ok(outcome)
}

/// Deallocate a driver: clear the blacklist entry unconditionally, then (if
/// the driver is still on its vendor's snapshot) re-record the allocation
/// under the date originally stored for it, never today's.
pub async fn deallocate(
    deps: &AllocatorDeps,
    driver_eld_id: &str,
) -> Result<DeallocationOutcome, AllocationError> {
    deps.table
        .delete(BLACKLIST_TABLE, &[("driver_eld_id", driver_eld_id)])
        .await?;

    let vendor = Vendor::for_driver_id(driver_eld_id);
    let matched =
        find_driver_in_snapshots(deps.store.as_ref(), driver_eld_id, &[vendor]).await?;
    let Some(matched) = matched else {
        log_info(
            COMPONENT,
            "blacklist_cleared_only",
            json!({"driver_eld_id": driver_eld_id, "vendor": vendor.as_str()}),
        );
        return Ok(DeallocationOutcome::BlacklistClearedOnly {
            driver_eld_id: driver_eld_id.to_string(),
        });
    };

    let stored = deps
        .table
        .select_first(
            MASTER_TABLE,
            "date_of_data",
            &[("driver_eld_id", driver_eld_id)],
        )
        .await?;
    let date = stored
        .as_ref()
        .and_then(|row| row.get("date_of_data"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AllocationError::NoStoredAllocationDate {
            driver_eld_id: driver_eld_id.to_string(),
        })?;

    let outcome = record_allocation(deps, &matched, &date).await?;
    log_info(
        COMPONENT,
        "driver_deallocated",
        json!({
            "driver_eld_id": outcome.driver_eld_id,
            "company_eld_id": outcome.company_eld_id,
            "date_of_data": outcome.date_of_data,
        }),
    );
    Ok(DeallocationOutcome::Reallocated(outcome))
}

/// Dedup key of the master table. The two vendors shipped with different
/// keys; both are kept as-is because collapsing them would change which
/// rows overwrite each other.
fn master_conflict_key(vendor: Vendor) -> &'static str {
    match vendor {
        Vendor::Hero => "driver_eld_id",
        Vendor::Zero => "company_eld_id,driver_eld_id",
    }
}

/// Shared write sequence of both flows: master upsert, blacklist clear,
/// owner lookup, allocation insert. Only the date differs per caller.
async fn record_allocation(
    deps: &AllocatorDeps,
    matched: &DriverMatch,
    date: &str,
) -> Result<AllocationOutcome, AllocationError> {
    let driver_name = matched.driver.display_name();

    deps.table
        .upsert(
            MASTER_TABLE,
            json!({
                "company_eld_id": matched.company_eld_id,
                "company_name": matched.company_name,
                "driver_eld_id": matched.driver.eld_id,
                "driver_name": driver_name,
                "vehicle_eld_id": matched.driver.vehicle,
                "date_of_data": date,
            }),
            master_conflict_key(matched.vendor),
        )
        .await?;

    deps.table
        .delete(
            BLACKLIST_TABLE,
            &[("driver_eld_id", matched.driver.eld_id.as_str())],
        )
        .await?;

    let owner = deps
        .table
        .select_first(
            ALLOCATIONS_TABLE,
            "user_id",
            &[("company_eld_id", matched.company_eld_id.as_str())],
        )
        .await?;
    let user_id = owner
        .as_ref()
        .and_then(|row| row.get("user_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AllocationError::NoAllocationOwner {
            company_eld_id: matched.company_eld_id.clone(),
        })?;

    deps.table
        .insert(
            ALLOCATIONS_TABLE,
            json!({
                "company_eld_id": matched.company_eld_id,
                "company_name": matched.company_name,
                "driver_eld_id": matched.driver.eld_id,
                "driver_name": driver_name,
                "vehicle_eld_id": matched.driver.vehicle,
                "date_of_data": date,
                "user_id": user_id,
            }),
        )
        .await?;

    Ok(AllocationOutcome {
        driver_eld_id: matched.driver.eld_id.clone(),
        driver_name,
        company_eld_id: matched.company_eld_id.clone(),
        company_name: matched.company_name.clone(),
        vehicle_eld_id: matched.driver.vehicle.clone(),
        date_of_data: date.to_string(),
        user_id,
    })
}

/// Linear scan of the given snapshots, in order, for a driver id. A missing
/// snapshot object is treated as empty, not as an error.
async fn find_driver_in_snapshots(
    store: &dyn SnapshotStore,
    driver_eld_id: &str,
    vendors: &[Vendor],
) -> Result<Option<DriverMatch>, AllocationError> {
    for &vendor in vendors {
        let name = snapshot_object_name(vendor);
        let bytes = match store.download(name).await {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound { .. }) => continue,
            Err(error) => return Err(error.into()),
        };
        let companies = parse_snapshot_companies(name, &bytes)?;

        for company in companies {
            if let Some(driver) = company
                .drivers
                .iter()
                .find(|driver| driver.eld_id == driver_eld_id)
            {
                return Ok(Some(DriverMatch {
                    vendor,
                    company_eld_id: company.company_id.clone(),
                    company_name: company.name.clone(),
                    driver: driver.clone(),
                }));
            }
        }
    }
    Ok(None)
}

/// Snapshots are published as the full envelope; checkpoint-era objects were
/// bare company arrays. Accept both.
fn parse_snapshot_companies(
    name: &str,
    bytes: &[u8],
) -> Result<Vec<SnapshotCompany>, AllocationError> {
    if let Ok(snapshot) = serde_json::from_slice::<Snapshot>(bytes) {
        return Ok(snapshot.company_drivers);
    }
    serde_json::from_slice::<Vec<SnapshotCompany>>(bytes)
        .map_err(|error| AllocationError::Snapshot(format!("malformed snapshot {name}: {error}")))
}

/// Callers key the request on `eldId`; the older field spellings are still
/// accepted.
#[derive(Debug, Deserialize)]
struct AllocationRequest {
    #[serde(
        rename = "eldId",
        alias = "driverId",
        alias = "driverEldId",
        alias = "driver_eld_id"
    )]
    driver_eld_id: String,
}

pub async fn handle_allocator_event(event: Value, deps: &AllocatorDeps) -> ApiGatewayResponse {
    let request = match parse_request(event) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match allocate(deps, &request.driver_eld_id).await {
        Ok(outcome) => success_response(
            200,
            json!({
                "status": "allocated",
                "allocation": outcome,
            }),
        ),
        Err(error) => allocation_error_response(&error),
    }
}

pub async fn handle_deallocator_event(event: Value, deps: &AllocatorDeps) -> ApiGatewayResponse {
    let request = match parse_request(event) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match deallocate(deps, &request.driver_eld_id).await {
        Ok(DeallocationOutcome::Reallocated(outcome)) => success_response(
            200,
            json!({
                "status": "deallocated",
                "allocation": outcome,
            }),
        ),
        Ok(DeallocationOutcome::BlacklistClearedOnly { driver_eld_id }) => success_response(
            200,
            json!({
                "status": "blacklist_cleared",
                "driverEldId": driver_eld_id,
                "message": "driver not present in the current snapshot; blacklist entry removed",
            }),
        ),
        Err(error) => allocation_error_response(&error),
    }
}

fn parse_request(event: Value) -> Result<AllocationRequest, ApiGatewayResponse> {
    require_method(&event, "POST")?;
    let payload = normalize_apigw_event(event).map_err(|message| validation_error_response(&message))?;
    let request: AllocationRequest = serde_json::from_value(payload)
        .map_err(|error| validation_error_response(&format!("Malformed request: {error}")))?;
    if request.driver_eld_id.trim().is_empty() {
        return Err(validation_error_response("driver_eld_id is required"));
    }
    Ok(request)
}

fn allocation_error_response(error: &AllocationError) -> ApiGatewayResponse {
    let (status_code, kind) = match error {
        AllocationError::DriverNotFound { .. }
        | AllocationError::NoAllocationOwner { .. }
        | AllocationError::NoStoredAllocationDate { .. } => (404, "not_found"),
        AllocationError::Store(_) | AllocationError::Table(_) | AllocationError::Snapshot(_) => {
            (500, "persistence_error")
        }
    };
    error_response(
        status_code,
        json!({
            "error": kind,
            "message": error.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TableCall {
        Upsert {
            table: String,
            row: Value,
            conflict_key: String,
        },
        Insert {
            table: String,
            row: Value,
        },
        Select {
            table: String,
        },
        Delete {
            table: String,
            filters: Vec<(String, String)>,
        },
    }

    #[derive(Default)]
    struct RecordingTable {
        calls: Mutex<Vec<TableCall>>,
        select_responses: Mutex<HashMap<String, Value>>,
    }

    impl RecordingTable {
        fn with_select(self, table: &str, row: Value) -> Self {
            self.select_responses
                .lock()
                .expect("poisoned mutex")
                .insert(table.to_string(), row);
            self
        }

        fn calls(&self) -> Vec<TableCall> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    #[async_trait]
    impl AllocationTable for RecordingTable {
        async fn upsert(
            &self,
            table: &str,
            row: Value,
            conflict_key: &str,
        ) -> Result<(), TableError> {
            self.calls.lock().expect("poisoned mutex").push(TableCall::Upsert {
                table: table.to_string(),
                row,
                conflict_key: conflict_key.to_string(),
            });
            Ok(())
        }

        async fn insert(&self, table: &str, row: Value) -> Result<(), TableError> {
            self.calls.lock().expect("poisoned mutex").push(TableCall::Insert {
                table: table.to_string(),
                row,
            });
            Ok(())
        }

        async fn select_first(
            &self,
            table: &str,
            _columns: &str,
            _filters: &[(&str, &str)],
        ) -> Result<Option<Value>, TableError> {
            self.calls.lock().expect("poisoned mutex").push(TableCall::Select {
                table: table.to_string(),
            });
            Ok(self
                .select_responses
                .lock()
                .expect("poisoned mutex")
                .get(table)
                .cloned())
        }

        async fn delete(&self, table: &str, filters: &[(&str, &str)]) -> Result<(), TableError> {
            self.calls.lock().expect("poisoned mutex").push(TableCall::Delete {
                table: table.to_string(),
                filters: filters
                    .iter()
                    .map(|(column, value)| (column.to_string(), value.to_string()))
                    .collect(),
            });
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl InMemoryStore {
        fn put_snapshot(&self, vendor: Vendor, companies: Vec<SnapshotCompany>) {
            let snapshot = Snapshot {
                timestamp: "2026-08-28T12:00:00+06:00".to_string(),
                total_companies: companies.len(),
                company_drivers: companies,
            };
            self.objects.lock().expect("poisoned mutex").insert(
                snapshot_object_name(vendor).to_string(),
                serde_json::to_vec(&snapshot).expect("snapshot should serialize"),
            );
        }
    }

    #[async_trait]
    impl SnapshotStore for InMemoryStore {
        async fn download(&self, name: &str) -> Result<Vec<u8>, StoreError> {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .get(name)
                .cloned()
                .ok_or_else(|| StoreError::NotFound {
                    name: name.to_string(),
                })
        }

        async fn upload(&self, name: &str, body: &[u8]) -> Result<(), StoreError> {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .insert(name.to_string(), body.to_vec());
            Ok(())
        }
    }

    fn snapshot_company(company_id: &str, name: &str, drivers: Vec<SnapshotDriver>) -> SnapshotCompany {
        SnapshotCompany {
            vendor: Vendor::Hero,
            company_id: company_id.to_string(),
            name: name.to_string(),
            drivers,
            error: None,
        }
    }

    fn snapshot_driver(eld_id: &str, first: &str, last: &str, vehicle: Option<&str>) -> SnapshotDriver {
        SnapshotDriver {
            eld_id: eld_id.to_string(),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            vehicle: vehicle.map(str::to_string),
        }
    }

    fn allocator_deps(store: InMemoryStore, table: RecordingTable) -> (AllocatorDeps, Arc<RecordingTable>) {
        let table = Arc::new(table);
        (
            AllocatorDeps {
                store: Arc::new(store),
                table: Arc::clone(&table) as Arc<dyn AllocationTable>,
            },
            table,
        )
    }

    #[tokio::test]
    async fn allocate_writes_master_blacklist_and_seeded_allocation() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Hero,
            vec![snapshot_company(
                "C1",
                "Acme",
                vec![snapshot_driver("D1", "A", "B", Some("V1"))],
            )],
        );
        let table = RecordingTable::default()
            .with_select(ALLOCATIONS_TABLE, json!({"user_id": "U1"}));
        let (deps, table) = allocator_deps(store, table);

        let outcome = allocate(&deps, "D1").await.expect("allocation should pass");
        assert_eq!(outcome.driver_name, "A B");
        assert_eq!(outcome.user_id, "U1");
        assert_eq!(outcome.date_of_data, bishkek_date(Utc::now()));

        let calls = table.calls();
        assert_eq!(calls.len(), 4);
        let TableCall::Upsert { table: master, row, conflict_key } = &calls[0] else {
            panic!("first call should be the master upsert, got {:?}", calls[0]);
        };
        assert_eq!(master, MASTER_TABLE);
        assert_eq!(conflict_key, "driver_eld_id");
        assert_eq!(row["driver_name"], "A B");
        assert_eq!(row["company_eld_id"], "C1");
        assert_eq!(row["vehicle_eld_id"], "V1");

        assert_eq!(
            calls[1],
            TableCall::Delete {
                table: BLACKLIST_TABLE.to_string(),
                filters: vec![("driver_eld_id".to_string(), "D1".to_string())],
            }
        );
        assert_eq!(calls[2], TableCall::Select { table: ALLOCATIONS_TABLE.to_string() });
        let TableCall::Insert { table: allocations, row } = &calls[3] else {
            panic!("last call should be the allocation insert, got {:?}", calls[3]);
        };
        assert_eq!(allocations, ALLOCATIONS_TABLE);
        assert_eq!(row["user_id"], "U1");
    }

    #[tokio::test]
    async fn allocate_unknown_driver_performs_no_writes() {
        let store = InMemoryStore::default();
        store.put_snapshot(Vendor::Hero, vec![snapshot_company("C1", "Acme", Vec::new())]);
        let (deps, table) = allocator_deps(store, RecordingTable::default());

        let error = allocate(&deps, "missing").await.expect_err("allocation should fail");
        assert!(matches!(error, AllocationError::DriverNotFound { .. }));
        assert!(table.calls().is_empty());
    }

    #[tokio::test]
    async fn allocate_falls_through_to_the_second_snapshot() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Zero,
            vec![snapshot_company(
                "312",
                "Zero Carrier",
                vec![snapshot_driver("48213", "Nur", "A", None)],
            )],
        );
        let table = RecordingTable::default()
            .with_select(ALLOCATIONS_TABLE, json!({"user_id": "U7"}));
        let (deps, table) = allocator_deps(store, table);

        let outcome = allocate(&deps, "48213").await.expect("allocation should pass");
        assert_eq!(outcome.company_eld_id, "312");

        let TableCall::Upsert { conflict_key, .. } = &table.calls()[0] else {
            panic!("first call should be the master upsert");
        };
        assert_eq!(conflict_key, "company_eld_id,driver_eld_id");
    }

    #[tokio::test]
    async fn allocate_without_a_seed_owner_fails_after_the_upsert() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Hero,
            vec![snapshot_company(
                "C1",
                "Acme",
                vec![snapshot_driver("D1", "A", "B", None)],
            )],
        );
        let (deps, table) = allocator_deps(store, RecordingTable::default());

        let error = allocate(&deps, "D1").await.expect_err("allocation should fail");
        assert!(matches!(error, AllocationError::NoAllocationOwner { .. }));

        let calls = table.calls();
        assert!(matches!(calls.last(), Some(TableCall::Select { .. })));
        assert!(!calls.iter().any(|call| matches!(call, TableCall::Insert { .. })));
    }

    #[tokio::test]
    async fn deallocate_reuses_the_stored_date_not_today() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Zero,
            vec![snapshot_company(
                "312",
                "Zero Carrier",
                vec![snapshot_driver("48213", "Nur", "A", Some("905"))],
            )],
        );
        let table = RecordingTable::default()
            .with_select(MASTER_TABLE, json!({"date_of_data": "2026-08-01"}))
            .with_select(ALLOCATIONS_TABLE, json!({"user_id": "U1"}));
        let (deps, table) = allocator_deps(store, table);

        let outcome = deallocate(&deps, "48213").await.expect("deallocation should pass");
        let DeallocationOutcome::Reallocated(outcome) = outcome else {
            panic!("driver on the roster should be re-recorded");
        };
        assert_eq!(outcome.date_of_data, "2026-08-01");
        assert_ne!(outcome.date_of_data, bishkek_date(Utc::now()));

        let upsert_date = table.calls().iter().find_map(|call| match call {
            TableCall::Upsert { row, .. } => Some(row["date_of_data"].clone()),
            _ => None,
        });
        assert_eq!(upsert_date, Some(json!("2026-08-01")));
    }

    #[tokio::test]
    async fn deallocate_clears_the_blacklist_before_the_date_lookup_fails() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Zero,
            vec![snapshot_company(
                "312",
                "Zero Carrier",
                vec![snapshot_driver("48213", "Nur", "A", None)],
            )],
        );
        let (deps, table) = allocator_deps(store, RecordingTable::default());

        let error = deallocate(&deps, "48213").await.expect_err("deallocation should fail");
        assert!(matches!(error, AllocationError::NoStoredAllocationDate { .. }));

        let calls = table.calls();
        assert_eq!(
            calls.first(),
            Some(&TableCall::Delete {
                table: BLACKLIST_TABLE.to_string(),
                filters: vec![("driver_eld_id".to_string(), "48213".to_string())],
            })
        );
    }

    #[tokio::test]
    async fn deallocate_without_a_roster_match_only_clears_the_blacklist() {
        let store = InMemoryStore::default();
        store.put_snapshot(Vendor::Hero, vec![snapshot_company("C1", "Acme", Vec::new())]);
        let (deps, table) = allocator_deps(store, RecordingTable::default());

        let outcome = deallocate(&deps, "unknown-hero-id")
            .await
            .expect("deallocation should pass");
        assert_eq!(
            outcome,
            DeallocationOutcome::BlacklistClearedOnly {
                driver_eld_id: "unknown-hero-id".to_string(),
            }
        );
        assert_eq!(table.calls().len(), 1);
    }

    #[tokio::test]
    async fn handler_maps_outcomes_to_http_statuses() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Hero,
            vec![snapshot_company(
                "C1",
                "Acme",
                vec![snapshot_driver("D1", "A", "B", None)],
            )],
        );
        let table = RecordingTable::default()
            .with_select(ALLOCATIONS_TABLE, json!({"user_id": "U1"}));
        let (deps, _table) = allocator_deps(store, table);

        let response = handle_allocator_event(
            json!({"httpMethod": "POST", "body": "{\"driver_eld_id\":\"D1\"}"}),
            &deps,
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("\"status\":\"allocated\""));

        let response = handle_allocator_event(
            json!({"httpMethod": "POST", "body": "{\"driver_eld_id\":\"nope\"}"}),
            &deps,
        )
        .await;
        assert_eq!(response.status_code, 404);

        let response =
            handle_allocator_event(json!({"httpMethod": "GET"}), &deps).await;
        assert_eq!(response.status_code, 405);

        let response = handle_allocator_event(
            json!({"httpMethod": "POST", "body": "{}"}),
            &deps,
        )
        .await;
        assert_eq!(response.status_code, 400);
    }

    #[tokio::test]
    async fn request_body_keyed_on_eld_id_is_accepted_by_both_handlers() {
        let store = InMemoryStore::default();
        store.put_snapshot(
            Vendor::Hero,
            vec![snapshot_company(
                "C1",
                "Acme",
                vec![snapshot_driver("D1", "A", "B", None)],
            )],
        );
        let table = RecordingTable::default()
            .with_select(MASTER_TABLE, json!({"date_of_data": "2026-08-01"}))
            .with_select(ALLOCATIONS_TABLE, json!({"user_id": "U1"}));
        let (deps, _table) = allocator_deps(store, table);

        let response = handle_allocator_event(
            json!({"httpMethod": "POST", "body": "{\"eldId\":\"D1\"}"}),
            &deps,
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("\"status\":\"allocated\""));

        let response = handle_deallocator_event(
            json!({"httpMethod": "POST", "body": "{\"eldId\":\"D1\"}"}),
            &deps,
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("\"status\":\"deallocated\""));
    }

    #[test]
    fn snapshot_parser_accepts_the_bare_company_array_form() {
        let companies = vec![snapshot_company("C1", "Acme", Vec::new())];
        let bytes = serde_json::to_vec(&companies).expect("companies should serialize");
        let parsed = parse_snapshot_companies("hero.json", &bytes).expect("parse should pass");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].company_id, "C1");
    }
}
