use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The two upstream ELD platforms this system aggregates.
///
/// Serialized as the `eldPlatform` tag carried on every roster entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Vendor {
    #[serde(rename = "HERO")]
    Hero,
    #[serde(rename = "ZERO")]
    Zero,
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "HERO",
            Self::Zero => "ZERO",
        }
    }

    /// Classify a driver id by vendor id convention: Zero ids are decimal
    /// row identifiers, Hero ids are opaque Mongo-style object ids.
    pub fn for_driver_id(eld_id: &str) -> Self {
        if !eld_id.is_empty() && eld_id.bytes().all(|byte| byte.is_ascii_digit()) {
            Self::Zero
        } else {
            Self::Hero
        }
    }
}

/// A company record returned by a vendor listing call. Listing payloads
/// spell the identifier three different ways; all are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    #[serde(rename = "companyId", alias = "id", alias = "company_id")]
    pub company_id: String,
    #[serde(default)]
    pub name: String,
}

/// Canonical driver shape produced at the ingestion boundary.
///
/// `active`, `updated_at`, and `last_seen` are transient bookkeeping fields
/// consumed by the activity filters and stripped before snapshot upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub eld_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub vehicle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_seen: Option<String>,
}

/// Externally visible driver shape after internal fields are stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDriver {
    pub eld_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub vehicle: Option<String>,
}

impl SnapshotDriver {
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{first} {last}").trim().to_string()
    }
}

/// Per-company batch result. A failed fetch is a roster with an `_error`
/// message and no drivers, never an aborted batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyRoster {
    #[serde(rename = "eldPlatform")]
    pub vendor: Vendor,
    #[serde(rename = "companyId", alias = "id")]
    pub company_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub drivers: Vec<DriverRecord>,
    #[serde(rename = "_error", skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl CompanyRoster {
    pub fn success(vendor: Vendor, company: &Company, drivers: Vec<DriverRecord>) -> Self {
        Self {
            vendor,
            company_id: company.company_id.clone(),
            name: company.name.clone(),
            drivers,
            error: None,
        }
    }

    pub fn failure(vendor: Vendor, company: &Company, message: impl Into<String>) -> Self {
        Self {
            vendor,
            company_id: company.company_id.clone(),
            name: company.name.clone(),
            drivers: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }
}

/// Company entry inside a published snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotCompany {
    #[serde(rename = "eldPlatform")]
    pub vendor: Vendor,
    #[serde(rename = "companyId", alias = "id")]
    pub company_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub drivers: Vec<SnapshotDriver>,
    #[serde(rename = "_error", skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// The full merged result of one aggregation run, published wholesale to
/// object storage under a fixed name (last writer wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub timestamp: String,
    #[serde(rename = "totalCompanies", default)]
    pub total_companies: usize,
    #[serde(rename = "companyDrivers")]
    pub company_drivers: Vec<SnapshotCompany>,
}

/// Aggregate counters reported by a batch run. Failed units are counted,
/// never silently dropped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterRunSummary {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub drivers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Normalize a raw Hero driver payload into the canonical record.
///
/// Records without an `appVersion` never ran the mobile app and are dropped,
/// as are records missing the `_id` the allocation flow keys on. Name fields
/// arrive in three spellings depending on account age.
pub fn normalize_hero_driver(raw: &Value) -> Option<DriverRecord> {
    if raw.get("appVersion").map_or(true, Value::is_null) {
        return None;
    }
    let eld_id = identifier_field(raw, &["_id"])?;

    Some(DriverRecord {
        eld_id,
        first_name: string_field(raw, &["firstName", "firstname", "first_name"]),
        last_name: string_field(raw, &["lastName", "lastname", "last_name"]),
        vehicle: raw
            .pointer("/driverInfo/avi/0")
            .and_then(value_as_identifier),
        active: Some(raw.get("active").map_or(false, truthy)),
        updated_at: string_field(raw, &["updatedAt"]),
        last_seen: None,
    })
}

/// Normalize a raw Zero driver row into the canonical record.
pub fn normalize_zero_driver(raw: &Value) -> Option<DriverRecord> {
    let eld_id = identifier_field(raw, &["id"])?;

    Some(DriverRecord {
        eld_id,
        first_name: string_field(raw, &["first_name"]),
        last_name: string_field(raw, &["last_name"]),
        vehicle: raw
            .pointer("/assigned_vehicle_ids/0")
            .and_then(value_as_identifier),
        active: None,
        updated_at: None,
        last_seen: string_field(raw, &["last_seen"]),
    })
}

fn string_field(raw: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| raw.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn identifier_field(raw: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| raw.get(name))
        .and_then(value_as_identifier)
}

fn value_as_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Null => false,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Content fingerprint of a published snapshot, reported in run summaries.
pub fn snapshot_fingerprint(snapshot: &Snapshot) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stable_contract_json(snapshot));
    format!("{:x}", hasher.finalize())
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn vendor_classifies_driver_ids_by_convention() {
        assert_eq!(Vendor::for_driver_id("48213"), Vendor::Zero);
        assert_eq!(Vendor::for_driver_id("64f1c9a2e4b0d7"), Vendor::Hero);
        assert_eq!(Vendor::for_driver_id(""), Vendor::Hero);
    }

    #[test]
    fn company_accepts_all_identifier_spellings() {
        for payload in [
            json!({"companyId": "Company:abc", "name": "Acme"}),
            json!({"id": "Company:abc", "name": "Acme"}),
            json!({"company_id": "Company:abc", "name": "Acme"}),
        ] {
            let company: Company =
                serde_json::from_value(payload).expect("company should deserialize");
            assert_eq!(company.company_id, "Company:abc");
            assert_eq!(company.name, "Acme");
        }
    }

    #[test]
    fn hero_normalizer_accepts_all_name_spellings() {
        for (first_key, last_key) in [
            ("firstName", "lastName"),
            ("firstname", "lastname"),
            ("first_name", "last_name"),
        ] {
            let raw = json!({
                "_id": "driver-1",
                first_key: "Aibek",
                last_key: "Toktogulov",
                "appVersion": "3.1.4",
                "active": true,
                "driverInfo": {"avi": ["TRK-17"]},
                "updatedAt": "2026-08-01T10:00:00Z",
            });

            let driver = normalize_hero_driver(&raw).expect("driver should normalize");
            assert_eq!(driver.first_name.as_deref(), Some("Aibek"));
            assert_eq!(driver.last_name.as_deref(), Some("Toktogulov"));
            assert_eq!(driver.vehicle.as_deref(), Some("TRK-17"));
            assert_eq!(driver.active, Some(true));
        }
    }

    #[test]
    fn hero_normalizer_drops_records_without_app_version() {
        let raw = json!({"_id": "driver-1", "firstName": "A", "active": true});
        assert!(normalize_hero_driver(&raw).is_none());

        let raw = json!({"_id": "driver-1", "appVersion": null, "active": true});
        assert!(normalize_hero_driver(&raw).is_none());
    }

    #[test]
    fn hero_normalizer_coerces_truthy_active_flags() {
        let raw = json!({"_id": "d", "appVersion": "1.0", "active": 1});
        let driver = normalize_hero_driver(&raw).expect("driver should normalize");
        assert_eq!(driver.active, Some(true));

        let raw = json!({"_id": "d", "appVersion": "1.0"});
        let driver = normalize_hero_driver(&raw).expect("driver should normalize");
        assert_eq!(driver.active, Some(false));
    }

    #[test]
    fn zero_normalizer_reads_numeric_ids_and_vehicle_assignment() {
        let raw = json!({
            "id": 48213,
            "first_name": "Nursultan",
            "last_name": "Abdyldaev",
            "assigned_vehicle_ids": [905, 906],
            "last_seen": "2026-08-20T08:30:00+00:00",
        });

        let driver = normalize_zero_driver(&raw).expect("driver should normalize");
        assert_eq!(driver.eld_id, "48213");
        assert_eq!(driver.vehicle.as_deref(), Some("905"));
        assert_eq!(driver.last_seen.as_deref(), Some("2026-08-20T08:30:00+00:00"));
        assert_eq!(driver.active, None);
    }

    #[test]
    fn snapshot_round_trips_with_external_field_names() {
        let snapshot = Snapshot {
            timestamp: "2026-08-28T12:00:00+06:00".to_string(),
            total_companies: 1,
            company_drivers: vec![SnapshotCompany {
                vendor: Vendor::Hero,
                company_id: "Company:abc".to_string(),
                name: "Acme".to_string(),
                drivers: vec![SnapshotDriver {
                    eld_id: "driver-1".to_string(),
                    first_name: Some("Aibek".to_string()),
                    last_name: None,
                    vehicle: Some("TRK-17".to_string()),
                }],
                error: None,
            }],
        };

        let text = stable_contract_json(&snapshot);
        assert!(text.contains("\"eldPlatform\":\"HERO\""));
        assert!(text.contains("\"companyId\":\"Company:abc\""));
        assert!(text.contains("\"eldId\":\"driver-1\""));
        assert!(text.contains("\"firstName\":\"Aibek\""));
        assert!(!text.contains("_error"));

        let parsed: Snapshot = serde_json::from_str(&text).expect("snapshot should parse");
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn snapshot_fingerprint_is_stable_for_identical_content() {
        let snapshot = Snapshot {
            timestamp: "2026-08-28T12:00:00+06:00".to_string(),
            total_companies: 0,
            company_drivers: Vec::new(),
        };

        assert_eq!(
            snapshot_fingerprint(&snapshot),
            snapshot_fingerprint(&snapshot.clone())
        );
    }

    #[test]
    fn roster_failure_entries_serialize_the_error_tag() {
        let company = Company {
            company_id: "Company:abc".to_string(),
            name: "Acme".to_string(),
        };
        let roster = CompanyRoster::failure(Vendor::Zero, &company, "drivers fetch failed: 500");

        let text = stable_contract_json(&roster);
        assert!(text.contains("\"_error\":\"drivers fetch failed: 500\""));
        assert!(text.contains("\"drivers\":[]"));
    }
}
