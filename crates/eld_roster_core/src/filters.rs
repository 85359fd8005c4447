use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::contract::{CompanyRoster, Company, DriverRecord, SnapshotCompany, SnapshotDriver};

/// Companies whose name starts with this prefix are placeholder accounts.
pub const COMPANY_NAME_DENY_PREFIX: &str = "zzz";

/// Trailing window a Zero driver must have reported within to count as active.
pub const ACTIVITY_WINDOW_DAYS: i64 = 15;

/// Drop denylisted companies: case-insensitive `zzz` name prefix plus the
/// operationally excluded account ids supplied through configuration.
pub fn filter_companies(companies: Vec<Company>, excluded_ids: &HashSet<String>) -> Vec<Company> {
    companies
        .into_iter()
        .filter(|company| !company.name.to_lowercase().starts_with(COMPANY_NAME_DENY_PREFIX))
        .filter(|company| !excluded_ids.contains(&company.company_id))
        .collect()
}

/// Hero activity rule: the vendor-reported `active` flag must be set.
pub fn is_active_hero(driver: &DriverRecord) -> bool {
    driver.active == Some(true)
}

/// Zero activity rule: `last_seen` must parse and fall inside the trailing
/// 15-day window, boundary inclusive. Null timestamps are dropped.
pub fn is_recently_seen(driver: &DriverRecord, now: DateTime<Utc>) -> bool {
    let Some(raw) = driver.last_seen.as_deref() else {
        return false;
    };
    let Some(last_seen) = parse_last_seen(raw) else {
        return false;
    };
    last_seen >= now - Duration::days(ACTIVITY_WINDOW_DAYS)
}

fn parse_last_seen(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.with_timezone(&Utc));
    }
    // PostgREST emits offset-less timestamps for timestamp-without-tz columns.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Apply the per-vendor activity rule inside each roster, leaving error
/// entries untouched.
pub fn retain_active_drivers<F>(rosters: &mut [CompanyRoster], rule: F)
where
    F: Fn(&DriverRecord) -> bool,
{
    for roster in rosters {
        roster.drivers.retain(&rule);
    }
}

/// Remove transient bookkeeping fields before a snapshot is published.
pub fn strip_internal_fields(rosters: Vec<CompanyRoster>) -> Vec<SnapshotCompany> {
    rosters
        .into_iter()
        .map(|roster| SnapshotCompany {
            vendor: roster.vendor,
            company_id: roster.company_id,
            name: roster.name,
            drivers: roster
                .drivers
                .into_iter()
                .map(|driver| SnapshotDriver {
                    eld_id: driver.eld_id,
                    first_name: driver.first_name,
                    last_name: driver.last_name,
                    vehicle: driver.vehicle,
                })
                .collect(),
            error: roster.error,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::contract::Vendor;

    use super::*;

    fn company(id: &str, name: &str) -> Company {
        Company {
            company_id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn driver(eld_id: &str) -> DriverRecord {
        DriverRecord {
            eld_id: eld_id.to_string(),
            first_name: None,
            last_name: None,
            vehicle: None,
            active: None,
            updated_at: None,
            last_seen: None,
        }
    }

    #[test]
    fn filter_companies_drops_deny_prefix_case_insensitively() {
        let companies = vec![
            company("c1", "Acme Logistics"),
            company("c2", "zzz retired"),
            company("c3", "ZZZ Archived"),
            company("c4", "Zzz-test"),
            company("c5", "Buzz Freight"),
        ];

        let kept = filter_companies(companies, &HashSet::new());
        let names: Vec<_> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Logistics", "Buzz Freight"]);
    }

    #[test]
    fn filter_companies_drops_excluded_ids() {
        let excluded = HashSet::from(["Company:blocked".to_string()]);
        let companies = vec![
            company("Company:blocked", "Still Operating"),
            company("Company:ok", "Still Operating"),
        ];

        let kept = filter_companies(companies, &excluded);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].company_id, "Company:ok");
    }

    #[test]
    fn hero_rule_keeps_exactly_the_active_flag() {
        let mut active = driver("d1");
        active.active = Some(true);
        let mut inactive = driver("d2");
        inactive.active = Some(false);
        let untagged = driver("d3");

        assert!(is_active_hero(&active));
        assert!(!is_active_hero(&inactive));
        assert!(!is_active_hero(&untagged));
    }

    #[test]
    fn zero_rule_keeps_the_fifteen_day_boundary_inclusive() {
        let now = Utc::now();
        let boundary = now - Duration::days(ACTIVITY_WINDOW_DAYS);

        let mut on_boundary = driver("d1");
        on_boundary.last_seen = Some(boundary.to_rfc3339());
        assert!(is_recently_seen(&on_boundary, now));

        let mut stale = driver("d2");
        stale.last_seen = Some((boundary - Duration::seconds(1)).to_rfc3339());
        assert!(!is_recently_seen(&stale, now));

        let mut fresh = driver("d3");
        fresh.last_seen = Some(now.to_rfc3339());
        assert!(is_recently_seen(&fresh, now));
    }

    #[test]
    fn zero_rule_drops_null_and_unparsable_timestamps() {
        let now = Utc::now();

        let null_seen = driver("d1");
        assert!(!is_recently_seen(&null_seen, now));

        let mut garbage = driver("d2");
        garbage.last_seen = Some("not-a-timestamp".to_string());
        assert!(!is_recently_seen(&garbage, now));
    }

    #[test]
    fn zero_rule_accepts_offsetless_timestamps() {
        let now = Utc::now();
        let mut recent = driver("d1");
        recent.last_seen = Some((now - Duration::days(1)).format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
        assert!(is_recently_seen(&recent, now));
    }

    #[test]
    fn strip_internal_fields_removes_bookkeeping_and_keeps_errors() {
        let mut tagged = driver("d1");
        tagged.first_name = Some("Aibek".to_string());
        tagged.active = Some(true);
        tagged.updated_at = Some("2026-08-01T10:00:00Z".to_string());

        let rosters = vec![
            CompanyRoster {
                vendor: Vendor::Hero,
                company_id: "c1".to_string(),
                name: "Acme".to_string(),
                drivers: vec![tagged],
                error: None,
            },
            CompanyRoster {
                vendor: Vendor::Hero,
                company_id: "c2".to_string(),
                name: "Bolt".to_string(),
                drivers: Vec::new(),
                error: Some("auth failed".to_string()),
            },
        ];

        let stripped = strip_internal_fields(rosters);
        let text = crate::contract::stable_contract_json(&stripped);
        assert!(!text.contains("active"));
        assert!(!text.contains("updatedAt"));
        assert!(text.contains("\"firstName\":\"Aibek\""));
        assert_eq!(stripped[1].error.as_deref(), Some("auth failed"));
    }
}
