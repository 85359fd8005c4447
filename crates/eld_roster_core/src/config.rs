use std::collections::HashSet;
use std::time::Duration;

use crate::batch_plan::BatchConfig;

pub const HERO_API_BASE_URL_DEFAULT: &str = "https://backend.apexhos.com";
pub const ZERO_API_BASE_URL_DEFAULT: &str = "https://cloud.zeroeld.us";

/// Hero companies listing page size.
pub const HERO_COMPANIES_PAGE_SIZE: usize = 1000;
/// Zero companies listing page size.
pub const ZERO_COMPANIES_PAGE_SIZE: usize = 100;
/// Pause between company listing pages.
pub const PAGE_DELAY: Duration = Duration::from_millis(100);
/// Pause between a per-company login and the drivers fetch it authorizes.
pub const POST_AUTH_DELAY: Duration = Duration::from_millis(200);
/// Hard wall-clock budget for one aggregation run, kept under the
/// orchestrator's 30-minute invocation timeout.
pub const PIPELINE_TIMEOUT: Duration = Duration::from_secs(25 * 60);

/// Operationally blacklisted Hero accounts, overridable through
/// `EXCLUDED_COMPANY_IDS`.
pub const DEFAULT_EXCLUDED_COMPANY_IDS: &[&str] = &[
    "Company:5mJ7qXBDpF",
    "Company:HzUoAVDW0_",
    "Company:WMGn_7x8-H",
    "Company:jcBwjyzKIfk",
    "Company:YjyXd8_nf_r",
    "Company:YduLfv8Fbzb",
    "Company:Wf87FzbmCKW",
    "Company:UHojVXuOYH",
    "Company:QGq1MSv9Ufl",
    "Company:P5nDm7NkXjt",
    "Company:Ki5r52qA5to",
    "Company:DNye1iiuGUW",
    "Company:A3B8tVprpCS",
    "Company:9vE6CWMe_gU",
    "Company:t1c-41MEMb",
    "Company:sDDZMEfBETH",
    "Company:odZYUeailIW",
    "Company:xxZpCvV7NCp",
    "Company:y0VBQfjT7GC",
    "Company:ywIp7mhs8pj",
    "Company:xf_KvDrpg2u",
    "Company:vjnuaeUTuow",
];

/// Missing required configuration keys, enumerated so one failed invocation
/// reports every gap at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    missing: Vec<String>,
}

impl ConfigError {
    pub fn missing_keys(&self) -> &[String] {
        &self.missing
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing required configuration: {}",
            self.missing.join(", ")
        )
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
    pub excluded_company_ids: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatorConfig {
    pub api_url: String,
    pub api_key: String,
    pub bucket: String,
}

impl HeroConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut keys = RequiredKeys::default();
        let username = keys.require(&lookup, "HERO_ELD_USERNAME");
        let password = keys.require(&lookup, "HERO_ELD_PASSWORD");
        keys.check()?;

        Ok(Self {
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
            base_url: base_url(&lookup, "HERO_API_BASE_URL", HERO_API_BASE_URL_DEFAULT),
            excluded_company_ids: excluded_company_ids(&lookup),
        })
    }
}

impl ZeroConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut keys = RequiredKeys::default();
        let username = keys.require(&lookup, "ZERO_ELD_USERNAME");
        let password = keys.require(&lookup, "ZERO_ELD_PASSWORD");
        keys.check()?;

        Ok(Self {
            username: username.unwrap_or_default(),
            password: password.unwrap_or_default(),
            base_url: base_url(&lookup, "ZERO_API_BASE_URL", ZERO_API_BASE_URL_DEFAULT),
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut keys = RequiredKeys::default();
        let bucket = keys.require(&lookup, "ROSTER_BUCKET");
        keys.check()?;

        Ok(Self {
            bucket: bucket.unwrap_or_default(),
        })
    }
}

impl AllocatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut keys = RequiredKeys::default();
        let api_url = keys.require(&lookup, "ALLOCATIONS_API_URL");
        let api_key = keys.require(&lookup, "ALLOCATIONS_API_KEY");
        let bucket = keys.require(&lookup, "ROSTER_BUCKET");
        keys.check()?;

        Ok(Self {
            api_url: api_url.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
            bucket: bucket.unwrap_or_default(),
        })
    }
}

/// Hero pacing: chunks of 10, 2s between chunks, 300ms stagger inside a chunk.
pub fn hero_batch_config() -> BatchConfig {
    BatchConfig {
        batch_size: 10,
        inter_batch_delay: Duration::from_secs(2),
        stagger_step: Duration::from_millis(300),
    }
}

/// Zero pacing: chunks of 10, no inter-chunk pause, 150ms stagger.
pub fn zero_batch_config() -> BatchConfig {
    BatchConfig {
        batch_size: 10,
        inter_batch_delay: Duration::ZERO,
        stagger_step: Duration::from_millis(150),
    }
}

#[derive(Default)]
struct RequiredKeys {
    missing: Vec<String>,
}

impl RequiredKeys {
    fn require(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
        key: &str,
    ) -> Option<String> {
        let value = lookup(key).filter(|value| !value.trim().is_empty());
        if value.is_none() {
            self.missing.push(key.to_string());
        }
        value
    }

    fn check(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError {
                missing: self.missing,
            })
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn base_url(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn excluded_company_ids(lookup: impl Fn(&str) -> Option<String>) -> HashSet<String> {
    match lookup("EXCLUDED_COMPANY_IDS") {
        Some(raw) if !raw.trim().is_empty() => raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect(),
        _ => DEFAULT_EXCLUDED_COMPANY_IDS
            .iter()
            .map(|id| id.to_string())
            .collect(),
    }
}
