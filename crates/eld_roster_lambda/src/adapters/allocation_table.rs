use async_trait::async_trait;
use serde_json::Value;

pub const MASTER_TABLE: &str = "daily_master_eld_data";
pub const ALLOCATIONS_TABLE: &str = "daily_allocations";
pub const BLACKLIST_TABLE: &str = "driver_blacklist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableError {
    pub table: String,
    pub message: String,
}

impl TableError {
    pub fn new(table: &str, message: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table {}: {}", self.table, self.message)
    }
}

impl std::error::Error for TableError {}

/// Relational seam consumed by the allocation flows. Rows travel as JSON
/// objects; equality filters are `(column, value)` pairs.
#[async_trait]
pub trait AllocationTable: Send + Sync {
    /// Insert-or-overwrite keyed by `conflict_key` (may name several
    /// comma-separated columns). Last write wins.
    async fn upsert(&self, table: &str, row: Value, conflict_key: &str) -> Result<(), TableError>;

    async fn insert(&self, table: &str, row: Value) -> Result<(), TableError>;

    /// First row matching all filters, or None.
    async fn select_first(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<Option<Value>, TableError>;

    async fn delete(&self, table: &str, filters: &[(&str, &str)]) -> Result<(), TableError>;
}

/// PostgREST-backed implementation of the allocation tables.
#[derive(Debug, Clone)]
pub struct PostgrestTable {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl PostgrestTable {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(
        table: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<reqwest::Response, TableError> {
        let response = response.map_err(|error| TableError::new(table, error.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        Err(TableError::new(table, format!("{status} - {body}")))
    }

    fn eq_filters<'a>(filters: &'a [(&str, &str)]) -> Vec<(&'a str, String)> {
        filters
            .iter()
            .map(|(column, value)| (*column, format!("eq.{value}")))
            .collect()
    }
}

#[async_trait]
impl AllocationTable for PostgrestTable {
    async fn upsert(&self, table: &str, row: Value, conflict_key: &str) -> Result<(), TableError> {
        let request = self
            .authorized(self.http.post(self.table_url(table)))
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);
        Self::check(table, request.send().await).await.map(|_| ())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), TableError> {
        let request = self
            .authorized(self.http.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&row);
        Self::check(table, request.send().await).await.map(|_| ())
    }

    async fn select_first(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<Option<Value>, TableError> {
        let request = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&[("select", columns), ("limit", "1")])
            .query(&Self::eq_filters(filters));
        let response = Self::check(table, request.send().await).await?;

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|error| TableError::new(table, format!("malformed response: {error}")))?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, table: &str, filters: &[(&str, &str)]) -> Result<(), TableError> {
        let request = self
            .authorized(self.http.delete(self.table_url(table)))
            .query(&Self::eq_filters(filters));
        Self::check(table, request.send().await).await.map(|_| ())
    }
}
