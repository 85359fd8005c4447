use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapters::upstream::{check_response, UpstreamError};
use crate::runtime::config::ZeroConfig;
use crate::runtime::contract::Company;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Driver columns the roster consumes from the per-driver log view.
const DRIVER_COLUMNS: &str = "id,first_name,last_name,username,assigned_vehicle_ids,last_seen";

/// Zero cloud REST API. One account-level token covers both the company
/// listing and the per-company driver views.
#[async_trait]
pub trait ZeroApi: Send + Sync {
    async fn sign_in(&self) -> Result<String, UpstreamError>;

    /// One page of the companies listing (`limit`/`offset` pagination,
    /// name-ordered).
    async fn list_companies(
        &self,
        token: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Company>, UpstreamError>;

    /// Raw driver rows for one company, most recently seen first.
    async fn drivers_for_company(
        &self,
        token: &str,
        company_id: &str,
    ) -> Result<Vec<Value>, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct ZeroClient {
    http: reqwest::Client,
    username: String,
    password: String,
    base_url: String,
}

impl ZeroClient {
    pub fn new(config: &ZeroConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| UpstreamError::message(format!("failed to build client: {error}")))?;
        Ok(Self {
            http,
            username: config.username.clone(),
            password: config.password.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ZeroApi for ZeroClient {
    async fn sign_in(&self) -> Result<String, UpstreamError> {
        let body = json!({
            "parameters": {
                "device_id": "roster-aggregator",
                "device_name": "eld-roster-lambda",
            },
            "username": self.username,
            "password": self.password,
        });

        let response = self
            .http
            .post(format!("{}/rest/rpc/sign_in_v2", self.base_url))
            .json(&body)
            .send()
            .await?;
        let response = check_response("login failed", response).await?;

        let payload: Value = response.json().await.map_err(|error| {
            UpstreamError::message(format!("login failed: malformed response: {error}"))
        })?;
        extract_token(&payload)
            .ok_or_else(|| UpstreamError::message("login failed: no token in response"))
    }

    async fn list_companies(
        &self,
        token: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Company>, UpstreamError> {
        let response = self
            .http
            .get(format!("{}/rest/company", self.base_url))
            .query(&[
                ("order", "name_lower.asc,name.asc".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_response("companies fetch failed", response).await?;

        let rows: Vec<Value> = response.json().await.map_err(|error| {
            UpstreamError::message(format!("companies fetch failed: malformed response: {error}"))
        })?;
        Ok(rows
            .into_iter()
            .filter_map(parse_company_row)
            .collect())
    }

    async fn drivers_for_company(
        &self,
        token: &str,
        company_id: &str,
    ) -> Result<Vec<Value>, UpstreamError> {
        let response = self
            .http
            .get(format!("{}/rest/logs_by_driver_view", self.base_url))
            .query(&[
                ("select", DRIVER_COLUMNS.to_string()),
                ("company_id", format!("eq.{company_id}")),
                ("order", "last_seen.desc.nullslast".to_string()),
                ("limit", "1000".to_string()),
            ])
            .bearer_auth(token)
            .send()
            .await?;
        let response =
            check_response(&format!("drivers fetch failed for {company_id}"), response).await?;

        response.json().await.map_err(|error| {
            UpstreamError::message(format!(
                "drivers fetch failed for {company_id}: malformed response: {error}"
            ))
        })
    }
}

fn extract_token(payload: &Value) -> Option<String> {
    [
        "/token",
        "/data/token",
        "/access_token",
        "/accessToken",
        "/session/access_token",
    ]
    .iter()
    .find_map(|pointer| payload.pointer(pointer))
    .and_then(Value::as_str)
    .map(str::to_string)
}

/// Company rows carry numeric ids; normalize to the string identifier the
/// rest of the pipeline keys on.
fn parse_company_row(row: Value) -> Option<Company> {
    let company_id = match row.get("id") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => return None,
    };
    let name = row
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Company { company_id, name })
}
