use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::adapters::upstream::{check_response, UpstreamError};
use crate::runtime::config::HeroConfig;
use crate::runtime::contract::Company;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hero backend API. Listing runs under an account-level token; driver
/// fetches require a second, company-scoped login (two-phase auth).
#[async_trait]
pub trait HeroApi: Send + Sync {
    async fn authenticate(&self) -> Result<String, UpstreamError>;

    /// One page of the companies listing (`$limit`/`$skip` pagination).
    async fn list_companies(
        &self,
        token: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Company>, UpstreamError>;

    /// Company-scoped bearer token for the drivers endpoint.
    async fn company_token(&self, company_id: &str) -> Result<String, UpstreamError>;

    /// Raw driver payloads for the company the token is scoped to.
    async fn drivers(&self, company_token: &str) -> Result<Vec<Value>, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct HeroClient {
    http: reqwest::Client,
    username: String,
    password: String,
    base_url: String,
}

impl HeroClient {
    pub fn new(config: &HeroConfig) -> Result<Self, UpstreamError> {
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

    async fn token_exchange(&self, company: Value, context: &str) -> Result<String, UpstreamError> {
        let body = json!({
            "company": company,
            "email": self.username,
            "password": self.password,
            "rCode": "hero",
            "strategy": "local",
        });

        let response = self
            .http
            .post(format!("{}/authentication", self.base_url))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;
        let response = check_response(context, response).await?;

        let payload: Value = response
            .json()
            .await
            .map_err(|error| UpstreamError::message(format!("{context}: malformed response: {error}")))?;
        extract_token(&payload)
            .ok_or_else(|| UpstreamError::message(format!("{context}: no token in response")))
    }
}

#[async_trait]
impl HeroApi for HeroClient {
    async fn authenticate(&self) -> Result<String, UpstreamError> {
        self.token_exchange(Value::Null, "authentication failed").await
    }

    async fn company_token(&self, company_id: &str) -> Result<String, UpstreamError> {
        self.token_exchange(
            Value::String(company_id.to_string()),
            &format!("auth failed for company {company_id}"),
        )
        .await
    }

    async fn list_companies(
        &self,
        token: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Vec<Company>, UpstreamError> {
        let response = self
            .http
            .get(format!("{}/companies", self.base_url))
            .query(&[("$limit", limit.to_string()), ("$skip", skip.to_string())])
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_response("companies fetch failed", response).await?;

        let payload: Value = response.json().await.map_err(|error| {
            UpstreamError::message(format!("companies fetch failed: malformed response: {error}"))
        })?;
        Ok(parse_company_page(&payload))
    }

    async fn drivers(&self, company_token: &str) -> Result<Vec<Value>, UpstreamError> {
        let response = self
            .http
            .get(format!("{}/drivers", self.base_url))
            .bearer_auth(company_token)
            .send()
            .await?;
        let response = check_response("drivers fetch failed", response).await?;

        let payload: Value = response.json().await.map_err(|error| {
            UpstreamError::message(format!("drivers fetch failed: malformed response: {error}"))
        })?;
        Ok(unwrap_data_array(payload))
    }
}

fn extract_token(payload: &Value) -> Option<String> {
    [
        "/accessToken",
        "/token",
        "/data/token",
        "/data/accessToken",
    ]
    .iter()
    .find_map(|pointer| payload.pointer(pointer))
    .and_then(Value::as_str)
    .map(str::to_string)
}

/// Listing responses arrive either as a bare array or wrapped in `{data}`.
/// Entries without a usable identifier are skipped.
fn parse_company_page(payload: &Value) -> Vec<Company> {
    let entries = payload
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| payload.as_array());
    entries
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .filter(|company: &Company| !company.company_id.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn unwrap_data_array(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(entries) => entries,
        Value::Object(mut fields) => match fields.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
