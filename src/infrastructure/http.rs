//! HTTP adapters for the backend REST API and the Supabase product table.

use crate::domain::catalog::{CatalogProduct, CatalogQuery};
use crate::domain::money::Money;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{
    AccrualGateway, BalanceGateway, CatalogGateway, DebitGateway, GatewayResult,
};
use crate::domain::requests::{AccrualRequest, BalanceResponse, DebitRequest, Receipt};
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const ACCRUAL_PATH: &str = "/cashback/process";
const BALANCE_PATH: &str = "/cashback/balance";
const DEBIT_PATH: &str = "/cashback/debit";

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise a base URL:
/// - ensure a scheme is present (http for localhost and bare IPs, https otherwise)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        let host_is_local = url.starts_with("localhost")
            || url
                .split([':', '/'])
                .next()
                .is_some_and(|host| host.parse::<std::net::IpAddr>().is_ok());
        url = if host_is_local {
            format!("http://{url}")
        } else {
            format!("https://{url}")
        };
    }

    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Removes PostgREST wildcard characters so user text matches literally.
fn ilike_pattern(text: &str) -> String {
    let literal: String = text.trim().chars().filter(|c| !matches!(c, '*' | '%')).collect();
    format!("ilike.*{literal}*")
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(url: &str, err: &reqwest::Error) -> GatewayError {
    if err.is_connect() {
        return GatewayError::Transport(format!("Cannot reach server at {url}"));
    }
    if err.is_timeout() {
        return GatewayError::Transport(format!("Connection to {url} timed out"));
    }
    if err.is_builder() {
        return GatewayError::Transport(format!("Invalid server URL: {url}"));
    }
    GatewayError::Transport(format!("Network error communicating with {url}: {err}"))
}

/// Builds the rejection for a non-success response, keeping the server's own
/// `message` (or `error`) text when the body carries one.
fn rejection(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        json.get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(|s| s.to_string())
    });
    GatewayError::Rejected {
        status: status.as_u16(),
        message,
    }
}

async fn execute(url: &str, request: RequestBuilder) -> GatewayResult<String> {
    let resp = request.send().await.map_err(|e| transport_error(url, &e))?;
    let status = resp.status();
    let body = resp.text().await.map_err(|e| transport_error(url, &e))?;
    if !status.is_success() {
        warn!(url, status = status.as_u16(), "request rejected");
        return Err(rejection(status, &body));
    }
    debug!(url, status = status.as_u16(), "request succeeded");
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> GatewayResult<T> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn receipt(body: &str) -> GatewayResult<Receipt> {
    if body.trim().is_empty() {
        return Ok(Receipt(Value::Null));
    }
    decode(body).map(Receipt)
}

fn build_client(timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// The cashback backend: balance lookup, accrual and debit.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: normalize_base_url(base_url),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl BalanceGateway for HttpBackend {
    async fn balance(&self, phone: &PhoneNumber) -> GatewayResult<Money> {
        let url = self.url(BALANCE_PATH);
        let request = self
            .client
            .get(&url)
            .query(&[("phoneNumber", phone.as_str())]);
        let body = execute(&url, request).await?;
        let response: BalanceResponse = decode(&body)?;
        Ok(response.balance)
    }
}

#[async_trait]
impl AccrualGateway for HttpBackend {
    async fn accrue(&self, request: AccrualRequest) -> GatewayResult<Receipt> {
        let url = self.url(ACCRUAL_PATH);
        info!(url = %url, items = request.items.len(), "posting accrual");
        let body = execute(&url, self.client.post(&url).json(&request)).await?;
        receipt(&body)
    }
}

#[async_trait]
impl DebitGateway for HttpBackend {
    async fn debit(&self, request: DebitRequest) -> GatewayResult<Receipt> {
        let url = self.url(DEBIT_PATH);
        info!(url = %url, amount = %request.amount, "posting debit");
        let body = execute(&url, self.client.post(&url).json(&request)).await?;
        receipt(&body)
    }
}

// ---------------------------------------------------------------------------
// Supabase catalog
// ---------------------------------------------------------------------------

/// Product search against a Supabase (PostgREST) table.
#[derive(Clone)]
pub struct SupabaseCatalog {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseCatalog {
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: normalize_base_url(base_url),
            api_key: api_key.trim().to_string(),
            table: table.trim().to_string(),
        })
    }
}

#[async_trait]
impl CatalogGateway for SupabaseCatalog {
    async fn search(&self, query: CatalogQuery) -> GatewayResult<Vec<CatalogProduct>> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let limit = query.limit.to_string();
        let request = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "id,name,price,description"),
                ("name", ilike_pattern(&query.name_pattern).as_str()),
                ("limit", limit.as_str()),
            ]);
        let body = execute(&url, request).await?;
        decode(&body)
    }
}
