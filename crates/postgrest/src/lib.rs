//! PostgREST client for Rust
//!
//! Query builder and executor for the `/rest/v1` API of a hosted Postgres.
//!
//! # Features
//!
//! - Query API (`select`, `insert`, `update`, `upsert`, `delete`)
//! - Filtering (`eq`, `neq`, `gt`, `in`, etc.)
//! - Ordering and pagination
//! - Embedded resources through the select string
//! - RPC function calls

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error details returned by the PostgREST API
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Errors produced by [`PostgrestClient`]
#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl PostgrestError {
    /// HTTP status of an API failure, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PostgrestError::ApiError { status, .. } => Some(*status),
            PostgrestError::UnparsedApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// PostgREST client bound to one table (or one RPC function)
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    // Filters may repeat a column (`created_at=gte..&created_at=lte..`),
    // so parameters are kept as an ordered list rather than a map.
    query_params: Vec<(String, String)>,
    rpc_params: Option<Value>,
}

impl PostgrestClient {
    /// Create a client for a table
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
            rpc_params: None,
        }
    }

    /// Create a client for calling a stored function
    pub fn rpc(
        base_url: &str,
        api_key: &str,
        function_name: &str,
        params: Value,
        http_client: Client,
    ) -> Self {
        let mut client = Self::new(base_url, api_key, function_name, http_client);
        client.rpc_params = Some(params);
        client
    }

    /// Name of the table (or function) this client targets
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a request header
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Authenticate requests with a bearer token
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Columns to return, including embedded resources such as
    /// `*, category:categories(*)`
    pub fn select(self, columns: &str) -> Self {
        self.set_param("select", columns)
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: &str) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: &str) -> Self {
        self.filter(column, "lte", value)
    }

    /// Case insensitive pattern match (`*` is the wildcard)
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// `column IS NULL`
    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    /// `column IN (...)`; values containing reserved characters are quoted
    pub fn in_list(self, column: &str, values: &[&str]) -> Self {
        let list = values
            .iter()
            .map(|v| quote_list_value(v))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", &format!("({})", list))
    }

    /// Sort by a column
    pub fn order(self, column: &str, order: SortOrder) -> Self {
        let value = format!("{}.{}", column, order.as_str());
        self.set_param("order", &value)
    }

    pub fn limit(self, count: i32) -> Self {
        self.set_param("limit", &count.to_string())
    }

    pub fn offset(self, count: i32) -> Self {
        self.set_param("offset", &count.to_string())
    }

    fn filter(mut self, column: &str, operator: &str, value: &str) -> Self {
        self.query_params
            .push((column.to_string(), format!("{}.{}", operator, value)));
        self
    }

    fn set_param(mut self, key: &str, value: &str) -> Self {
        self.query_params.retain(|(k, _)| k != key);
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Fetch rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }

    /// Fetch the first matching row, if any
    pub async fn execute_one<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, PostgrestError> {
        let rows = self.clone().limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row or an array of rows, returning the inserted representation
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("POST {}", url);

        let request = self
            .http_client
            .post(&url)
            .headers(self.write_headers("return=representation"))
            .json(&values);
        send_write(request).await
    }

    /// Insert, merging rows that collide on `on_conflict`
    pub async fn upsert<T: Serialize>(
        &self,
        values: T,
        on_conflict: Option<&str>,
    ) -> Result<Value, PostgrestError> {
        let mut client = self.clone();
        if let Some(columns) = on_conflict {
            client = client.set_param("on_conflict", columns);
        }
        let url = client.build_url()?;
        log::debug!("POST (upsert) {}", url);

        let request = self
            .http_client
            .post(&url)
            .headers(self.write_headers("return=representation,resolution=merge-duplicates"))
            .json(&values);
        send_write(request).await
    }

    /// Update the rows matched by the filters
    pub async fn update<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        self.require_filter("update")?;
        let url = self.build_url()?;
        log::debug!("PATCH {}", url);

        let request = self
            .http_client
            .patch(&url)
            .headers(self.write_headers("return=representation"))
            .json(&values);
        send_write(request).await
    }

    /// Delete the rows matched by the filters
    pub async fn delete(&self) -> Result<Value, PostgrestError> {
        self.require_filter("delete")?;
        let url = self.build_url()?;
        log::debug!("DELETE {}", url);

        let request = self
            .http_client
            .delete(&url)
            .headers(self.write_headers("return=representation"));
        send_write(request).await
    }

    /// Call the stored function this client was created for
    pub async fn call_rpc<T: for<'de> Deserialize<'de>>(&self) -> Result<T, PostgrestError> {
        let params = self.rpc_params.as_ref().ok_or_else(|| {
            PostgrestError::InvalidParameters(
                "Client was not created for RPC. Use PostgrestClient::rpc().".to_string(),
            )
        })?;
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, self.table);
        log::debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers.clone())
            .json(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        // `void` functions answer 204 / an empty body
        let body = response.text().await?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str::<T>(body).map_err(|e| {
            PostgrestError::DeserializationError(format!(
                "Failed to deserialize RPC response: {}",
                e
            ))
        })
    }

    fn write_headers(&self, prefer: &'static str) -> HeaderMap {
        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static(prefer),
        );
        headers
    }

    // PostgREST refuses unfiltered writes on most setups; refuse them here
    // before they reach the network.
    fn require_filter(&self, operation: &str) -> Result<(), PostgrestError> {
        let reserved = ["select", "order", "limit", "offset", "on_conflict"];
        if self
            .query_params
            .iter()
            .any(|(k, _)| !reserved.contains(&k.as_str()))
        {
            Ok(())
        } else {
            Err(PostgrestError::InvalidParameters(format!(
                "{} on '{}' requires at least one filter",
                operation, self.table
            )))
        }
    }

    fn build_url(&self) -> Result<String, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }
}

async fn send_write(request: reqwest::RequestBuilder) -> Result<Value, PostgrestError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let body_text = response.text().await.map_err(|e| {
        PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
    })?;

    // 204 No Content
    if body_text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(&body_text)
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
    }
}

async fn error_from_response(response: Response) -> PostgrestError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());

    log::warn!("PostgREST request failed with {}: {}", status, error_text);

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => PostgrestError::ApiError { details, status },
        Err(_) => PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        },
    }
}

fn quote_list_value(value: &str) -> String {
    let reserved = [',', '(', ')', '"', ' ', '.', ':'];
    if value.chars().any(|c| reserved.contains(&c)) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
