//! # GraphQL HTTP Client
//!
//! Posts [`GqlRequest`] bodies to one GraphQL endpoint and unwraps the
//! `data` member of the response.

use doccache_core::GqlRequest;
use serde_json::Value;

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the endpoint.
    ConnectionFailed(String),
    /// The endpoint answered with a non-success status.
    ServerError(u16, String),
    /// The response body is not a GraphQL response.
    ParseError(String),
    /// The response carries GraphQL errors.
    Graphql(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to {url}"),
            Self::ServerError(status, msg) => write!(f, "Server error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::Graphql(msg) => write!(f, "GraphQL error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// HTTP client bound to a single GraphQL endpoint.
#[derive(Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    url: String,
}

impl GraphqlClient {
    /// Create a client for `url` (e.g. `http://localhost:8080/graphql`).
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    /// The endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and handle connection errors.
    async fn send(&self, body: &GqlRequest) -> Result<reqwest::Response, ClientError> {
        self.http
            .post(&self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.url)))
    }

    /// Check the status, then split the body into data and errors.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), body));
        }
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        data_of(body)
    }

    /// POST the request; returns the `data` member.
    pub async fn execute(&self, body: &GqlRequest) -> Result<Value, ClientError> {
        let resp = self.send(body).await?;
        self.handle_response(resp).await
    }
}

/// The `data` member of a GraphQL response, or its joined error messages.
pub fn data_of(mut body: Value) -> Result<Value, ClientError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array).filter(|e| !e.is_empty()) {
        let messages: Vec<&str> = errors
            .iter()
            .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
            .collect();
        return Err(ClientError::Graphql(messages.join("; ")));
    }
    match body.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(ClientError::ParseError("response without data".to_string())),
    }
}
