//! HTTP client for the remote interpretation service.

use std::{error::Error as StdError, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{SpreadRequest, SpreadResponse};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const INTERPRET_SPREAD_PATH: &str = "interpret_spread";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretationError {
    #[error("could not reach the interpretation service: {0}")]
    Network(String),
    #[error("interpretation service returned status {status}: {body}")]
    Server { status: u16, body: String },
    #[error("interpretation service sent an unreadable response: {0}")]
    Decoding(String),
}

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("invalid interpretation service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Anything that can turn a spread into reading text. The sequencer only
/// talks to this seam, so tests can script completion order.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, request: &SpreadRequest) -> Result<String, InterpretationError>;
}

pub struct InterpretationClient {
    http: Client,
    endpoint: Url,
}

impl InterpretationClient {
    pub fn new(base_url: &str) -> Result<Self, ClientConfigError> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientConfigError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http(http, base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self, ClientConfigError> {
        Ok(Self {
            http,
            endpoint: interpret_endpoint(base_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Interpreter for InterpretationClient {
    async fn interpret(&self, request: &SpreadRequest) -> Result<String, InterpretationError> {
        debug!(
            endpoint = %self.endpoint,
            spread_type = %request.spread_type,
            card_count = request.cards.len(),
            "sending spread for interpretation"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| InterpretationError::Network(describe_transport_error(&err)))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    let reason = describe_transport_error(&err);
                    debug!(status = status.as_u16(), %reason, "failed to read error response body");
                    format!("<unreadable body: {reason}>")
                }
            };
            return Err(InterpretationError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| InterpretationError::Network(describe_transport_error(&err)))?;
        let parsed: SpreadResponse = serde_json::from_slice(&body)
            .map_err(|err| InterpretationError::Decoding(err.to_string()))?;
        Ok(parsed.interpretation)
    }
}

/// Resolves `<base>/interpret_spread`, keeping any path prefix on the base.
pub fn interpret_endpoint(base_url: &str) -> Result<Url, ClientConfigError> {
    let invalid = |reason: String| ClientConfigError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let mut base = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    if base.cannot_be_a_base() {
        return Err(invalid("url cannot be used as a base".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(INTERPRET_SPREAD_PATH)
        .map_err(|err| invalid(err.to_string()))
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
#[path = "tests/interpretation_tests.rs"]
mod tests;
