use crate::{HeaderPair, QueryBody, QueryError, Response};
use serde_json::Value;
#[cfg(feature = "default-transport")]
use std::sync::Arc;
#[cfg(feature = "default-transport")]
use thiserror::Error;

/// Sends a request body to a GraphQL endpoint and returns the decoded response.
///
/// This is the only part of the client that touches the network, so it's also the seam for
/// mocking in tests.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn fetch(
        &self,
        url: &str,
        body: &QueryBody,
        extra_headers: Vec<HeaderPair>
    ) -> Result<Response<Value>, QueryError>;
}

#[cfg(feature = "default-transport")]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    NetworkError(reqwest::Error),
    #[error("server returned error code: {0}\n{1}")]
    NotOk(reqwest::StatusCode, String),
    #[error("decoding error: {0}")]
    DecodeError(reqwest::Error)
}

#[cfg(feature = "default-transport")]
impl From<FetchError> for QueryError {
    fn from(e: FetchError) -> Self {
        QueryError::Fetch(Arc::new(e))
    }
}

/// The default transport. POSTs the body as JSON using `reqwest`.
#[cfg(feature = "default-transport")]
#[derive(Default, Clone)]
pub struct FetchTransport {
    client: reqwest::Client
}

#[cfg(feature = "default-transport")]
impl FetchTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        FetchTransport { client }
    }
}

#[cfg(feature = "default-transport")]
#[async_trait]
impl Transport for FetchTransport {
    async fn fetch(
        &self,
        url: &str,
        body: &QueryBody,
        extra_headers: Vec<HeaderPair>
    ) -> Result<Response<Value>, QueryError> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body);

        for HeaderPair(key, value) in extra_headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(FetchError::NetworkError)?;
        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::NotOk(status, body).into());
        }

        Ok(response.json().await.map_err(FetchError::DecodeError)?)
    }
}
