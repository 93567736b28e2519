use std::collections::BTreeMap;
use std::future::Future;

use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::error::BoxError;

/// A fully prepared request: signed headers, encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered, but not with a success status.
    #[error("server responded with status {status}")]
    Status {
        status: StatusCode,
        body: String,
        #[source]
        source: BoxError,
    },

    /// No response was received.
    #[error("request could not be completed: {0}")]
    Connection(#[source] BoxError),
}

/// Raised when a transport hands back a non-success response as `Ok`.
#[derive(Debug, Error)]
#[error("unexpected HTTP status {0}")]
pub struct UnexpectedStatus(pub StatusCode);

/// Executes one HTTP exchange. Implementations own connection reuse,
/// timeouts and cancellation; the client never retries.
pub trait Transport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// The default transport, backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connection(Box::new(e)))?;

        let status = response.status();
        let status_error = response.error_for_status_ref().err();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Connection(Box::new(e)))?;

        match status_error {
            Some(e) => Err(TransportError::Status {
                status,
                body,
                source: Box::new(e),
            }),
            None => Ok(HttpResponse { status, body }),
        }
    }
}
