use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;
use tracing_error::SpanTrace;
use url::Url;

use crate::RequestOptions;
use crate::endpoints::{BASE_URL, QuickbooksEndpoint};
use crate::entities::{Entity, Response};
use crate::error::{Error, Result};
use crate::oauth::{Credentials, Signer};
use crate::transport::{
    HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError, UnexpectedStatus,
};

const APPLICATION_JSON: &str = "application/json";

/// The client used for interacting with the QuickBooks Online API. It signs
/// every request for one company (the realm) and decodes whatever comes back
/// into a [`Response`].
///
/// Signing and transport are pluggable: the signer is always supplied by the
/// caller, the transport defaults to [`ReqwestTransport`].
#[derive(Clone, Debug)]
pub struct DataService<S, T = ReqwestTransport> {
    credentials: Credentials,
    realm_id: String,
    user_agent: Option<String>,
    base_url: String,
    signer: S,
    transport: T,
}

impl<S: Signer> DataService<S> {
    #[must_use]
    pub fn new(credentials: Credentials, realm_id: impl Into<String>, signer: S) -> Self {
        Self {
            credentials,
            realm_id: realm_id.into(),
            user_agent: None,
            base_url: BASE_URL.to_string(),
            signer,
            transport: ReqwestTransport::default(),
        }
    }
}

impl<S: Signer, T: Transport> DataService<S, T> {
    /// Swaps the transport, e.g. for a preconfigured `reqwest::Client` or a test double.
    #[must_use]
    pub fn with_transport<U: Transport>(self, transport: U) -> DataService<S, U> {
        DataService {
            credentials: self.credentials,
            realm_id: self.realm_id,
            user_agent: self.user_agent,
            base_url: self.base_url,
            signer: self.signer,
            transport,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Points the client somewhere other than production, such as
    /// [`SANDBOX_BASE_URL`](crate::endpoints::SANDBOX_BASE_URL).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolves an endpoint against this client's base URL and realm.
    pub fn request_url(&self, endpoint: &QuickbooksEndpoint) -> Result<Url> {
        trace!(%endpoint, realm_id = %self.realm_id, "resolving endpoint");
        endpoint.to_url(&self.base_url, &self.realm_id)
    }

    /// The signed headers for a request, plus the JSON content headers.
    pub fn headers(&self, method: &Method, url: &Url) -> Result<BTreeMap<String, String>> {
        let mut headers = self
            .signer
            .sign(&self.credentials, method, url)
            .map_err(|source| Error::Signing {
                source,
                span_trace: SpanTrace::capture(),
            })?;

        headers.insert("Accept".to_string(), APPLICATION_JSON.to_string());
        headers.insert("Content-Type".to_string(), APPLICATION_JSON.to_string());
        if let Some(user_agent) = self.user_agent.as_ref().filter(|ua| !ua.is_empty()) {
            headers.insert("User-Agent".to_string(), user_agent.clone());
        }

        Ok(headers)
    }

    /// Access the create/read/update/delete/query operations of one entity type.
    #[must_use]
    pub fn entity(&self, name: impl Into<String>) -> EntityApi<'_, S, T> {
        EntityApi {
            service: self,
            name: name.into(),
        }
    }

    /// Run a query such as `select * from Invoice where TotalAmt > '100.00'`.
    #[instrument(skip(self, options))]
    pub async fn query(&self, query: &str, options: &RequestOptions) -> Result<Response> {
        let mut url = self.request_url(&QuickbooksEndpoint::Query)?;
        url.query_pairs_mut().append_pair("query", query);
        options.apply_to_url(&mut url);

        self.request::<()>(Method::GET, url, None).await
    }

    /// Send a batch request, typically a [`BatchRequest`](crate::BatchRequest).
    #[instrument(skip(self, payload, options))]
    pub async fn batch<B: Serialize + ?Sized>(
        &self,
        payload: &B,
        options: &RequestOptions,
    ) -> Result<Response> {
        let mut url = self.request_url(&QuickbooksEndpoint::Batch)?;
        options.apply_to_url(&mut url);

        self.request(Method::POST, url, Some(payload)).await
    }

    /// Sign and send one request, then decode the body by its shape.
    ///
    /// A non-2xx answer becomes [`Error::BadResponse`] carrying the body, the
    /// status code and the transport's error. Nothing is retried.
    #[instrument(skip(self, body))]
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        let headers = self.headers(&method, &url)?;
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(Error::Serialization)?;

        trace!(body = ?body, "making {method} request");
        let result = self
            .transport
            .send(HttpRequest {
                method,
                url: url.clone(),
                headers,
                body,
            })
            .await;

        Self::handle_response(&url, result)
    }

    fn handle_response(
        url: &Url,
        result: std::result::Result<HttpResponse, TransportError>,
    ) -> Result<Response> {
        let response = match result {
            Ok(response) if response.status.is_success() => response,
            Ok(response) => {
                return Err(Self::bad_response(
                    url,
                    response.status,
                    response.body,
                    Box::new(UnexpectedStatus(response.status)),
                ));
            }
            Err(TransportError::Status {
                status,
                body,
                source,
            }) => return Err(Self::bad_response(url, status, body, source)),
            Err(TransportError::Connection(source)) => {
                error!("request to {url} failed: {source}");
                return Err(Error::Request {
                    source,
                    span_trace: SpanTrace::capture(),
                });
            }
        };

        debug!(
            "Response from {}: status={}, body size={} bytes",
            url,
            response.status,
            response.body.len()
        );
        trace!("Response text:\n{}", response.body);

        if response.body.trim().is_empty() {
            debug!("empty response body, using empty entity");
            return Ok(Response::Entity(Entity::default()));
        }

        serde_json::from_str(&response.body).map_err(|e| {
            error!(
                "Deserialization error: {}, near position: {} - response text around that position: {}",
                e,
                e.column(),
                &response
                    .body
                    .chars()
                    .skip(e.column().saturating_sub(30))
                    .take(100)
                    .collect::<String>()
            );
            Error::DeserializationError {
                source: e,
                response_body: Some(response.body.clone()),
            }
        })
    }

    fn bad_response(
        url: &Url,
        status_code: reqwest::StatusCode,
        response_body: String,
        source: crate::error::BoxError,
    ) -> Error {
        error!("Unexpected status code {} from {}: {}", status_code, url, response_body);
        Error::BadResponse {
            status_code,
            response_body,
            url: url.to_string(),
            source,
            span_trace: SpanTrace::capture(),
        }
    }
}

/// API handler for one QuickBooks entity type, e.g. `Customer` or `Invoice`.
pub struct EntityApi<'a, S, T> {
    service: &'a DataService<S, T>,
    name: String,
}

impl<S: Signer, T: Transport> EntityApi<'_, S, T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new record.
    #[instrument(skip(self, payload, options), fields(entity = %self.name))]
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        payload: &B,
        options: &RequestOptions,
    ) -> Result<Response> {
        let mut url = self.url(QuickbooksEndpoint::Entity(self.name.clone()))?;
        options.apply_to_url(&mut url);

        self.service.request(Method::POST, url, Some(payload)).await
    }

    /// Read a single record by its id.
    #[instrument(skip(self), fields(entity = %self.name))]
    pub async fn read(&self, id: i64) -> Result<Response> {
        let url = self.url(QuickbooksEndpoint::EntityRecord(self.name.clone(), id))?;

        self.service.request::<()>(Method::GET, url, None).await
    }

    /// Update a record. The payload must carry `Id` and the current `SyncToken`.
    #[instrument(skip(self, payload, options), fields(entity = %self.name))]
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        payload: &B,
        options: &RequestOptions,
    ) -> Result<Response> {
        let mut url = self.url(QuickbooksEndpoint::Entity(self.name.clone()))?;
        url.query_pairs_mut().append_pair("operation", "update");
        options.apply_to_url(&mut url);

        self.service.request(Method::POST, url, Some(payload)).await
    }

    /// Delete a record. The payload must carry `Id` and the current `SyncToken`.
    #[instrument(skip(self, payload), fields(entity = %self.name))]
    pub async fn delete<B: Serialize + ?Sized>(&self, payload: &B) -> Result<()> {
        let mut url = self.url(QuickbooksEndpoint::Entity(self.name.clone()))?;
        url.query_pairs_mut().append_pair("operation", "delete");

        self.service.request(Method::POST, url, Some(payload)).await?;
        Ok(())
    }

    /// Query this entity type, defaulting to `select * from {entity}`.
    #[instrument(skip(self, options), fields(entity = %self.name))]
    pub async fn query(&self, query: Option<&str>, options: &RequestOptions) -> Result<Response> {
        match query {
            Some(query) => self.service.query(query, options).await,
            None => {
                let query = format!("select * from {}", self.name);
                self.service.query(&query, options).await
            }
        }
    }

    fn url(&self, endpoint: QuickbooksEndpoint) -> Result<Url> {
        self.service.request_url(&endpoint)
    }
}
