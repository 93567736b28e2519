use miette::Diagnostic;
use reqwest::StatusCode;
use thiserror::Error;
use tracing_error::SpanTrace;

/// Boxed error used at the seams where a caller-supplied collaborator fails.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when interacting with the QuickBooks API.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// The API answered with a non-2xx status code.
    #[error(
        "received error [{response_body}] with status code [{}] when sending request",
        .status_code.as_u16()
    )]
    #[diagnostic(
        code(quickbooks_rs::bad_response),
        help("Inspect the response body; QuickBooks reports validation and auth faults there")
    )]
    BadResponse {
        status_code: StatusCode,
        response_body: String,
        url: String,
        #[source]
        source: BoxError,
        span_trace: SpanTrace,
    },

    #[error("error making request: {source}")]
    #[diagnostic(
        code(quickbooks_rs::request_error),
        help("Check your network connection and QuickBooks API availability")
    )]
    Request {
        #[source]
        source: BoxError,
        span_trace: SpanTrace,
    },

    #[error("error signing request: {source}")]
    #[diagnostic(
        code(quickbooks_rs::signing_error),
        help("Verify the consumer and access token credentials handed to the signer")
    )]
    Signing {
        #[source]
        source: BoxError,
        span_trace: SpanTrace,
    },

    #[error("error decoding response: {source}")]
    #[diagnostic(
        code(quickbooks_rs::deserialization_error),
        help("The API returned a body that is not valid JSON")
    )]
    DeserializationError {
        #[source]
        source: serde_json::Error,
        response_body: Option<String>,
    },

    #[error("error encoding request body: {0}")]
    #[diagnostic(code(quickbooks_rs::serialization_error))]
    Serialization(#[source] serde_json::Error),

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(quickbooks_rs::invalid_endpoint),
        help("Check the configured base URL and realm id")
    )]
    InvalidEndpoint,

    #[error("missing credential: {0} is not set")]
    #[diagnostic(
        code(quickbooks_rs::missing_credential),
        help("Export the QUICKBOOKS_* environment variables or build the credentials explicitly")
    )]
    MissingCredential(&'static str),
}

impl Error {
    /// Returns the span trace captured when this error was created, if any.
    #[must_use]
    pub fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            Self::BadResponse { span_trace, .. }
            | Self::Request { span_trace, .. }
            | Self::Signing { span_trace, .. } => Some(span_trace),
            _ => None,
        }
    }

    /// HTTP status code of a rejected request.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::BadResponse { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Raw response body, when the error carries one.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::BadResponse { response_body, .. } => Some(response_body),
            Self::DeserializationError { response_body, .. } => response_body.as_deref(),
            _ => None,
        }
    }
}

/// Type alias for results from this crate.
///
/// This is already a Miette diagnostic result due to the implementation of
/// the Diagnostic trait for the Error type.
pub type Result<O> = std::result::Result<O, Error>;
