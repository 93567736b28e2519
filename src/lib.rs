//! # quickbooks-rs
//!
//! A Rust client library for the QuickBooks Online API.
//!
//! Responses are decoded by shape rather than by a fixed schema: the first key
//! of every response envelope tells whether it holds a single entity, the
//! records of a query, or the per-item results of a batch call. See
//! [`Response`] for the rules.
//!
//! ```ignore
//! use quickbooks_rs::{Credentials, DataService, RequestOptions};
//!
//! let service = DataService::new(Credentials::from_env()?, "123145", my_oauth1_signer)
//!     .with_user_agent("acme-sync/1.0");
//!
//! let customers = service
//!     .entity("Customer")
//!     .query(None, &RequestOptions::default())
//!     .await?
//!     .into_query()
//!     .unwrap_or_default();
//!
//! for customer in &customers {
//!     println!("{:?} {:?}", customer.id(), customer.get_str("DisplayName"));
//! }
//! ```
//!
//! ## Span traces
//!
//! Errors created inside the client capture a [`SpanTrace`]. Install
//! `tracing_error::ErrorLayer` in your subscriber to have them populated:
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//! use tracing_error::ErrorLayer;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ErrorLayer::default())
//!     .init();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod oauth;
pub mod transport;
pub mod utils;

pub use client::{DataService, EntityApi};
pub use endpoints::QuickbooksEndpoint;
pub use entities::*;
pub use error::{Error, Result};
pub use oauth::{Credentials, KeyPair, Signer};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Options for individual API requests.
/// These control query parameters appended to request URLs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// The API minor version to request, e.g. `65`. QuickBooks serves the
    /// base version of every entity when this is not set.
    pub minor_version: Option<u32>,
}

impl RequestOptions {
    #[must_use]
    pub fn minor_version(minor_version: u32) -> Self {
        Self {
            minor_version: Some(minor_version),
        }
    }

    /// Apply the options as query parameters to a URL.
    pub fn apply_to_url(&self, url: &mut url::Url) {
        if let Some(minor_version) = self.minor_version {
            url.query_pairs_mut()
                .append_pair("minorversion", &minor_version.to_string());
        }
    }
}

// Re-export SpanTrace for users who want to access it
pub use tracing_error::SpanTrace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_version_starts_or_extends_the_query_string() {
        let options = RequestOptions::minor_version(65);

        let mut url = url::Url::parse("https://example.test/v3/company/1/customer").unwrap();
        options.apply_to_url(&mut url);
        assert_eq!(url.query(), Some("minorversion=65"));

        let mut url =
            url::Url::parse("https://example.test/v3/company/1/customer?operation=update").unwrap();
        options.apply_to_url(&mut url);
        assert_eq!(url.query(), Some("operation=update&minorversion=65"));
    }

    #[test]
    fn default_options_leave_the_url_alone() {
        let mut url = url::Url::parse("https://example.test/v3/company/1/customer").unwrap();
        RequestOptions::default().apply_to_url(&mut url);
        assert_eq!(url.query(), None);
    }
}
