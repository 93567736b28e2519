use std::fmt;

use url::Url;

use crate::error::{Error, Result};

pub const BASE_URL: &str = "https://quickbooks.api.intuit.com/v3";
pub const SANDBOX_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com/v3";

/// A typed representation of the company-scoped QuickBooks endpoints.
///
/// Every endpoint lives under `{base}/company/{realm_id}/`. Entity names are
/// lower-cased to form the path segment, so `Customer` and `customer` address
/// the same resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickbooksEndpoint {
    /// `.../{entity}` for create, update and delete.
    Entity(String),
    /// `.../{entity}/{id}` for reads.
    EntityRecord(String, i64),
    Query,
    Batch,
    // Custom endpoint with path components
    Custom(Vec<String>),
}

impl QuickbooksEndpoint {
    /// Converts the endpoint to a URL for the given company.
    pub fn to_url(&self, base_url: &str, realm_id: &str) -> Result<Url> {
        let mut url = Url::parse(base_url).map_err(|e| {
            error!("cannot resolve {self} against base URL {base_url}: {e}");
            Error::InvalidEndpoint
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                error!("cannot resolve {self}: base URL {base_url} has no path");
                Error::InvalidEndpoint
            })?;
            segments.pop_if_empty().push("company").push(realm_id);

            match self {
                Self::Entity(entity) => {
                    segments.push(&entity.to_lowercase());
                }
                Self::EntityRecord(entity, id) => {
                    segments.push(&entity.to_lowercase()).push(&id.to_string());
                }
                Self::Query => {
                    segments.push("query");
                }
                Self::Batch => {
                    segments.push("batch");
                }
                Self::Custom(components) => {
                    segments.extend(components);
                }
            }
        }

        Ok(url)
    }
}

impl fmt::Display for QuickbooksEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(entity) => write!(f, "{}", entity.to_lowercase()),
            Self::EntityRecord(entity, id) => write!(f, "{}/{id}", entity.to_lowercase()),
            Self::Query => write!(f, "query"),
            Self::Batch => write!(f, "batch"),
            Self::Custom(components) => write!(f, "{}", components.join("/")),
        }
    }
}
