use std::collections::BTreeMap;
use std::fmt;

use reqwest::Method;
use url::Url;

use crate::error::{BoxError, Error, Result};

const ENV_CONSUMER_KEY: &str = "QUICKBOOKS_CONSUMER_KEY";
const ENV_CONSUMER_SECRET: &str = "QUICKBOOKS_CONSUMER_SECRET";
const ENV_ACCESS_TOKEN: &str = "QUICKBOOKS_ACCESS_TOKEN";
const ENV_ACCESS_TOKEN_SECRET: &str = "QUICKBOOKS_ACCESS_TOKEN_SECRET";

/// An OAuth 1 identifier and its shared secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair(pub(crate) String, pub(crate) String);

impl KeyPair {
    #[must_use]
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self(identifier.into(), secret.into())
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.1
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPair")
            .field(&self.0)
            .field(&"[redacted]")
            .finish()
    }
}

/// The consumer (application) key pair plus the access token pair of the
/// connected company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer: KeyPair,
    pub token: KeyPair,
}

impl Credentials {
    #[must_use]
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer: KeyPair::new(consumer_key, consumer_secret),
            token: KeyPair::new(access_token, access_token_secret),
        }
    }

    /// Reads `QUICKBOOKS_CONSUMER_KEY`, `QUICKBOOKS_CONSUMER_SECRET`,
    /// `QUICKBOOKS_ACCESS_TOKEN` and `QUICKBOOKS_ACCESS_TOKEN_SECRET`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Credentials::from_env`], reading the same names through `lookup`
    /// (a config file, a secrets store).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &'static str| lookup(name).ok_or(Error::MissingCredential(name));

        Ok(Self::new(
            var(ENV_CONSUMER_KEY)?,
            var(ENV_CONSUMER_SECRET)?,
            var(ENV_ACCESS_TOKEN)?,
            var(ENV_ACCESS_TOKEN_SECRET)?,
        ))
    }
}

/// Produces the OAuth 1 authorization headers for a request.
///
/// The signature algorithm is not part of this crate; plug in whichever
/// OAuth 1 implementation the application already uses. Closures with the
/// same signature implement this trait.
pub trait Signer {
    fn sign(
        &self,
        credentials: &Credentials,
        method: &Method,
        url: &Url,
    ) -> std::result::Result<BTreeMap<String, String>, BoxError>;
}

impl<F> Signer for F
where
    F: Fn(&Credentials, &Method, &Url) -> std::result::Result<BTreeMap<String, String>, BoxError>,
{
    fn sign(
        &self,
        credentials: &Credentials,
        method: &Method,
        url: &Url,
    ) -> std::result::Result<BTreeMap<String, String>, BoxError> {
        self(credentials, method, url)
    }
}
