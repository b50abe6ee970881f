//! HMAC-SHA256 request signing for the Delta Exchange API.
//!
//! Delta authenticates private endpoints with a shared-secret signature over
//! `method + timestamp + "/v2" + path + query + body`, where the timestamp is
//! unix seconds and the signature is lowercase hex. The same timestamp used in
//! the payload must be sent verbatim in the `timestamp` header, since the
//! venue re-derives the signature from the headers.
//!
//! # Security
//!
//! - The API secret is held as a [`SecretString`] and never logged.
//! - Signing without configured credentials is unrepresentable: [`DeltaAuth`]
//!   cannot be constructed with an empty key or secret.

use crate::error::{DeltaError, Result};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// API version segment included in the signing payload and request paths.
pub const API_VERSION_PREFIX: &str = "/v2";

// =============================================================================
// Signed Headers
// =============================================================================

/// Headers required for authenticated Delta API requests.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// `api-key` header.
    pub api_key: String,

    /// `signature` header (lowercase hex HMAC-SHA256).
    pub signature: String,

    /// `timestamp` header: the exact unix-seconds value that was signed.
    pub timestamp: String,
}

impl SignedHeaders {
    /// Returns headers as tuples for reqwest.
    #[must_use]
    pub fn as_tuples(&self) -> [(&'static str, &str); 3] {
        [
            ("api-key", &self.api_key),
            ("signature", &self.signature),
            ("timestamp", &self.timestamp),
        ]
    }
}

// =============================================================================
// DeltaAuth
// =============================================================================

/// HMAC-SHA256 authenticator for Delta API requests.
pub struct DeltaAuth {
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for DeltaAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl DeltaAuth {
    /// Creates an authenticator from an API key and secret.
    ///
    /// # Errors
    /// Fails with the `auth-not-configured` error if either value is empty,
    /// so a signature can never be produced from an empty secret.
    pub fn new(api_key: impl Into<String>, api_secret: SecretString) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() || api_secret.expose_secret().is_empty() {
            return Err(DeltaError::not_configured());
        }
        Ok(Self {
            api_key,
            api_secret,
        })
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signs a request with the current time.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, DELETE, ...)
    /// * `path` - API path without the version prefix (e.g. `/orders`)
    /// * `query` - Query string including its leading `?`, or empty
    /// * `body` - Serialized JSON body, or empty for bodyless requests
    ///
    /// # Errors
    /// Returns an error if the system clock is unavailable.
    pub fn sign(&self, method: &str, path: &str, query: &str, body: &str) -> Result<SignedHeaders> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| DeltaError::network(format!("failed to read system time: {e}")))?
            .as_secs();
        Ok(self.sign_with_timestamp(method, path, query, body, timestamp))
    }

    /// Signs a request with an explicit unix-seconds timestamp (useful for
    /// deterministic tests).
    #[must_use]
    pub fn sign_with_timestamp(
        &self,
        method: &str,
        path: &str,
        query: &str,
        body: &str,
        timestamp: u64,
    ) -> SignedHeaders {
        let timestamp = timestamp.to_string();
        let payload =
            format!("{method}{timestamp}{API_VERSION_PREFIX}{path}{query}{body}");

        // Key length is unrestricted for HMAC, so this cannot fail.
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        SignedHeaders {
            api_key: self.api_key.clone(),
            signature,
            timestamp,
        }
    }
}
