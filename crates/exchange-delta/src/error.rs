//! Error taxonomy for the Delta Exchange integration.
//!
//! Every failure is reported as a single structured [`DeltaError`] carrying a
//! machine-readable [`ErrorKind`], the originating HTTP status (0 when no
//! status exists yet), and a human-readable message. Callers map the kind to
//! their own surface and show the message verbatim.

use thiserror::Error;

/// Classification of a Delta API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials rejected or expired (HTTP 401/403).
    Auth,
    /// No credentials configured at all; no request was attempted.
    AuthNotConfigured,
    /// Venue-side throttling (HTTP 429).
    RateLimit,
    /// Resource does not exist (HTTP 404).
    NotFound,
    /// Upstream 5xx.
    Server,
    /// Transport-level failure before any status was available.
    Network,
    /// Request rejected locally before signing.
    Validation,
    /// Unclassified HTTP failure.
    Unknown,
}

impl ErrorKind {
    /// Stable string form of the kind, suitable for wire serialization.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AuthNotConfigured => "auth-not-configured",
            Self::RateLimit => "rate-limit",
            Self::NotFound => "not-found",
            Self::Server => "server",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }

    /// Classifies an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            404 => Self::NotFound,
            s if s >= 500 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure talking to the Delta Exchange API.
#[derive(Debug, Clone, Error)]
#[error("delta api error ({kind}, status {status}): {message}")]
pub struct DeltaError {
    /// Classified failure kind.
    pub kind: ErrorKind,
    /// Original HTTP status, 0 for network-level and configuration errors.
    pub status: u16,
    /// Human-readable message extracted from the response when possible.
    pub message: String,
}

/// Guidance appended to auth failures. New Delta API keys are not usable
/// immediately after creation; this is informational, not a retry trigger.
const KEY_WARMUP_NOTE: &str =
    "Note: freshly created API keys can take a few minutes to become operational.";

impl DeltaError {
    /// Builds an error from an HTTP status and extracted message.
    ///
    /// Auth failures get the key warm-up note appended.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = ErrorKind::from_status(status);
        let message = message.into();
        let message = match kind {
            ErrorKind::Auth => format!("{message}. {KEY_WARMUP_NOTE}"),
            _ => message,
        };
        Self {
            kind,
            status,
            message,
        }
    }

    /// Builds a transport-level error (no HTTP status available).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            status: 0,
            message: message.into(),
        }
    }

    /// Builds the distinct missing-credentials error. Authenticated calls
    /// fail with this before any request is attempted.
    #[must_use]
    pub fn not_configured() -> Self {
        Self {
            kind: ErrorKind::AuthNotConfigured,
            status: 0,
            message: "Delta API keys not configured. Set DELTA_API_KEY and DELTA_API_SECRET"
                .to_string(),
        }
    }

    /// Builds a local validation error, raised before signing or sending.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            status: 0,
            message: message.into(),
        }
    }

    /// Builds an error for a successful response whose body did not match
    /// the expected shape.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: 0,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DeltaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Result type alias for Delta operations.
pub type Result<T> = std::result::Result<T, DeltaError>;
