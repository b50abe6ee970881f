//! Error types for ledger and trigger operations.

use crate::store::StoreError;
use thiserror::Error;

/// Errors raised by portfolio operations.
///
/// Every variant carries a machine-readable kind (see [`PortfolioError::kind`])
/// so the HTTP layer can map it to a status and surface the message verbatim.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Input failed shape or range validation; rejected before any I/O.
    #[error("{0}")]
    Validation(String),

    /// Sell attempted on a coin with no holding.
    #[error("you don't hold {coin_id}")]
    NotHeld {
        /// The coin that was not found in the portfolio.
        coin_id: String,
    },

    /// Sell amount exceeds the held amount.
    #[error("insufficient balance: you hold {held} but tried to sell {requested}")]
    InsufficientBalance {
        /// Amount currently held.
        held: f64,
        /// Amount the caller tried to sell.
        requested: f64,
    },

    /// Stop-loss/take-profit update on a holding that does not exist.
    #[error("no holding found for {coin_id}")]
    HoldingNotFound {
        /// The coin that was not found in the portfolio.
        coin_id: String,
    },

    /// The backing store could not be written.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PortfolioError {
    /// Stable string form of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotHeld { .. } => "not-held",
            Self::InsufficientBalance { .. } => "insufficient-balance",
            Self::HoldingNotFound { .. } => "not-found",
            Self::Store(_) => "storage",
        }
    }

    /// Builds a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;
