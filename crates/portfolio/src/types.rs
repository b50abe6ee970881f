//! Document model for the persisted portfolio store.
//!
//! Field names follow the JSON document on disk (camelCase), which is shared
//! with the watchlist and user management layers outside this crate.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of retained transaction log entries; oldest trimmed first.
pub const MAX_TRANSACTIONS: usize = 100;

/// Holdings at or below this amount are treated as floating-point dust and
/// removed from the portfolio.
pub const DUST_EPSILON: f64 = 1e-10;

/// Upper bound on a single trade amount.
pub const MAX_TRADE_AMOUNT: f64 = 1e12;

// =============================================================================
// Document
// =============================================================================

/// The persisted JSON document. A missing or unreadable backing store is
/// represented by the default (all-empty) document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub watchlist: Vec<WatchlistItem>,
    pub portfolio: Vec<Holding>,
    /// Newest first, capped at [`MAX_TRANSACTIONS`].
    pub transactions: Vec<Transaction>,
    /// Managed by the account layer; carried through untouched.
    pub users: Vec<serde_json::Value>,
}

/// A watchlist entry (managed outside this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

// =============================================================================
// Holdings
// =============================================================================

/// One owned asset with its volume-weighted average cost basis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    /// Lowercase-normalized asset id, unique within the portfolio.
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    /// Always > 0; a holding is removed once its amount drops to dust.
    pub amount: f64,
    /// Volume-weighted average price paid per unit, recalculated on every buy.
    pub avg_price: f64,
    /// Liquidate the position when the price drops to or below this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    /// Liquidate the position when the price rises to or above this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
}

// =============================================================================
// Transactions
// =============================================================================

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Buy,
    Sell,
}

/// What caused a sell; absent means a user-initiated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    #[serde(rename = "stop-loss")]
    StopLoss,
    #[serde(rename = "take-profit")]
    TakeProfit,
}

/// One append-only transaction log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique id: epoch millis plus a random suffix.
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub price_per_unit: f64,
    /// `amount * price_per_unit`.
    pub total: f64,
    /// Realized profit and loss; present only for sells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
    /// Present only for trigger-initiated liquidations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerKind>,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

impl Transaction {
    /// Builds a transaction stamped with the current time and a fresh id.
    #[must_use]
    pub fn new(
        tx_type: TxType,
        coin_id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        amount: f64,
        price_per_unit: f64,
    ) -> Self {
        Self {
            id: new_transaction_id(),
            tx_type,
            coin_id: coin_id.into(),
            symbol: symbol.into(),
            name: name.into(),
            amount,
            price_per_unit,
            total: amount * price_per_unit,
            pnl: None,
            trigger: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

fn new_transaction_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("tx-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
