//! Data models for the Delta Exchange REST API.
//!
//! These are pass-through DTOs mirroring the venue's wire schema. Delta sends
//! most monetary fields as strings; they are kept that way here, since the
//! client does no arithmetic on them.

use crate::error::{DeltaError, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Market Data Types
// =============================================================================

/// A tradable instrument offered by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Numeric product id, used for orders and the order book.
    pub id: u64,

    /// Product symbol (e.g. "BTCUSD").
    pub symbol: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Underlying asset.
    #[serde(default)]
    pub underlying_asset: Option<Asset>,

    /// Quoting asset.
    #[serde(default)]
    pub quoting_asset: Option<Asset>,

    /// Product type (e.g. "perpetual_futures").
    #[serde(default)]
    pub product_type: Option<String>,

    /// Listing state (e.g. "live").
    #[serde(default)]
    pub state: Option<String>,
}

/// An asset referenced by a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub symbol: String,
}

/// Snapshot of current price/volume statistics for one trading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub mark_price: Option<String>,
    #[serde(default)]
    pub spot_price: Option<String>,
    #[serde(default)]
    pub last_price: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub turnover: Option<String>,
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(default)]
    pub price_change_24h: Option<String>,
    #[serde(default)]
    pub price_change_percent_24h: Option<String>,
}

/// One OHLCV candle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time, epoch seconds.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One price level of the L2 order book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: String,
    pub size: f64,
}

/// L2 order book for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub buy: Vec<BookLevel>,
    #[serde(default)]
    pub sell: Vec<BookLevel>,
}

// =============================================================================
// Order Types
// =============================================================================

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Order execution type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    LimitOrder,
    MarketOrder,
}

/// Stop trigger semantics for conditional orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOrderType {
    StopLossOrder,
    TakeProfitOrder,
}

/// Time-in-force policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

/// Parameters for placing an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub product_id: u64,
    pub side: Side,
    pub size: f64,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_order_type: Option<StopOrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
}

impl OrderRequest {
    /// Creates a market order.
    #[must_use]
    pub fn market(product_id: u64, side: Side, size: f64) -> Self {
        Self {
            product_id,
            side,
            size,
            order_type: OrderType::MarketOrder,
            limit_price: None,
            stop_price: None,
            stop_order_type: None,
            time_in_force: None,
        }
    }

    /// Creates a limit order.
    #[must_use]
    pub fn limit(product_id: u64, side: Side, size: f64, limit_price: impl Into<String>) -> Self {
        Self {
            product_id,
            side,
            size,
            order_type: OrderType::LimitOrder,
            limit_price: Some(limit_price.into()),
            stop_price: None,
            stop_order_type: None,
            time_in_force: None,
        }
    }

    /// Sets the time-in-force policy.
    #[must_use]
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }

    /// Validates the request before it is signed and sent.
    ///
    /// # Errors
    /// Returns a validation error for a zero product id or a non-finite or
    /// non-positive size.
    pub fn validate(&self) -> Result<()> {
        if self.product_id == 0 {
            return Err(DeltaError::validation("product_id must be a positive id"));
        }
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(DeltaError::validation(format!(
                "order size must be a positive number, got {}",
                self.size
            )));
        }
        Ok(())
    }
}

/// An order as reported by the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub product_id: u64,
    pub side: Side,
    pub size: f64,
    #[serde(default)]
    pub unfilled_size: Option<f64>,
    #[serde(default)]
    pub limit_price: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// =============================================================================
// Account Types
// =============================================================================

/// An open position at the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub product_id: u64,
    #[serde(default)]
    pub product_symbol: Option<String>,
    pub size: f64,
    #[serde(default)]
    pub entry_price: Option<String>,
    #[serde(default)]
    pub margin: Option<String>,
    #[serde(default)]
    pub liquidation_price: Option<String>,
    #[serde(default)]
    pub realized_pnl: Option<String>,
    #[serde(default)]
    pub unrealized_pnl: Option<String>,
}

/// An executed trade record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub id: u64,
    pub product_id: u64,
    #[serde(default)]
    pub side: Option<String>,
    pub size: f64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A single asset balance in the wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(default)]
    pub asset_id: Option<u64>,
    #[serde(default)]
    pub asset_symbol: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub available_balance: Option<String>,
}
