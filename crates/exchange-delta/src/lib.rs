//! Delta Exchange integration for the cryptofolio trading dashboard.
//!
//! This crate provides:
//! - REST client with rate limiting for the Delta Exchange API
//! - HMAC-SHA256 request signing for private endpoints
//! - TTL caches with stale-serve fallback for tickers and products
//! - Data models for products, tickers, candles, orders, positions and fills
//!
//! # Authentication
//!
//! Delta signs private requests with HMAC-SHA256 over
//! `method + timestamp + "/v2" + path + query + body`. Set the following
//! environment variables:
//!
//! - `DELTA_API_KEY`: your API key
//! - `DELTA_API_SECRET`: your API secret
//! - `DELTA_API_BASE_URL`: optional base URL override
//!
//! Without credentials the public market-data endpoints still work; every
//! private endpoint fails fast with the `auth-not-configured` error and no
//! network call is made.
//!
//! # API Endpoints
//!
//! - `GET /products` - list products (cached)
//! - `GET /tickers` - list tickers (cached)
//! - `GET /tickers/{symbol}` - single ticker (404 yields `None`)
//! - `GET /l2orderbook/{product_id}` - order book
//! - `GET /history/candles` - OHLCV history (best-effort)
//! - `POST /orders` - place order (signed)
//! - `DELETE /orders` - cancel order (signed)
//! - `GET /orders` - open orders (signed)
//! - `GET /positions` - positions (signed)
//! - `GET /fills` - trade history (signed)
//! - `GET /wallet/balances` - wallet balances (signed)

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use auth::{DeltaAuth, SignedHeaders, API_VERSION_PREFIX};
pub use cache::TtlCache;
pub use client::{DeltaClient, DeltaClientConfig, DELTA_PROD_URL};
pub use error::{DeltaError, ErrorKind, Result};
pub use types::{
    Asset, BookLevel, Candle, Fill, Order, OrderBook, OrderRequest, OrderType, Position, Product,
    Side, StopOrderType, Ticker, TimeInForce, WalletBalance,
};
