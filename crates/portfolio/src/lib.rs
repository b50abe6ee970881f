//! Portfolio ledger for the cryptofolio trading dashboard.
//!
//! This crate provides:
//! - Average-cost-basis accounting over a persisted holdings store
//! - An append-only transaction log with bounded retention (100 entries)
//! - Stop-loss/take-profit trigger evaluation with forced full liquidation
//! - A JSON document store with serialized read-modify-write cycles
//!
//! # Example
//!
//! ```ignore
//! use cryptofolio_portfolio::{JsonStore, Ledger, TriggerEvaluator};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cryptofolio_portfolio::Result<()> {
//!     let store = Arc::new(JsonStore::new("data.json"));
//!     let ledger = Ledger::new(store.clone());
//!
//!     let outcome = ledger.buy("bitcoin", "BTC", "Bitcoin", 0.5, 65000.0).await?;
//!     println!("avg price: {}", outcome.portfolio[0].avg_price);
//!
//!     ledger.set_stop_loss_take_profit("bitcoin", Some(55000.0), None).await?;
//!
//!     // Driven by an external scheduler (e.g. every 30 seconds):
//!     let evaluator = TriggerEvaluator::new(store);
//!     let prices = HashMap::from([("bitcoin".to_string(), 54000.0)]);
//!     let report = evaluator.evaluate(&prices).await?;
//!     for tx in &report.transactions {
//!         println!("liquidated {} at {}", tx.coin_id, tx.price_per_unit);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod ledger;
pub mod store;
pub mod triggers;
pub mod types;

// Re-export main types for convenience
pub use error::{PortfolioError, Result};
pub use ledger::{Ledger, TradeOutcome};
pub use store::{DocumentTxn, JsonStore, StoreError};
pub use triggers::{TriggerEvaluator, TriggerReport};
pub use types::{
    Document, Holding, Transaction, TriggerKind, TxType, WatchlistItem, DUST_EPSILON,
    MAX_TRADE_AMOUNT, MAX_TRANSACTIONS,
};
