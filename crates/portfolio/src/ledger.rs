//! Average-cost-basis portfolio ledger.
//!
//! All mutations are read-modify-write cycles over the persisted document:
//! validate first (fail fast, no partial state), then apply the change to an
//! in-memory snapshot, then persist it in a single write.

use crate::error::{PortfolioError, Result};
use crate::store::JsonStore;
use crate::types::{
    Document, Holding, Transaction, TxType, DUST_EPSILON, MAX_TRADE_AMOUNT, MAX_TRANSACTIONS,
};
use std::sync::Arc;

/// Result of a completed buy or sell.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    /// Holdings after the trade.
    pub portfolio: Vec<Holding>,
    /// The recorded transaction.
    pub transaction: Transaction,
}

/// The portfolio ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: Arc<JsonStore>,
}

impl Ledger {
    /// Creates a ledger over the given store.
    #[must_use]
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// Buys `amount` units of a coin at `price_per_unit`.
    ///
    /// An existing holding is merged with a volume-weighted average price;
    /// otherwise a new holding is created at the purchase price.
    ///
    /// # Errors
    /// Fails with a validation error before any I/O, or a store error if the
    /// write fails.
    pub async fn buy(
        &self,
        coin_id: &str,
        symbol: &str,
        name: &str,
        amount: f64,
        price_per_unit: f64,
    ) -> Result<TradeOutcome> {
        let coin_id = normalize_coin_id(coin_id)?;
        let symbol = require_text("symbol", symbol)?;
        let name = require_text("name", name)?;
        validate_amount(amount)?;
        validate_price(price_per_unit)?;

        let mut txn = self.store.begin().await;

        match txn.doc.portfolio.iter_mut().find(|h| h.coin_id == coin_id) {
            Some(holding) => {
                let total_cost = holding.amount * holding.avg_price + amount * price_per_unit;
                holding.amount += amount;
                holding.avg_price = total_cost / holding.amount;
            }
            None => txn.doc.portfolio.push(Holding {
                coin_id: coin_id.clone(),
                symbol: symbol.clone(),
                name: name.clone(),
                amount,
                avg_price: price_per_unit,
                stop_loss: None,
                take_profit: None,
            }),
        }

        let transaction =
            Transaction::new(TxType::Buy, coin_id, symbol, name, amount, price_per_unit);
        record(&mut txn.doc, transaction.clone());

        let portfolio = txn.doc.portfolio.clone();
        txn.commit().await.map_err(PortfolioError::from)?;

        tracing::debug!(
            "buy recorded: {} {} @ {}",
            transaction.amount,
            transaction.coin_id,
            transaction.price_per_unit
        );
        Ok(TradeOutcome {
            portfolio,
            transaction,
        })
    }

    /// Sells `amount` units of a held coin at `price_per_unit`.
    ///
    /// Realized P&L is `(price_per_unit - avg_price) * amount`. A holding
    /// whose remaining amount drops to dust is removed entirely.
    ///
    /// # Errors
    /// Fails with `not-held` when the coin is not in the portfolio, with
    /// `insufficient-balance` when the amount exceeds the held amount, with a
    /// validation error on bad input, or with a store error.
    pub async fn sell(
        &self,
        coin_id: &str,
        amount: f64,
        price_per_unit: f64,
    ) -> Result<TradeOutcome> {
        let coin_id = normalize_coin_id(coin_id)?;
        validate_amount(amount)?;
        validate_price(price_per_unit)?;

        let mut txn = self.store.begin().await;

        let index = txn
            .doc
            .portfolio
            .iter()
            .position(|h| h.coin_id == coin_id)
            .ok_or_else(|| PortfolioError::NotHeld {
                coin_id: coin_id.clone(),
            })?;

        let holding = &mut txn.doc.portfolio[index];
        if amount > holding.amount {
            return Err(PortfolioError::InsufficientBalance {
                held: holding.amount,
                requested: amount,
            });
        }

        let pnl = (price_per_unit - holding.avg_price) * amount;
        let symbol = holding.symbol.clone();
        let name = holding.name.clone();

        holding.amount -= amount;
        let remaining = holding.amount;
        if remaining <= DUST_EPSILON {
            txn.doc.portfolio.remove(index);
        }

        let mut transaction =
            Transaction::new(TxType::Sell, coin_id, symbol, name, amount, price_per_unit);
        transaction.pnl = Some(pnl);
        record(&mut txn.doc, transaction.clone());

        let portfolio = txn.doc.portfolio.clone();
        txn.commit().await.map_err(PortfolioError::from)?;

        tracing::debug!(
            "sell recorded: {} {} @ {} (pnl {})",
            transaction.amount,
            transaction.coin_id,
            transaction.price_per_unit,
            pnl
        );
        Ok(TradeOutcome {
            portfolio,
            transaction,
        })
    }

    /// Sets or clears the stop-loss and take-profit thresholds of a holding.
    ///
    /// Both fields are overwritten; passing `None` clears a threshold.
    /// Returns the updated holdings list.
    ///
    /// # Errors
    /// Fails with `not-found` when the holding does not exist, with a
    /// validation error on a negative or non-finite threshold, or with a
    /// store error.
    pub async fn set_stop_loss_take_profit(
        &self,
        coin_id: &str,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<Vec<Holding>> {
        let coin_id = normalize_coin_id(coin_id)?;
        validate_threshold("stopLoss", stop_loss)?;
        validate_threshold("takeProfit", take_profit)?;

        let mut txn = self.store.begin().await;

        let holding = txn
            .doc
            .portfolio
            .iter_mut()
            .find(|h| h.coin_id == coin_id)
            .ok_or_else(|| PortfolioError::HoldingNotFound {
                coin_id: coin_id.clone(),
            })?;
        holding.stop_loss = stop_loss;
        holding.take_profit = take_profit;

        let portfolio = txn.doc.portfolio.clone();
        txn.commit().await.map_err(PortfolioError::from)?;
        Ok(portfolio)
    }

    /// Returns the current holdings.
    pub async fn holdings(&self) -> Vec<Holding> {
        self.store.read().await.portfolio
    }

    /// Returns the transaction log, newest first.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.store.read().await.transactions
    }
}

/// Prepends a transaction and trims the log to its retention cap.
pub(crate) fn record(doc: &mut Document, transaction: Transaction) {
    doc.transactions.insert(0, transaction);
    doc.transactions.truncate(MAX_TRANSACTIONS);
}

fn normalize_coin_id(coin_id: &str) -> Result<String> {
    let coin_id = coin_id.trim().to_lowercase();
    if coin_id.is_empty() {
        return Err(PortfolioError::validation("invalid coinId: must not be empty"));
    }
    Ok(coin_id)
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PortfolioError::validation(format!(
            "invalid {field}: must not be empty"
        )));
    }
    Ok(value.to_string())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PortfolioError::validation(format!(
            "invalid amount: must be > 0, got {amount}"
        )));
    }
    if amount > MAX_TRADE_AMOUNT {
        return Err(PortfolioError::validation(format!(
            "invalid amount: exceeds maximum of {MAX_TRADE_AMOUNT}"
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(PortfolioError::validation(format!(
            "invalid pricePerUnit: must be > 0, got {price}"
        )));
    }
    Ok(())
}

fn validate_threshold(field: &str, value: Option<f64>) -> Result<()> {
    if let Some(value) = value {
        if !value.is_finite() || value < 0.0 {
            return Err(PortfolioError::validation(format!(
                "invalid {field}: must be >= 0, got {value}"
            )));
        }
    }
    Ok(())
}
