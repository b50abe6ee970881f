//! Stop-loss/take-profit trigger evaluation.
//!
//! Compares live prices against every holding's configured thresholds and
//! force-liquidates the full position on a breach. The evaluator is stateless
//! per call; an external scheduler is expected to drive it periodically.

use crate::error::{PortfolioError, Result};
use crate::ledger::record;
use crate::store::JsonStore;
use crate::types::{Holding, Transaction, TriggerKind, TxType};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of one evaluation pass, for the caller to surface as
/// notifications.
#[derive(Debug, Clone)]
pub struct TriggerReport {
    /// Liquidation transactions recorded this pass, in evaluation order.
    pub transactions: Vec<Transaction>,
    /// Holdings after the pass.
    pub portfolio: Vec<Holding>,
}

impl TriggerReport {
    /// Returns true if any trigger fired.
    #[must_use]
    pub fn fired(&self) -> bool {
        !self.transactions.is_empty()
    }
}

/// Evaluates stop-loss/take-profit thresholds against live prices.
#[derive(Debug, Clone)]
pub struct TriggerEvaluator {
    store: Arc<JsonStore>,
}

impl TriggerEvaluator {
    /// Creates an evaluator over the given store.
    #[must_use]
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// Runs one evaluation pass with the supplied prices (coin id to current
    /// price). Coins with a missing or non-finite price are skipped for this
    /// cycle, so one bad price never aborts the whole pass.
    ///
    /// Stop-loss is checked before take-profit; when both thresholds are
    /// somehow crossed in the same tick, stop-loss wins. A breach liquidates
    /// the entire position at the supplied price. All liquidations of a pass
    /// are persisted in one write, and only when at least one fired.
    ///
    /// # Errors
    /// Fails only if persisting the pass fails.
    pub async fn evaluate(&self, prices: &HashMap<String, f64>) -> Result<TriggerReport> {
        let mut txn = self.store.begin().await;

        // Snapshot so removals below cannot skip or double-process entries.
        let holdings = txn.doc.portfolio.clone();
        let mut transactions = Vec::new();

        for holding in &holdings {
            if holding.stop_loss.is_none() && holding.take_profit.is_none() {
                continue;
            }
            let Some(&price) = prices.get(&holding.coin_id) else {
                continue;
            };
            if !price.is_finite() {
                continue;
            }

            let trigger = match (holding.stop_loss, holding.take_profit) {
                (Some(stop), _) if price <= stop => TriggerKind::StopLoss,
                (_, Some(profit)) if price >= profit => TriggerKind::TakeProfit,
                _ => continue,
            };

            let pnl = (price - holding.avg_price) * holding.amount;
            let mut transaction = Transaction::new(
                TxType::Sell,
                holding.coin_id.clone(),
                holding.symbol.clone(),
                holding.name.clone(),
                holding.amount,
                price,
            );
            transaction.pnl = Some(pnl);
            transaction.trigger = Some(trigger);

            tracing::info!(
                "{} triggered for {}: liquidating {} @ {} (pnl {})",
                match trigger {
                    TriggerKind::StopLoss => "stop-loss",
                    TriggerKind::TakeProfit => "take-profit",
                },
                holding.coin_id,
                holding.amount,
                price,
                pnl
            );

            txn.doc.portfolio.retain(|h| h.coin_id != holding.coin_id);
            record(&mut txn.doc, transaction.clone());
            transactions.push(transaction);
        }

        let portfolio = txn.doc.portfolio.clone();
        if !transactions.is_empty() {
            txn.commit().await.map_err(PortfolioError::from)?;
        }

        Ok(TriggerReport {
            transactions,
            portfolio,
        })
    }
}
