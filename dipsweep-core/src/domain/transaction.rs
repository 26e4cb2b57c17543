//! Transaction — one buy or sell event on the audit tape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// A recorded cash/share exchange.
///
/// For a buy, `amount` is the cash spent. For a sell, it is the cash obtained,
/// which may be less than the requested sell amount when holdings run short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub amount: f64,
    pub shares: f64,
}

impl Transaction {
    pub fn is_buy(&self) -> bool {
        self.action == TradeAction::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.action == TradeAction::Sell
    }

    /// Execution price implied by amount and share count.
    pub fn price(&self) -> Option<f64> {
        if self.shares == 0.0 {
            None
        } else {
            Some(self.amount / self.shares)
        }
    }
}
