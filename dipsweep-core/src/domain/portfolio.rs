//! Portfolio — withdrawn cash plus a single fractional share position.

use chrono::NaiveDate;

use super::transaction::{TradeAction, Transaction};

/// State of one buy/sell simulation run.
///
/// `cash` only ever grows: buys are funded externally, sells add proceeds.
/// `shares` never goes negative because sells are capped at current holdings.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    pub cash: f64,
    pub shares: f64,
    pub transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend `amount` of external cash on shares at `price`. Returns shares bought.
    pub fn buy(&mut self, date: NaiveDate, amount: f64, price: f64) -> f64 {
        let shares = amount / price;
        self.shares += shares;
        self.transactions.push(Transaction {
            date,
            action: TradeAction::Buy,
            amount,
            shares,
        });
        shares
    }

    /// Sell up to `amount` worth of shares at `price`, capped at holdings.
    /// Returns shares sold.
    pub fn sell(&mut self, date: NaiveDate, amount: f64, price: f64) -> f64 {
        let shares = (amount / price).min(self.shares);
        self.shares -= shares;
        let proceeds = shares * price;
        self.cash += proceeds;
        self.transactions.push(Transaction {
            date,
            action: TradeAction::Sell,
            amount: proceeds,
            shares,
        });
        shares
    }

    /// Mark-to-market value: shares at `price` plus withdrawn cash.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price + self.cash
    }

    /// Sum of all buy amounts.
    pub fn total_invested(&self) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.is_buy())
            .map(|t| t.amount)
            .sum()
    }

    pub fn buy_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_buy()).count()
    }

    pub fn sell_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_sell()).count()
    }
}
