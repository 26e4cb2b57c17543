//! Buy/sell engine — buy a fixed amount on every down day, withdraw cash the
//! day after a rally.
//!
//! The sell rule looks at the *previous* day's change: a rally on day `i-1`
//! triggers a sale at day `i`'s price. Sales are capped at current holdings,
//! so the position never goes short.

use serde::{Deserialize, Serialize};

use super::observer::{DayEvent, DayObserver, NoopObserver};
use super::{Ranked, ThresholdEngine};
use crate::domain::{DailyRecord, Portfolio, Transaction};

pub const DEFAULT_BUY_AMOUNT: f64 = 300.0;
pub const DEFAULT_SELL_AMOUNT: f64 = 1_000.0;

/// Outcome of one buy/sell run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuySellResult {
    pub threshold: f64,
    pub total_investment: f64,
    pub final_value: f64,
    /// Percent return on `total_investment`; 0 when nothing was invested.
    pub roi: f64,
    pub final_shares: f64,
    pub cash_withdrawn: f64,
    pub num_buys: usize,
    pub num_sells: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<Transaction>,
}

impl Ranked for BuySellResult {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self) -> f64 {
        self.roi
    }
}

/// Return on investment in percent.
///
/// A run that never bought anything has no capital at risk; its ROI is
/// defined as 0 rather than left undefined.
pub fn roi_percent(final_value: f64, total_investment: f64) -> f64 {
    if total_investment > 0.0 {
        (final_value - total_investment) / total_investment * 100.0
    } else {
        0.0
    }
}

/// Fixed parameters of the buy/sell strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuySellEngine {
    pub buy_amount: f64,
    pub sell_amount: f64,
}

impl Default for BuySellEngine {
    fn default() -> Self {
        Self {
            buy_amount: DEFAULT_BUY_AMOUNT,
            sell_amount: DEFAULT_SELL_AMOUNT,
        }
    }
}

impl BuySellEngine {
    pub fn new(buy_amount: f64, sell_amount: f64) -> Self {
        Self {
            buy_amount,
            sell_amount,
        }
    }

    /// Simulate over `records` (ascending by date) at one sell threshold.
    pub fn run(
        &self,
        records: &[DailyRecord],
        sell_threshold: f64,
        observer: &mut dyn DayObserver,
    ) -> BuySellResult {
        let mut portfolio = Portfolio::new();

        for (i, record) in records.iter().enumerate() {
            if record.is_down_day() {
                portfolio.buy(record.date, self.buy_amount, record.price);
            }

            if i > 0 && records[i - 1].change_pct > sell_threshold {
                portfolio.sell(record.date, self.sell_amount, record.price);
            }

            observer.on_day(&DayEvent {
                index: i,
                date: record.date,
                value: portfolio.market_value(record.price),
            });
        }

        let final_value = records
            .last()
            .map(|last| portfolio.market_value(last.price))
            .unwrap_or(portfolio.cash);
        let total_investment = portfolio.total_invested();

        BuySellResult {
            threshold: sell_threshold,
            total_investment,
            final_value,
            roi: roi_percent(final_value, total_investment),
            final_shares: portfolio.shares,
            cash_withdrawn: portfolio.cash,
            num_buys: portfolio.buy_count(),
            num_sells: portfolio.sell_count(),
            transactions: portfolio.transactions,
        }
    }
}

impl ThresholdEngine for BuySellEngine {
    type Output = BuySellResult;

    fn name(&self) -> &'static str {
        "buy_sell"
    }

    fn evaluate(
        &self,
        records: &[DailyRecord],
        threshold: f64,
        observer: &mut dyn DayObserver,
    ) -> BuySellResult {
        self.run(records, threshold, observer)
    }
}

/// Convenience wrapper without an observer.
pub fn simulate_buy_sell(
    records: &[DailyRecord],
    sell_threshold: f64,
    buy_amount: f64,
    sell_amount: f64,
) -> BuySellResult {
    BuySellEngine::new(buy_amount, sell_amount).run(records, sell_threshold, &mut NoopObserver)
}
