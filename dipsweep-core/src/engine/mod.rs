//! Simulation engines.
//!
//! Both engines share one shape: walk an ascending slice of daily records,
//! apply a threshold-parameterized rule per day, return a small summary.
//! [`ThresholdEngine`] is the seam the sweep drives; [`Ranked`] is what the
//! sweep sorts by.

pub mod buy_sell;
pub mod observer;
pub mod reinvest;

pub use buy_sell::{roi_percent, simulate_buy_sell, BuySellEngine, BuySellResult};
pub use observer::{DayEvent, DayObserver, NoopObserver, TraceRecorder, TracingObserver};
pub use reinvest::{simulate_reinvestment, ReinvestEngine, ReinvestResult, ReinvestmentState};

use crate::domain::DailyRecord;

/// A result row that can be ranked by a single return metric.
pub trait Ranked {
    /// Threshold the row was produced with.
    fn threshold(&self) -> f64;

    /// Return metric in percent; higher is better.
    fn score(&self) -> f64;
}

/// An engine with fixed parameters, evaluated once per threshold.
///
/// Implementations must be pure: the same records and threshold always give
/// the same output, and no state is shared between calls.
pub trait ThresholdEngine: Send + Sync {
    type Output: Ranked + Send;

    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        records: &[DailyRecord],
        threshold: f64,
        observer: &mut dyn DayObserver,
    ) -> Self::Output;
}
