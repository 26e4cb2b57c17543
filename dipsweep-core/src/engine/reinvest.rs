//! Reinvestment engine — daily compounding with a threshold-triggered top-up.
//!
//! Each day the running value compounds by that day's change. When the change
//! is strictly below the threshold, a fixed increment is added *after* the
//! compounding step. Gain is measured against everything contributed, not
//! just the initial stake.

use serde::{Deserialize, Serialize};

use super::observer::{DayEvent, DayObserver, NoopObserver};
use super::{Ranked, ThresholdEngine};
use crate::domain::DailyRecord;

pub const DEFAULT_INCREMENT: f64 = 100.0;
pub const DEFAULT_INITIAL_INVESTMENT: f64 = 10_000.0;

/// Running totals for one simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReinvestmentState {
    pub investment_value: f64,
    pub contributed_increment: f64,
}

impl ReinvestmentState {
    pub fn new(initial_investment: f64) -> Self {
        Self {
            investment_value: initial_investment,
            contributed_increment: 0.0,
        }
    }

    /// Apply one day. Returns true if the increment was injected.
    pub fn apply_day(&mut self, change_pct: f64, threshold: f64, increment: f64) -> bool {
        self.investment_value *= 1.0 + change_pct;
        if change_pct < threshold {
            self.investment_value += increment;
            self.contributed_increment += increment;
            true
        } else {
            false
        }
    }
}

/// Outcome of one reinvestment run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReinvestResult {
    pub threshold: f64,
    pub final_investment_value: f64,
    pub contributed_increment: f64,
    /// Percent gain over `initial_investment + contributed_increment`.
    pub percent_gain: f64,
}

impl Ranked for ReinvestResult {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn score(&self) -> f64 {
        self.percent_gain
    }
}

/// Fixed parameters of the reinvestment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReinvestEngine {
    pub increment: f64,
    pub initial_investment: f64,
}

impl Default for ReinvestEngine {
    fn default() -> Self {
        Self {
            increment: DEFAULT_INCREMENT,
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
        }
    }
}

impl ReinvestEngine {
    pub fn new(increment: f64, initial_investment: f64) -> Self {
        Self {
            increment,
            initial_investment,
        }
    }

    /// Simulate over `records` (ascending by date) at one threshold.
    pub fn run(
        &self,
        records: &[DailyRecord],
        threshold: f64,
        observer: &mut dyn DayObserver,
    ) -> ReinvestResult {
        let mut state = ReinvestmentState::new(self.initial_investment);

        for (index, record) in records.iter().enumerate() {
            state.apply_day(record.change_pct, threshold, self.increment);
            observer.on_day(&DayEvent {
                index,
                date: record.date,
                value: state.investment_value,
            });
        }

        let contributed = self.initial_investment + state.contributed_increment;
        let percent_gain = (state.investment_value / contributed - 1.0) * 100.0;

        ReinvestResult {
            threshold,
            final_investment_value: state.investment_value,
            contributed_increment: state.contributed_increment,
            percent_gain,
        }
    }
}

impl ThresholdEngine for ReinvestEngine {
    type Output = ReinvestResult;

    fn name(&self) -> &'static str {
        "reinvest"
    }

    fn evaluate(
        &self,
        records: &[DailyRecord],
        threshold: f64,
        observer: &mut dyn DayObserver,
    ) -> ReinvestResult {
        self.run(records, threshold, observer)
    }
}

/// Convenience wrapper without an observer.
pub fn simulate_reinvestment(
    records: &[DailyRecord],
    threshold: f64,
    increment: f64,
    initial_investment: f64,
) -> ReinvestResult {
    ReinvestEngine::new(increment, initial_investment).run(records, threshold, &mut NoopObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::observer::TraceRecorder;
    use chrono::NaiveDate;

    fn records(changes: &[f64]) -> Vec<DailyRecord> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        changes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                DailyRecord::new(base + chrono::Duration::days(i as i64), 100.0, c).unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_sequence_is_neutral() {
        let r = simulate_reinvestment(&[], 0.0, 100.0, 10_000.0);
        assert_eq!(r.final_investment_value, 10_000.0);
        assert_eq!(r.contributed_increment, 0.0);
        assert_eq!(r.percent_gain, 0.0);
    }

    #[test]
    fn two_day_scenario() {
        let recs = records(&[-0.01, 0.02]);
        let r = simulate_reinvestment(&recs, 0.0, 100.0, 10_000.0);
        // day 1: 10000 * 0.99 + 100 = 10000; day 2: 10000 * 1.02 = 10200
        assert!((r.final_investment_value - 10_200.0).abs() < 1e-9);
        assert_eq!(r.contributed_increment, 100.0);
        let expected = (10_200.0 / 10_100.0 - 1.0) * 100.0;
        assert!((r.percent_gain - expected).abs() < 1e-9);
        assert!((r.percent_gain - 0.990099).abs() < 1e-6);
    }

    #[test]
    fn increment_applied_after_compounding() {
        // Compounding first: 10000 * 0.5 + 100 = 5100 (not (10000 + 100) * 0.5).
        let recs = records(&[-0.5]);
        let r = simulate_reinvestment(&recs, 0.0, 100.0, 10_000.0);
        assert_eq!(r.final_investment_value, 5_100.0);
    }

    #[test]
    fn change_equal_to_threshold_does_not_inject() {
        let recs = records(&[0.01]);
        let r = simulate_reinvestment(&recs, 0.01, 100.0, 10_000.0);
        assert_eq!(r.contributed_increment, 0.0);
        assert!((r.final_investment_value - 10_100.0).abs() < 1e-9);
        assert!((r.percent_gain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn observer_sees_value_after_each_update() {
        let recs = records(&[-0.01, 0.02]);
        let mut trace = TraceRecorder::new();
        ReinvestEngine::new(100.0, 10_000.0).run(&recs, 0.0, &mut trace);
        assert_eq!(trace.events.len(), 2);
        assert!((trace.events[0].value - 10_000.0).abs() < 1e-9);
        assert!((trace.events[1].value - 10_200.0).abs() < 1e-9);
        assert_eq!(trace.events[1].date, recs[1].date);
    }

    #[test]
    fn state_reports_injection() {
        let mut s = ReinvestmentState::new(1_000.0);
        assert!(s.apply_day(-0.02, -0.01, 50.0));
        assert!(!s.apply_day(0.0, -0.01, 50.0));
        assert_eq!(s.contributed_increment, 50.0);
    }

    #[test]
    fn ranked_by_percent_gain() {
        let r = simulate_reinvestment(&records(&[0.1]), 0.0, 100.0, 1_000.0);
        assert_eq!(r.threshold(), 0.0);
        assert!((r.score() - 10.0).abs() < 1e-9);
    }
}
