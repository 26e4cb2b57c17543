//! Day observers — the per-day trace hook.
//!
//! Engines never print. After each day's update they hand a [`DayEvent`] to
//! whatever observer the caller supplied: nothing, a recorder, a closure, or
//! the `tracing` bridge.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// State snapshot after one day's update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayEvent {
    pub index: usize,
    pub date: NaiveDate,
    /// Investment value (reinvestment) or mark-to-market portfolio value (buy/sell).
    pub value: f64,
}

pub trait DayObserver {
    fn on_day(&mut self, event: &DayEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DayObserver for NoopObserver {
    fn on_day(&mut self, _event: &DayEvent) {}
}

/// Collects every event in order.
#[derive(Debug, Default, Clone)]
pub struct TraceRecorder {
    pub events: Vec<DayEvent>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.value).collect()
    }
}

impl DayObserver for TraceRecorder {
    fn on_day(&mut self, event: &DayEvent) {
        self.events.push(*event);
    }
}

/// Emits each day at `TRACE` level, tagged with the threshold under test.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    pub threshold: f64,
}

impl TracingObserver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl DayObserver for TracingObserver {
    fn on_day(&mut self, event: &DayEvent) {
        tracing::trace!(
            threshold = self.threshold,
            date = %event.date,
            value = event.value,
            "day"
        );
    }
}

impl<F> DayObserver for F
where
    F: FnMut(&DayEvent),
{
    fn on_day(&mut self, event: &DayEvent) {
        self(event)
    }
}
