//! DipSweep Core — domain types, CSV ingestion, and the two threshold engines.
//!
//! This crate contains the decision logic:
//! - Domain types (daily records, portfolio, transactions)
//! - Investing.com-style CSV parsing into ascending daily records
//! - Reinvestment engine (compounding with a threshold-triggered top-up)
//! - Buy/sell engine (buy on dips, withdraw cash after rallies)
//! - Day observer hook for per-day traces

pub mod data;
pub mod domain;
pub mod engine;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result and parameter types can cross rayon workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DailyRecord>();
        require_sync::<domain::DailyRecord>();
        require_send::<domain::Portfolio>();
        require_sync::<domain::Portfolio>();
        require_send::<domain::Transaction>();
        require_sync::<domain::Transaction>();

        require_send::<engine::ReinvestEngine>();
        require_sync::<engine::ReinvestEngine>();
        require_send::<engine::ReinvestResult>();
        require_sync::<engine::ReinvestResult>();
        require_send::<engine::BuySellEngine>();
        require_sync::<engine::BuySellEngine>();
        require_send::<engine::BuySellResult>();
        require_sync::<engine::BuySellResult>();
        require_send::<engine::DayEvent>();
        require_sync::<engine::DayEvent>();

        require_send::<data::RecordError>();
        require_sync::<data::RecordError>();
    }

    /// Architecture contract: engines take the observer by `&mut dyn`, so a
    /// caller can always substitute its own without touching the engine.
    #[test]
    fn engines_accept_trait_object_observers() {
        fn _check<E: engine::ThresholdEngine>(
            e: &E,
            records: &[domain::DailyRecord],
            obs: &mut dyn engine::DayObserver,
        ) -> E::Output {
            e.evaluate(records, 0.0, obs)
        }
    }
}
