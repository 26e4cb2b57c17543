//! Domain types for DipSweep

pub mod portfolio;
pub mod record;
pub mod transaction;

pub use portfolio::Portfolio;
pub use record::DailyRecord;
pub use transaction::{TradeAction, Transaction};
