//! DailyRecord — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::RecordError;

/// Price and change for a single trading day.
///
/// `change_pct` is a signed fraction (`-0.0018` for `-0.18%`) taken from the
/// source data. It is never recomputed from consecutive prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub change_pct: f64,
}

impl DailyRecord {
    /// Build a validated record. Price must be finite and positive, change finite.
    pub fn new(date: NaiveDate, price: f64, change_pct: f64) -> Result<Self, RecordError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(RecordError::InvalidPrice {
                line: None,
                value: price.to_string(),
            });
        }
        if !change_pct.is_finite() {
            return Err(RecordError::InvalidChange {
                line: None,
                value: change_pct.to_string(),
            });
        }
        Ok(Self {
            date,
            price,
            change_pct,
        })
    }

    /// Whether the day closed lower than the previous one.
    pub fn is_down_day(&self) -> bool {
        self.change_pct < 0.0
    }
}
