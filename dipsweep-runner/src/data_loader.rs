//! Record loading and data resolution for the runner.
//!
//! Given a CSV path, loads and canonicalizes daily records. Fallback policy:
//! 1. If the file exists → parse it (parse errors are fatal, never masked)
//! 2. If it is missing and `synthetic` is set → generate a synthetic series (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode. Reports built on it carry
//! `has_synthetic = true`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use dipsweep_core::data::{read_records_from_path, RecordError};
use dipsweep_core::domain::DailyRecord;

/// First date of a synthetic series.
const SYNTHETIC_START: (i32, u32, u32) = (2020, 1, 2);

/// Trading days in a synthetic series (about two years).
const SYNTHETIC_DAYS: usize = 504;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {} (use --synthetic for synthetic data)", .path.display())]
    NotFound { path: PathBuf },

    #[error("malformed record in {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
}

/// Where the records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Options controlling how records are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub path: PathBuf,
    /// Seeds the synthetic series; otherwise only used for labelling.
    pub symbol: String,
    /// Generate synthetic records when `path` does not exist.
    pub synthetic: bool,
}

/// Loaded records plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Ascending by date, no duplicates.
    pub records: Vec<DailyRecord>,
    pub source: DataSource,
    /// BLAKE3 over dates, prices and changes.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

impl LoadedData {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }
}

/// Load records for one data file, with synthetic fallback.
pub fn load_records(opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let (records, source) = if opts.path.exists() {
        let records =
            read_records_from_path(&opts.path).map_err(|source| LoadError::Malformed {
                path: opts.path.clone(),
                source,
            })?;
        tracing::info!(
            path = %opts.path.display(),
            records = records.len(),
            "loaded price history"
        );
        (records, DataSource::Csv)
    } else if opts.synthetic {
        tracing::warn!(
            symbol = %opts.symbol,
            "generating synthetic data; results will be tagged as synthetic"
        );
        (generate_synthetic_records(&opts.symbol), DataSource::Synthetic)
    } else {
        return Err(LoadError::NotFound {
            path: opts.path.clone(),
        });
    };

    if records.len() < 2 {
        tracing::warn!(
            records = records.len(),
            "fewer than two records; the sell rule can never fire"
        );
    }

    let dataset_hash = compute_dataset_hash(&records);
    Ok(LoadedData {
        records,
        source,
        dataset_hash,
        has_synthetic: source == DataSource::Synthetic,
    })
}

/// Wrap already-parsed records (e.g. from tests or another loader).
pub fn from_records(records: Vec<DailyRecord>) -> LoadedData {
    let dataset_hash = compute_dataset_hash(&records);
    LoadedData {
        records,
        source: DataSource::Csv,
        dataset_hash,
        has_synthetic: false,
    }
}

/// Compute a deterministic BLAKE3 hash over all record data.
fn compute_dataset_hash(records: &[DailyRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    for r in records {
        hasher.update(r.date.to_string().as_bytes());
        hasher.update(&r.price.to_le_bytes());
        hasher.update(&r.change_pct.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic records for testing/development.
///
/// A weekday-only random walk from 100.0 with daily changes in ±3%. The
/// change column is consistent with the price path.
pub fn generate_synthetic_records(symbol: &str) -> Vec<DailyRecord> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let (y, m, d) = SYNTHETIC_START;
    let mut current = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    let mut price = 100.0_f64;
    let mut records = Vec::with_capacity(SYNTHETIC_DAYS);

    while records.len() < SYNTHETIC_DAYS {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let change: f64 = rng.gen_range(-0.03..0.03);
            price *= 1.0 + change;
            records.push(DailyRecord {
                date: current,
                price,
                change_pct: change,
            });
        }
        current += chrono::Duration::days(1);
    }

    records
}
