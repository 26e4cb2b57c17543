//! CSV ingestion: raw export rows to a chronologically ordered record list.
//!
//! Investing.com exports are newest-first and carry more columns than the
//! engines need. Ingestion keeps `Date`, `Price` and `Change %`, sorts
//! ascending by date and rejects duplicate dates. Nothing is silently
//! skipped: the first malformed row aborts the load with its line number.

use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use super::parse::{parse_change_percent, parse_date, parse_price};
use crate::domain::DailyRecord;

pub const DATE_COLUMN: &str = "Date";
pub const PRICE_COLUMN: &str = "Price";
pub const CHANGE_COLUMN: &str = "Change %";

/// A record could not be parsed or normalized.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("invalid date '{value}'{}", at(.line))]
    InvalidDate { line: Option<u64>, value: String },

    #[error("invalid price '{value}'{}", at(.line))]
    InvalidPrice { line: Option<u64>, value: String },

    #[error("invalid change percent '{value}'{}", at(.line))]
    InvalidChange { line: Option<u64>, value: String },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn at(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" at line {l}"),
        None => String::new(),
    }
}

impl RecordError {
    /// Attach a source line to a field-level error.
    pub fn at_line(self, line: u64) -> Self {
        match self {
            RecordError::InvalidDate { value, .. } => RecordError::InvalidDate {
                line: Some(line),
                value,
            },
            RecordError::InvalidPrice { value, .. } => RecordError::InvalidPrice {
                line: Some(line),
                value,
            },
            RecordError::InvalidChange { value, .. } => RecordError::InvalidChange {
                line: Some(line),
                value,
            },
            other => other,
        }
    }

    /// Source line of the offending row, if known.
    pub fn line(&self) -> Option<u64> {
        match self {
            RecordError::InvalidDate { line, .. }
            | RecordError::InvalidPrice { line, .. }
            | RecordError::InvalidChange { line, .. } => *line,
            _ => None,
        }
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    price: usize,
    change: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, RecordError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| normalize_header(h).eq_ignore_ascii_case(name))
                .ok_or(RecordError::MissingColumn(name))
        };
        Ok(Self {
            date: find(DATE_COLUMN)?,
            price: find(PRICE_COLUMN)?,
            change: find(CHANGE_COLUMN)?,
        })
    }
}

fn normalize_header(h: &str) -> &str {
    h.trim_start_matches('\u{feff}').trim()
}

fn parse_row(row: &csv::StringRecord, columns: ColumnMap) -> Result<DailyRecord, RecordError> {
    let field = |idx: usize| row.get(idx).unwrap_or("");
    let date = parse_date(field(columns.date))?;
    let price = parse_price(field(columns.price))?;
    let change = parse_change_percent(field(columns.change))?;
    DailyRecord::new(date, price, change)
}

/// Read records from any CSV source, returning them in ascending date order.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<DailyRecord>, RecordError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::resolve(rdr.headers()?)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(parse_row(&row, columns).map_err(|e| e.at_line(line))?);
    }

    canonicalize(records)
}

/// Read records from a CSV file on disk.
pub fn read_records_from_path(path: &Path) -> Result<Vec<DailyRecord>, RecordError> {
    let file = File::open(path)?;
    let records = read_records(file)?;
    tracing::debug!(path = %path.display(), records = records.len(), "parsed CSV");
    Ok(records)
}

/// Sort ascending by date and reject duplicates.
///
/// The sort is stable, so already-ordered input is returned unchanged.
pub fn canonicalize(mut records: Vec<DailyRecord>) -> Result<Vec<DailyRecord>, RecordError> {
    records.sort_by_key(|r| r.date);
    if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(RecordError::DuplicateDate(pair[1].date));
    }
    Ok(records)
}

/// True when dates are strictly increasing.
pub fn is_chronological(records: &[DailyRecord]) -> bool {
    records.windows(2).all(|w| w[0].date < w[1].date)
}
