//! Data ingestion and field parsing

pub mod ingest;
pub mod parse;

pub use ingest::{
    canonicalize, is_chronological, read_records, read_records_from_path, RecordError,
};
pub use parse::{parse_change_percent, parse_date, parse_price, snap_fraction, FRACTION_DECIMALS};
