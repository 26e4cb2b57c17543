//! DipSweep Runner — sweep orchestration, configuration, data loading, export.
//!
//! This crate builds on `dipsweep-core` to provide:
//! - Data loading from CSV with a tagged synthetic fallback
//! - Threshold grids and the parallel parameter sweep with stable ranking
//! - TOML configuration for both strategies
//! - CSV / JSON / console reporting

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{BuySellConfig, ConfigError, DataConfig, OutputConfig, ReinvestConfig, SweepConfig};
pub use data_loader::{load_records, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{format_summary, format_table, load_manifest, save_artifacts};
pub use runner::{run_buy_sell, run_config, run_reinvest, RunError, StrategyOutcome, SweepReport};
pub use sweep::{ParamSweep, SweepError, SweepResults, ThresholdGrid, MAX_GRID_POINTS};
