//! Sweep runner — wires together data loading, engines, and ranking.
//!
//! Entry points:
//! - `run_reinvest()` / `run_buy_sell()`: take pre-loaded data and one strategy config.
//! - `run_config()`: loads data once from a `SweepConfig`, then runs every
//!   configured strategy. Used by the CLI's `run` command.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dipsweep_core::engine::{BuySellEngine, BuySellResult, ReinvestEngine, ReinvestResult};

use crate::config::{BuySellConfig, ConfigError, ReinvestConfig, SweepConfig};
use crate::data_loader::{load_records, LoadError, LoadOptions, LoadedData};
use crate::sweep::{ParamSweep, SweepError, SweepResults};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("sweep error: {0}")]
    Sweep(#[from] SweepError),
}

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

/// Sweep rows for one strategy, with the fixed parameters that produced them.
///
/// `results` keeps grid order for export and the ranking for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Reinvest {
        params: ReinvestEngine,
        results: SweepResults<ReinvestResult>,
    },
    BuySell {
        params: BuySellEngine,
        results: SweepResults<BuySellResult>,
    },
}

/// Complete result of one strategy sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub record_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub outcome: StrategyOutcome,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SweepReport {
    fn new(symbol: &str, data: &LoadedData, outcome: StrategyOutcome) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: symbol.to_string(),
            dataset_hash: data.dataset_hash.clone(),
            has_synthetic: data.has_synthetic,
            record_count: data.records.len(),
            first_date: data.first_date(),
            last_date: data.last_date(),
            outcome,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self.outcome {
            StrategyOutcome::Reinvest { .. } => "reinvest",
            StrategyOutcome::BuySell { .. } => "buy_sell",
        }
    }

    pub fn row_count(&self) -> usize {
        match &self.outcome {
            StrategyOutcome::Reinvest { results, .. } => results.len(),
            StrategyOutcome::BuySell { results, .. } => results.len(),
        }
    }

    /// `(threshold, score)` of the top-ranked row.
    pub fn best(&self) -> Option<(f64, f64)> {
        match &self.outcome {
            StrategyOutcome::Reinvest { results, .. } => {
                results.best().map(|r| (r.threshold, r.percent_gain))
            }
            StrategyOutcome::BuySell { results, .. } => {
                results.best().map(|r| (r.threshold, r.roi))
            }
        }
    }
}

/// Sweep the reinvestment engine over `config.thresholds`.
pub fn run_reinvest(
    symbol: &str,
    data: &LoadedData,
    config: &ReinvestConfig,
    sweep: &ParamSweep,
) -> Result<SweepReport, RunError> {
    let engine = config.engine();
    let results = sweep.sweep(&engine, &data.records, &config.thresholds)?;
    let best = results.best().map(|r| (r.threshold, r.percent_gain));
    log_best(symbol, "reinvest", results.len(), best);

    Ok(SweepReport::new(
        symbol,
        data,
        StrategyOutcome::Reinvest {
            params: engine,
            results,
        },
    ))
}

/// Sweep the buy/sell engine over `config.thresholds`.
///
/// Only the best row keeps its transaction tape.
pub fn run_buy_sell(
    symbol: &str,
    data: &LoadedData,
    config: &BuySellConfig,
    sweep: &ParamSweep,
) -> Result<SweepReport, RunError> {
    let engine = config.engine();
    let results = sweep.sweep(&engine, &data.records, &config.thresholds)?;
    let best = results.best().map(|r| (r.threshold, r.roi));
    log_best(symbol, "buy_sell", results.len(), best);

    let best_idx = results.best_index();
    let rows: Vec<BuySellResult> = results
        .into_rows()
        .into_iter()
        .enumerate()
        .map(|(idx, mut row)| {
            if Some(idx) != best_idx {
                row.transactions.clear();
            }
            row
        })
        .collect();

    Ok(SweepReport::new(
        symbol,
        data,
        StrategyOutcome::BuySell {
            params: engine,
            results: SweepResults::new(rows),
        },
    ))
}

fn log_best(symbol: &str, strategy: &str, evaluated: usize, best: Option<(f64, f64)>) {
    match best {
        Some((threshold, score)) => tracing::info!(
            symbol,
            strategy,
            evaluated,
            best_threshold = threshold,
            best_score = score,
            "sweep complete"
        ),
        None => tracing::info!(symbol, strategy, evaluated, "sweep complete (no rows)"),
    }
}

/// Load data once and run every strategy present in `config`.
///
/// Reports come back in a fixed order: reinvest first, then buy/sell.
pub fn run_config(config: &SweepConfig) -> Result<Vec<SweepReport>, RunError> {
    config.validate()?;
    let symbol = config.symbol();
    let data = load_records(&LoadOptions {
        path: config.data.path.clone(),
        symbol: symbol.clone(),
        synthetic: config.data.synthetic,
    })?;

    let sweep = config.output.param_sweep();
    let mut reports = Vec::new();
    if let Some(reinvest) = &config.reinvest {
        reports.push(run_reinvest(&symbol, &data, reinvest, &sweep)?);
    }
    if let Some(buy_sell) = &config.buy_sell {
        reports.push(run_buy_sell(&symbol, &data, buy_sell, &sweep)?);
    }
    Ok(reports)
}
