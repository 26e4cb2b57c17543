//! Serializable sweep configuration (TOML).
//!
//! ```toml
//! [data]
//! path = "VOOG_2024.csv"
//!
//! [reinvest]
//! initial_investment = 10000.0
//! increment = 100.0
//! thresholds = { start = -0.02, end = 0.02, step = 0.0001 }
//!
//! [buy_sell]
//! buy_amount = 300.0
//! sell_amount = 1000.0
//! thresholds = [0.005, 0.01, 0.015]
//!
//! [output]
//! dir = "results"
//! trace_days = false
//! ```
//!
//! Every amount and grid is explicit; omitted fields take the defaults shown.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use dipsweep_core::engine::buy_sell::{DEFAULT_BUY_AMOUNT, DEFAULT_SELL_AMOUNT};
use dipsweep_core::engine::reinvest::{DEFAULT_INCREMENT, DEFAULT_INITIAL_INVESTMENT};
use dipsweep_core::engine::{BuySellEngine, ReinvestEngine};

use crate::sweep::{ParamSweep, SweepError, ThresholdGrid};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid {section} thresholds: {source}")]
    Grid {
        section: &'static str,
        #[source]
        source: SweepError,
    },
}

/// Top-level configuration for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepConfig {
    pub data: DataConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinvest: Option<ReinvestConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_sell: Option<BuySellConfig>,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the price history comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// CSV export path.
    pub path: PathBuf,

    /// Name used in reports and output file names. Defaults to the file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Fall back to a synthetic series when `path` does not exist.
    #[serde(default)]
    pub synthetic: bool,
}

/// Reinvestment strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReinvestConfig {
    #[serde(default = "default_initial_investment")]
    pub initial_investment: f64,

    #[serde(default = "default_increment")]
    pub increment: f64,

    #[serde(default = "ThresholdGrid::reinvest_default")]
    pub thresholds: ThresholdGrid,
}

impl Default for ReinvestConfig {
    fn default() -> Self {
        Self {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            increment: DEFAULT_INCREMENT,
            thresholds: ThresholdGrid::reinvest_default(),
        }
    }
}

impl ReinvestConfig {
    pub fn engine(&self) -> ReinvestEngine {
        ReinvestEngine::new(self.increment, self.initial_investment)
    }
}

/// Buy/sell strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuySellConfig {
    #[serde(default = "default_buy_amount")]
    pub buy_amount: f64,

    #[serde(default = "default_sell_amount")]
    pub sell_amount: f64,

    #[serde(default = "ThresholdGrid::buy_sell_default")]
    pub thresholds: ThresholdGrid,
}

impl Default for BuySellConfig {
    fn default() -> Self {
        Self {
            buy_amount: DEFAULT_BUY_AMOUNT,
            sell_amount: DEFAULT_SELL_AMOUNT,
            thresholds: ThresholdGrid::buy_sell_default(),
        }
    }
}

impl BuySellConfig {
    pub fn engine(&self) -> BuySellEngine {
        BuySellEngine::new(self.buy_amount, self.sell_amount)
    }
}

/// Output and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Evaluate thresholds on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Rows shown in the console table (all rows are always exported).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,

    /// Also export the transaction tape of the best buy/sell threshold.
    #[serde(default)]
    pub transactions: bool,

    /// Emit every simulated day as a `TRACE` event.
    #[serde(default)]
    pub trace_days: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            parallel: true,
            top: None,
            transactions: false,
            trace_days: false,
        }
    }
}

impl OutputConfig {
    /// Sweep executor for these execution settings.
    pub fn param_sweep(&self) -> ParamSweep {
        ParamSweep::new()
            .with_parallelism(self.parallel)
            .with_day_trace(self.trace_days)
    }
}

fn default_initial_investment() -> f64 {
    DEFAULT_INITIAL_INVESTMENT
}

fn default_increment() -> f64 {
    DEFAULT_INCREMENT
}

fn default_buy_amount() -> f64 {
    DEFAULT_BUY_AMOUNT
}

fn default_sell_amount() -> f64 {
    DEFAULT_SELL_AMOUNT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_true() -> bool {
    true
}

impl SweepConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SweepConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Display name: explicit symbol, else the data file stem.
    pub fn symbol(&self) -> String {
        self.data.symbol.clone().unwrap_or_else(|| {
            self.data
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "data".to_string())
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reinvest.is_none() && self.buy_sell.is_none() {
            return Err(ConfigError::Invalid(
                "at least one of [reinvest] or [buy_sell] must be configured".into(),
            ));
        }

        if let Some(r) = &self.reinvest {
            if !(r.initial_investment.is_finite() && r.initial_investment > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "reinvest.initial_investment must be positive, got {}",
                    r.initial_investment
                )));
            }
            if !(r.increment.is_finite() && r.increment >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "reinvest.increment must be non-negative, got {}",
                    r.increment
                )));
            }
            r.thresholds
                .validate()
                .map_err(|source| ConfigError::Grid {
                    section: "reinvest",
                    source,
                })?;
        }

        if let Some(b) = &self.buy_sell {
            if !(b.buy_amount.is_finite() && b.buy_amount > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "buy_sell.buy_amount must be positive, got {}",
                    b.buy_amount
                )));
            }
            if !(b.sell_amount.is_finite() && b.sell_amount > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "buy_sell.sell_amount must be positive, got {}",
                    b.sell_amount
                )));
            }
            b.thresholds
                .validate()
                .map_err(|source| ConfigError::Grid {
                    section: "buy_sell",
                    source,
                })?;
        }

        if self.output.top == Some(0) {
            return Err(ConfigError::Invalid("output.top must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_takes_defaults() {
        let config = SweepConfig::from_toml(
            r#"
            [data]
            path = "VOOG_2024.csv"

            [reinvest]
            [buy_sell]
            "#,
        )
        .unwrap();

        assert_eq!(config.symbol(), "VOOG_2024");
        assert_eq!(config.reinvest, Some(ReinvestConfig::default()));
        assert_eq!(config.buy_sell, Some(BuySellConfig::default()));
        assert_eq!(config.output, OutputConfig::default());
        assert!(!config.data.synthetic);
    }

    #[test]
    fn threshold_range_and_list_forms() {
        let config = SweepConfig::from_toml(
            r#"
            [data]
            path = "spy.csv"
            symbol = "SPY"

            [reinvest]
            increment = 250.0
            thresholds = { start = -0.01, end = 0.01, step = 0.001 }

            [buy_sell]
            thresholds = [0.01, 0.02]
            "#,
        )
        .unwrap();

        assert_eq!(config.symbol(), "SPY");
        let reinvest = config.reinvest.unwrap();
        assert_eq!(reinvest.increment, 250.0);
        assert_eq!(reinvest.initial_investment, 10_000.0);
        assert_eq!(reinvest.thresholds.len().unwrap(), 20);
        assert_eq!(
            config.buy_sell.unwrap().thresholds,
            ThresholdGrid::List(vec![0.01, 0.02])
        );
    }

    #[test]
    fn output_section_drives_the_sweep() {
        let config = SweepConfig::from_toml(
            r#"
            [data]
            path = "spy.csv"

            [buy_sell]

            [output]
            parallel = false
            trace_days = true
            "#,
        )
        .unwrap();

        assert!(config.output.trace_days);
        let sweep = config.output.param_sweep();
        assert!(!sweep.is_parallel());
        assert!(sweep.traces_days());

        let defaults = OutputConfig::default().param_sweep();
        assert!(defaults.is_parallel());
        assert!(!defaults.traces_days());
    }

    #[test]
    fn requires_a_strategy() {
        let err = SweepConfig::from_toml("[data]\npath = \"x.csv\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_amounts() {
        let err = SweepConfig::from_toml(
            "[data]\npath = \"x.csv\"\n[reinvest]\ninitial_investment = 0.0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("initial_investment"));

        let err = SweepConfig::from_toml(
            "[data]\npath = \"x.csv\"\n[buy_sell]\nsell_amount = -5.0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("sell_amount"));
    }

    #[test]
    fn rejects_bad_grid() {
        let err = SweepConfig::from_toml(
            "[data]\npath = \"x.csv\"\n[buy_sell]\nthresholds = []\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Grid {
                section: "buy_sell",
                source: SweepError::EmptyList
            }
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = SweepConfig::from_toml("[data\npath = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let config = SweepConfig {
            data: DataConfig {
                path: PathBuf::from("voog.csv"),
                symbol: Some("VOOG".into()),
                synthetic: true,
            },
            reinvest: Some(ReinvestConfig::default()),
            buy_sell: Some(BuySellConfig::default()),
            output: OutputConfig {
                top: Some(5),
                ..OutputConfig::default()
            },
        };
        let text = config.to_toml().unwrap();
        let back = SweepConfig::from_toml(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SweepConfig::from_file(Path::new("/nonexistent/dipsweep.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dipsweep.toml"));
    }
}
