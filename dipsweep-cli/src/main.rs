//! DipSweep CLI — threshold sweeps for dip-buying strategies.
//!
//! Commands:
//! - `reinvest` — sweep the reinvestment threshold over a dense range
//! - `buy-sell` — sweep the sell threshold of the buy-the-dip strategy
//! - `run` — run every strategy configured in a TOML file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use dipsweep_runner::{
    format_summary, format_table, load_records, run_buy_sell, run_config, run_reinvest,
    save_artifacts, BuySellConfig, DataConfig, LoadOptions, OutputConfig, ParamSweep,
    ReinvestConfig, SweepConfig, SweepReport, ThresholdGrid,
};

#[derive(Parser)]
#[command(
    name = "dipsweep",
    version,
    about = "DipSweep — threshold sweeps for dip-buying strategies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep the reinvestment threshold: add a fixed top-up on days below it.
    Reinvest {
        /// Investing.com historical data CSV.
        #[arg(long)]
        data: PathBuf,

        /// Name for reports and output files. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Amount added on each qualifying day.
        #[arg(long, default_value_t = 100.0)]
        increment: f64,

        /// Starting investment.
        #[arg(long, default_value_t = 10_000.0)]
        investment: f64,

        /// First threshold (fraction, e.g. -0.02 for -2%).
        #[arg(long, default_value_t = -0.02, allow_negative_numbers = true)]
        start: f64,

        /// Range end, exclusive.
        #[arg(long, default_value_t = 0.02, allow_negative_numbers = true)]
        end: f64,

        /// Threshold step.
        #[arg(long, default_value_t = 0.0001)]
        step: f64,

        /// Output directory for CSV and JSON artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Evaluate thresholds on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Use synthetic data when the data file is missing.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Rows shown in the console table.
        #[arg(long)]
        top: Option<usize>,

        /// Log every simulated day at TRACE level.
        #[arg(long, default_value_t = false)]
        trace_days: bool,
    },
    /// Sweep the sell threshold: buy every dip, sell after strong up days.
    BuySell {
        /// Investing.com historical data CSV.
        #[arg(long)]
        data: PathBuf,

        /// Name for reports and output files. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Cash spent on each down day.
        #[arg(long, default_value_t = 300.0)]
        buy_amount: f64,

        /// Cash raised by each sell.
        #[arg(long, default_value_t = 1_000.0)]
        sell_amount: f64,

        /// Comma-separated sell thresholds (fractions). Defaults to 0.005..=0.05.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        thresholds: Option<Vec<f64>>,

        /// Output directory for CSV and JSON artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Evaluate thresholds on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Use synthetic data when the data file is missing.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Rows shown in the console table.
        #[arg(long)]
        top: Option<usize>,

        /// Also export the transaction tape of the best threshold.
        #[arg(long, default_value_t = false)]
        transactions: bool,

        /// Log every simulated day at TRACE level.
        #[arg(long, default_value_t = false)]
        trace_days: bool,
    },
    /// Run every strategy configured in a TOML file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reinvest {
            data,
            symbol,
            increment,
            investment,
            start,
            end,
            step,
            output_dir,
            sequential,
            synthetic,
            top,
            trace_days,
        } => {
            let config = ReinvestConfig {
                initial_investment: investment,
                increment,
                thresholds: ThresholdGrid::Range { start, end, step },
            };
            let source = DataArgs {
                path: data,
                symbol,
                synthetic,
                sequential,
                trace_days,
            };
            run_reinvest_cmd(source, config, &output_dir, top)
        }
        Commands::BuySell {
            data,
            symbol,
            buy_amount,
            sell_amount,
            thresholds,
            output_dir,
            sequential,
            synthetic,
            top,
            transactions,
            trace_days,
        } => {
            let config = BuySellConfig {
                buy_amount,
                sell_amount,
                thresholds: thresholds
                    .map(ThresholdGrid::List)
                    .unwrap_or_else(ThresholdGrid::buy_sell_default),
            };
            let source = DataArgs {
                path: data,
                symbol,
                synthetic,
                sequential,
                trace_days,
            };
            run_buy_sell_cmd(source, config, &output_dir, top, transactions)
        }
        Commands::Run { config } => run_config_cmd(&config),
    }
}

/// Data and execution flags shared by the single-strategy commands.
struct DataArgs {
    path: PathBuf,
    symbol: Option<String>,
    synthetic: bool,
    sequential: bool,
    trace_days: bool,
}

impl DataArgs {
    fn symbol(&self) -> String {
        self.symbol.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "data".to_string())
        })
    }

    fn output(&self, top: Option<usize>) -> OutputConfig {
        OutputConfig {
            parallel: !self.sequential,
            top,
            trace_days: self.trace_days,
            ..Default::default()
        }
    }

    fn sweep(&self) -> ParamSweep {
        self.output(None).param_sweep()
    }
}

/// Validate flags through the same path as a config file.
fn validate_flags(
    source: &DataArgs,
    reinvest: Option<ReinvestConfig>,
    buy_sell: Option<BuySellConfig>,
    top: Option<usize>,
) -> Result<()> {
    let config = SweepConfig {
        data: DataConfig {
            path: source.path.clone(),
            symbol: source.symbol.clone(),
            synthetic: source.synthetic,
        },
        reinvest,
        buy_sell,
        output: source.output(top),
    };
    config.validate()?;
    Ok(())
}

fn run_reinvest_cmd(
    source: DataArgs,
    config: ReinvestConfig,
    output_dir: &Path,
    top: Option<usize>,
) -> Result<()> {
    validate_flags(&source, Some(config.clone()), None, top)?;
    let symbol = source.symbol();
    let data = load_records(&LoadOptions {
        path: source.path.clone(),
        symbol: symbol.clone(),
        synthetic: source.synthetic,
    })?;

    let report = run_reinvest(&symbol, &data, &config, &source.sweep())?;
    finish(&report, output_dir, top, false)
}

fn run_buy_sell_cmd(
    source: DataArgs,
    config: BuySellConfig,
    output_dir: &Path,
    top: Option<usize>,
    transactions: bool,
) -> Result<()> {
    validate_flags(&source, None, Some(config.clone()), top)?;
    let symbol = source.symbol();
    let data = load_records(&LoadOptions {
        path: source.path.clone(),
        symbol: symbol.clone(),
        synthetic: source.synthetic,
    })?;

    let report = run_buy_sell(&symbol, &data, &config, &source.sweep())?;
    finish(&report, output_dir, top, transactions)
}

fn run_config_cmd(path: &Path) -> Result<()> {
    let config = SweepConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    let reports = run_config(&config)?;
    if reports.is_empty() {
        bail!("no strategy produced a report");
    }
    for report in &reports {
        finish(
            report,
            &config.output.dir,
            config.output.top,
            config.output.transactions,
        )?;
    }
    Ok(())
}

fn finish(
    report: &SweepReport,
    output_dir: &Path,
    top: Option<usize>,
    transactions: bool,
) -> Result<()> {
    print!("{}", format_table(report, top));
    print!("{}", format_summary(report));
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }

    let written = save_artifacts(report, output_dir, transactions)?;
    tracing::info!(
        strategy = report.strategy_name(),
        files = written.len(),
        dir = %output_dir.display(),
        "artifacts saved"
    );
    for path in &written {
        println!("Saved: {}", path.display());
    }
    Ok(())
}
