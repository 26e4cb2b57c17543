//! Reporting and export — CSV, JSON, and console output.
//!
//! Provides three output forms for sweep reports:
//! - **CSV**: one row per threshold, plus the best buy/sell transaction tape
//! - **JSON**: full manifest with schema versioning
//! - **Console**: ranked table and an optimal-threshold summary
//!
//! Persisted manifests include a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dipsweep_core::domain::Transaction;
use dipsweep_core::engine::{BuySellResult, ReinvestResult};

use crate::runner::{StrategyOutcome, SweepReport, SCHEMA_VERSION};

// ─── CSV export ─────────────────────────────────────────────────────

/// Export reinvestment rows. Columns: threshold, investment, percent_gain.
pub fn export_reinvest_csv(rows: &[ReinvestResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["threshold", "investment", "percent_gain"])?;
    for r in rows {
        wtr.write_record([
            &format!("{:.6}", r.threshold),
            &format!("{:.6}", r.final_investment_value),
            &format!("{:.6}", r.percent_gain),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export buy/sell rows.
///
/// Columns: threshold, roi, total_investment, final_value, num_buys,
/// num_sells, cash_withdrawn, final_shares
pub fn export_buy_sell_csv(rows: &[BuySellResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "threshold",
        "roi",
        "total_investment",
        "final_value",
        "num_buys",
        "num_sells",
        "cash_withdrawn",
        "final_shares",
    ])?;
    for r in rows {
        wtr.write_record([
            &format!("{:.6}", r.threshold),
            &format!("{:.6}", r.roi),
            &format!("{:.2}", r.total_investment),
            &format!("{:.2}", r.final_value),
            &r.num_buys.to_string(),
            &r.num_sells.to_string(),
            &format!("{:.2}", r.cash_withdrawn),
            &format!("{:.6}", r.final_shares),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a transaction tape. Columns: date, action, amount, shares, price.
///
/// `price` is empty for a sell that found no shares to sell.
pub fn export_transactions_csv(transactions: &[Transaction]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "action", "amount", "shares", "price"])?;
    for t in transactions {
        wtr.write_record([
            &t.date.to_string(),
            &t.action.to_string(),
            &format!("{:.2}", t.amount),
            &format!("{:.6}", t.shares),
            &t.price().map(|p| format!("{p:.2}")).unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// `{symbol}_transformed_data_set_increment_{increment}_investment_{investment}.csv`
pub fn reinvest_file_name(symbol: &str, increment: f64, investment: f64) -> String {
    format!(
        "{symbol}_transformed_data_set_increment_{}_investment_{}.csv",
        trim_number(increment),
        trim_number(investment)
    )
}

/// `100.0` → `"100"`, `12.5` → `"12.5"`.
fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SweepReport` to pretty JSON.
pub fn export_json(report: &SweepReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SweepReport to JSON")
}

/// Deserialize a `SweepReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SweepReport> {
    let report: SweepReport =
        serde_json::from_str(json).context("failed to deserialize SweepReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Artifact files ─────────────────────────────────────────────────

/// Write the artifact set for one report into `output_dir`.
///
/// - reinvest: the threshold CSV, rows in grid order
/// - buy/sell: `{symbol}_buy_sell_results.csv` in grid order, plus
///   `{symbol}_buy_sell_best_transactions.csv` when `with_transactions`
/// - always: `{symbol}_{strategy}_manifest.json`
///
/// Returns the paths written.
pub fn save_artifacts(
    report: &SweepReport,
    output_dir: &Path,
    with_transactions: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut written = Vec::new();
    let mut write = |name: String, body: String| -> Result<()> {
        let path = output_dir.join(name);
        std::fs::write(&path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    match &report.outcome {
        StrategyOutcome::Reinvest { params, results } => {
            write(
                reinvest_file_name(&report.symbol, params.increment, params.initial_investment),
                export_reinvest_csv(results.by_threshold_order())?,
            )?;
        }
        StrategyOutcome::BuySell { results, .. } => {
            write(
                format!("{}_buy_sell_results.csv", report.symbol),
                export_buy_sell_csv(results.by_threshold_order())?,
            )?;
            if with_transactions {
                if let Some(best) = results.best() {
                    write(
                        format!("{}_buy_sell_best_transactions.csv", report.symbol),
                        export_transactions_csv(&best.transactions)?,
                    )?;
                }
            }
        }
    }

    write(
        format!("{}_{}_manifest.json", report.symbol, report.strategy_name()),
        export_json(report)?,
    )?;

    Ok(written)
}

/// Load a `SweepReport` from a manifest file.
pub fn load_manifest(path: &Path) -> Result<SweepReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Console reports ────────────────────────────────────────────────

/// Ranked table for the console. `top` limits the rows shown.
pub fn format_table(report: &SweepReport, top: Option<usize>) -> String {
    let limit = top.unwrap_or(usize::MAX);
    let mut out = String::with_capacity(4096);

    out.push_str(&format!(
        "\n{} — {} ({} days{})\n",
        report.symbol,
        report.strategy_name(),
        report.record_count,
        if report.has_synthetic { ", SYNTHETIC" } else { "" }
    ));

    match &report.outcome {
        StrategyOutcome::Reinvest { results, .. } => {
            out.push_str("\nResults sorted by percent gain (best to worst):\n\n");
            out.push_str(" Threshold |   Gain    |   Final Value\n");
            out.push_str(&"-".repeat(42));
            out.push('\n');
            for r in results.top_n(limit) {
                out.push_str(&format!(
                    "{:9.2}% | {:8.4}% | ${:>14}\n",
                    r.threshold * 100.0,
                    r.percent_gain,
                    format_money(r.final_investment_value)
                ));
            }
        }
        StrategyOutcome::BuySell { results, .. } => {
            out.push_str("\nResults sorted by ROI (best to worst):\n\n");
            out.push_str(
                "Threshold  |  ROI     | Total Investment | Final Value  | # Buys | # Sells | Cash Withdrawn\n",
            );
            out.push_str(&"-".repeat(85));
            out.push('\n');
            for r in results.top_n(limit) {
                out.push_str(&format!(
                    "{:8.1}% | {:7.2}% | ${:>15} | ${:>11} | {:6} | {:7} | ${:>13}\n",
                    r.threshold * 100.0,
                    r.roi,
                    format_money(r.total_investment),
                    format_money(r.final_value),
                    r.num_buys,
                    r.num_sells,
                    format_money(r.cash_withdrawn)
                ));
            }
        }
    }

    out
}

/// Summary block for the top-ranked threshold.
pub fn format_summary(report: &SweepReport) -> String {
    match &report.outcome {
        StrategyOutcome::Reinvest { params, results } => match results.best() {
            Some(best) => format!(
                "\nOptimal Reinvestment Threshold: {:.2}%\n\
                 Maximum Gain: {:.4}%\n\
                 At this threshold:\n\
                 - Final investment value: ${}\n\
                 - Total contributed: ${}\n",
                best.threshold * 100.0,
                best.percent_gain,
                format_money(best.final_investment_value),
                format_money(params.initial_investment + best.contributed_increment),
            ),
            None => "\nNo thresholds evaluated.\n".to_string(),
        },
        StrategyOutcome::BuySell { results, .. } => match results.best() {
            Some(best) => format!(
                "\nOptimal Selling Threshold: {:.1}%\n\
                 Maximum ROI: {:.2}%\n\
                 At this threshold:\n\
                 - Number of buy transactions: {}\n\
                 - Number of sell transactions: {}\n\
                 - Total cash withdrawn: ${}\n\
                 - Final shares held: {:.2}\n",
                best.threshold * 100.0,
                best.roi,
                best.num_buys,
                best.num_sells,
                format_money(best.cash_withdrawn),
                best.final_shares,
            ),
            None => "\nNo thresholds evaluated.\n".to_string(),
        },
    }
}

/// Two decimals with thousands separators: `1234567.891` → `"1,234,567.89"`.
pub fn format_money(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && s.bytes().any(|b| b != b'0' && b != b'.') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dipsweep_core::domain::TradeAction;
    use dipsweep_core::engine::{BuySellEngine, ReinvestEngine};

    use crate::sweep::SweepResults;

    fn reinvest_report() -> SweepReport {
        SweepReport {
            schema_version: SCHEMA_VERSION,
            symbol: "VOOG".into(),
            dataset_hash: "abc".into(),
            has_synthetic: false,
            record_count: 2,
            first_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            last_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            outcome: StrategyOutcome::Reinvest {
                params: ReinvestEngine::default(),
                results: SweepResults::new(vec![
                    ReinvestResult {
                        threshold: -0.02,
                        final_investment_value: 10_100.0,
                        contributed_increment: 0.0,
                        percent_gain: 1.0,
                    },
                    ReinvestResult {
                        threshold: 0.0,
                        final_investment_value: 10_200.0,
                        contributed_increment: 100.0,
                        percent_gain: 0.990099,
                    },
                    ReinvestResult {
                        threshold: 0.01,
                        final_investment_value: 10_450.0,
                        contributed_increment: 300.0,
                        percent_gain: 1.477833,
                    },
                ]),
            },
        }
    }

    fn buy_sell_report() -> SweepReport {
        let buy = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            action: TradeAction::Buy,
            amount: 300.0,
            shares: 3.0,
        };
        let empty_sell = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            action: TradeAction::Sell,
            amount: 1_000.0,
            shares: 0.0,
        };
        SweepReport {
            outcome: StrategyOutcome::BuySell {
                params: BuySellEngine::default(),
                results: SweepResults::new(vec![BuySellResult {
                    threshold: 0.005,
                    total_investment: 300.0,
                    final_value: 1_300.5,
                    roi: 333.5,
                    final_shares: 3.0,
                    cash_withdrawn: 1_000.5,
                    num_buys: 1,
                    num_sells: 1,
                    transactions: vec![buy, empty_sell],
                }]),
            },
            ..reinvest_report()
        }
    }

    #[test]
    fn reinvest_csv_columns() {
        let report = reinvest_report();
        let StrategyOutcome::Reinvest { results, .. } = &report.outcome else {
            unreachable!()
        };
        let csv = export_reinvest_csv(results.by_threshold_order()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("threshold,investment,percent_gain"));
        assert_eq!(lines.next(), Some("-0.020000,10100.000000,1.000000"));
        assert_eq!(lines.next(), Some("0.000000,10200.000000,0.990099"));
    }

    #[test]
    fn buy_sell_csv_columns() {
        let report = buy_sell_report();
        let StrategyOutcome::BuySell { results, .. } = &report.outcome else {
            unreachable!()
        };
        let csv = export_buy_sell_csv(results.by_threshold_order()).unwrap();
        assert!(csv.starts_with("threshold,roi,total_investment,final_value,num_buys"));
        assert!(csv.contains("0.005000,333.500000,300.00,1300.50,1,1,1000.50,3.000000"));

        let tape = export_transactions_csv(&results.by_threshold_order()[0].transactions).unwrap();
        let mut lines = tape.lines();
        assert_eq!(lines.next(), Some("date,action,amount,shares,price"));
        assert_eq!(lines.next(), Some("2024-01-01,buy,300.00,3.000000,100.00"));
        assert_eq!(lines.next(), Some("2024-01-02,sell,1000.00,0.000000,"));
    }

    #[test]
    fn reinvest_file_name_matches_convention() {
        assert_eq!(
            reinvest_file_name("VOOG_2024", 100.0, 10_000.0),
            "VOOG_2024_transformed_data_set_increment_100_investment_10000.csv"
        );
        assert_eq!(
            reinvest_file_name("X", 12.5, 1_000.0),
            "X_transformed_data_set_increment_12.5_investment_1000.csv"
        );
    }

    #[test]
    fn json_roundtrip_and_version_gate() {
        let report = buy_sell_report();
        let json = export_json(&report).unwrap();
        assert!(json.contains("\"strategy\": \"buy_sell\""));
        let back = import_json(&json).unwrap();
        assert_eq!(back.outcome, report.outcome);

        let future = json.replace(
            &format!("\"schema_version\": {SCHEMA_VERSION}"),
            "\"schema_version\": 99",
        );
        let err = import_json(&future).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn save_artifacts_writes_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = save_artifacts(&buy_sell_report(), dir.path(), true).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "VOOG_buy_sell_results.csv",
                "VOOG_buy_sell_best_transactions.csv",
                "VOOG_buy_sell_manifest.json",
            ]
        );

        let loaded = load_manifest(&paths[2]).unwrap();
        assert_eq!(loaded.symbol, "VOOG");

        let paths = save_artifacts(&reinvest_report(), dir.path(), true).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("VOOG_transformed_data_set_increment_100_investment_10000.csv"));
    }

    #[test]
    fn reinvest_csv_keeps_grid_order_while_console_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let report = reinvest_report();
        let paths = save_artifacts(&report, dir.path(), false).unwrap();

        let csv = std::fs::read_to_string(&paths[0]).unwrap();
        let thresholds: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(thresholds, vec!["-0.020000", "0.000000", "0.010000"]);

        let table = format_table(&report, None);
        let best = table.find("     1.00% |").unwrap();
        let first = table.find("    -2.00% |").unwrap();
        assert!(best < first);
        assert!(format_summary(&report).contains("Optimal Reinvestment Threshold: 1.00%"));

        let loaded = load_manifest(&paths[1]).unwrap();
        assert_eq!(loaded.outcome, report.outcome);
        assert_eq!(loaded.best(), Some((0.01, 1.477833)));
    }

    #[test]
    fn console_table_and_summary() {
        let report = buy_sell_report();
        let table = format_table(&report, Some(5));
        assert!(table.contains("Results sorted by ROI"));
        assert!(table.contains("     0.5% |  333.50% |"));
        let summary = format_summary(&report);
        assert!(summary.contains("Optimal Selling Threshold: 0.5%"));
        assert!(summary.contains("Total cash withdrawn: $1,000.50"));

        let summary = format_summary(&reinvest_report());
        assert!(summary.contains("Optimal Reinvestment Threshold: 1.00%"));
        assert!(summary.contains("Total contributed: $10,300.00"));
    }

    #[test]
    fn money_formatting() {
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(999.999), "1,000.00");
        assert_eq!(format_money(1_234_567.891), "1,234,567.89");
        assert_eq!(format_money(-1_500.0), "-1,500.00");
        assert_eq!(format_money(-0.001), "0.00");
    }
}
