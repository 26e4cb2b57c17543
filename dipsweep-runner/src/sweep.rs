//! Threshold grids and the parameter sweep.
//!
//! A sweep evaluates one engine at every threshold of a grid. Evaluations
//! share nothing, so they may run on the rayon pool; results are collected
//! in grid order and then stably sorted by score, descending.

use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use thiserror::Error;

use dipsweep_core::data::snap_fraction;
use dipsweep_core::domain::DailyRecord;
use dipsweep_core::engine::{NoopObserver, Ranked, ThresholdEngine, TracingObserver};

/// Largest number of thresholds a range grid may expand to.
pub const MAX_GRID_POINTS: usize = 1_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("threshold range values must be finite (start={start}, end={end}, step={step})")]
    NonFiniteRange { start: f64, end: f64, step: f64 },

    #[error("threshold range step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("threshold range is empty: end {end} must be greater than start {start}")]
    EmptyRange { start: f64, end: f64 },

    #[error("threshold range expands to {points} thresholds, more than the limit of {max}")]
    TooManyPoints { points: f64, max: usize },

    #[error("threshold list is empty")]
    EmptyList,

    #[error("threshold list contains a non-finite value: {0}")]
    NonFiniteThreshold(f64),
}

/// Thresholds to evaluate, as signed fractions (`0.005` = 0.5%).
///
/// In TOML either an inline table `{ start, end, step }` or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThresholdGrid {
    /// Explicit values, evaluated in the given order.
    ///
    /// Listed first: untagged matching is in declaration order, and a
    /// three-element array would otherwise deserialize as a `Range`.
    List(Vec<f64>),
    /// Half-open arithmetic range `[start, end)`.
    Range { start: f64, end: f64, step: f64 },
}

impl ThresholdGrid {
    /// -2% to 1.99% in 0.01% steps (400 thresholds).
    pub fn reinvest_default() -> Self {
        ThresholdGrid::Range {
            start: -0.02,
            end: 0.02,
            step: 0.0001,
        }
    }

    /// 0.5% to 5% in 0.5% steps.
    pub fn buy_sell_default() -> Self {
        ThresholdGrid::List((1..=10).map(|k| snap_fraction(k as f64 * 0.005)).collect())
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        match *self {
            ThresholdGrid::Range { start, end, step } => {
                if !start.is_finite() || !end.is_finite() || !step.is_finite() {
                    return Err(SweepError::NonFiniteRange { start, end, step });
                }
                if step <= 0.0 {
                    return Err(SweepError::NonPositiveStep(step));
                }
                if end <= start {
                    return Err(SweepError::EmptyRange { start, end });
                }
                let points = ((end - start) / step).ceil();
                if points > MAX_GRID_POINTS as f64 {
                    return Err(SweepError::TooManyPoints {
                        points,
                        max: MAX_GRID_POINTS,
                    });
                }
                Ok(())
            }
            ThresholdGrid::List(ref values) => {
                if values.is_empty() {
                    return Err(SweepError::EmptyList);
                }
                if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
                    return Err(SweepError::NonFiniteThreshold(bad));
                }
                Ok(())
            }
        }
    }

    /// Number of thresholds in the grid.
    pub fn len(&self) -> Result<usize, SweepError> {
        self.validate()?;
        Ok(match *self {
            ThresholdGrid::Range { start, end, step } => step_count(start, end, step),
            ThresholdGrid::List(ref values) => values.len(),
        })
    }

    /// Materialize the grid.
    ///
    /// Range values are computed as `start + k * step` from an integer `k`,
    /// never by repeated addition.
    pub fn values(&self) -> Result<Vec<f64>, SweepError> {
        self.validate()?;
        Ok(match *self {
            ThresholdGrid::Range { start, end, step } => (0..step_count(start, end, step))
                .map(|k| snap_fraction(start + k as f64 * step))
                .collect(),
            ThresholdGrid::List(ref values) => values.clone(),
        })
    }
}

/// `ceil((end - start) / step)`, tolerant of a quotient like `400.00000000000006`.
fn step_count(start: f64, end: f64, step: f64) -> usize {
    ((end - start) / step - 1e-9).ceil().max(0.0) as usize
}

/// Parameter sweep executor.
///
/// Runs one engine over every threshold of a grid, optionally in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
    trace_days: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self {
            parallel: true,
            trace_days: false,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Emit every simulated day as a `TRACE` event.
    pub fn with_day_trace(mut self, trace_days: bool) -> Self {
        self.trace_days = trace_days;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn traces_days(&self) -> bool {
        self.trace_days
    }

    /// Evaluate `engine` at every threshold of `grid`.
    pub fn sweep<E: ThresholdEngine>(
        &self,
        engine: &E,
        records: &[DailyRecord],
        grid: &ThresholdGrid,
    ) -> Result<SweepResults<E::Output>, SweepError> {
        self.sweep_with_progress(engine, records, grid, |_, _, _| {})
    }

    /// Executes a sweep with progress reporting.
    ///
    /// The callback is invoked after each evaluation completes with:
    /// - Index of the threshold in the grid (0-based)
    /// - Total number of thresholds
    /// - The completed result
    ///
    /// In parallel mode callbacks arrive in completion order, not grid order.
    pub fn sweep_with_progress<E, F>(
        &self,
        engine: &E,
        records: &[DailyRecord],
        grid: &ThresholdGrid,
        progress_callback: F,
    ) -> Result<SweepResults<E::Output>, SweepError>
    where
        E: ThresholdEngine,
        F: Fn(usize, usize, &E::Output) + Send + Sync,
    {
        let thresholds = grid.values()?;
        let total = thresholds.len();

        tracing::debug!(
            engine = engine.name(),
            thresholds = total,
            records = records.len(),
            parallel = self.parallel,
            "starting sweep"
        );

        let evaluate = |(idx, &threshold): (usize, &f64)| {
            let result = if self.trace_days {
                engine.evaluate(records, threshold, &mut TracingObserver::new(threshold))
            } else {
                engine.evaluate(records, threshold, &mut NoopObserver)
            };
            progress_callback(idx, total, &result);
            result
        };

        // `collect` on an indexed parallel iterator keeps grid order.
        let results: Vec<E::Output> = if self.parallel {
            thresholds.par_iter().enumerate().map(evaluate).collect()
        } else {
            thresholds.iter().enumerate().map(evaluate).collect()
        };

        Ok(SweepResults::new(results))
    }
}

/// Results from a parameter sweep.
///
/// Keeps rows in grid order alongside a ranking by score (descending).
/// Ties keep grid order; a NaN score ranks last.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults<T> {
    results: Vec<T>,
    ranking: Vec<usize>,
}

impl<T: Ranked> SweepResults<T> {
    pub fn new(results: Vec<T>) -> Self {
        let mut ranking: Vec<usize> = (0..results.len()).collect();
        // `sort_by` is stable.
        ranking.sort_by(|&a, &b| compare_desc(results[a].score(), results[b].score()));
        Self { results, ranking }
    }

    /// Rows in the order the grid produced them.
    pub fn by_threshold_order(&self) -> &[T] {
        &self.results
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns results sorted by score (descending).
    pub fn ranked(&self) -> Vec<&T> {
        self.ranking.iter().map(|&i| &self.results[i]).collect()
    }

    /// Returns the top N results by score.
    pub fn top_n(&self, n: usize) -> Vec<&T> {
        self.ranking
            .iter()
            .take(n)
            .map(|&i| &self.results[i])
            .collect()
    }

    /// Returns the best result by score.
    pub fn best(&self) -> Option<&T> {
        self.ranking.first().map(|&i| &self.results[i])
    }
}

impl<T> SweepResults<T> {
    /// Grid index of the best row.
    pub fn best_index(&self) -> Option<usize> {
        self.ranking.first().copied()
    }

    /// Owned rows in grid order.
    pub fn into_rows(self) -> Vec<T> {
        self.results
    }
}

// Serialized as the grid-order rows; the ranking is rebuilt on load.
impl<T: Serialize> Serialize for SweepResults<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.results.serialize(serializer)
    }
}

impl<'de, T: Ranked + Deserialize<'de>> Deserialize<'de> for SweepResults<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::new)
    }
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    let key = |x: f64| if x.is_nan() { f64::NEG_INFINITY } else { x };
    key(b).total_cmp(&key(a))
}
