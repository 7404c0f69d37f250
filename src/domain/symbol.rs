//! Per-symbol processing: one raw price table in, one dashboard record out.
//!
//! [`process_symbol`] never fails. Insufficient data, alignment problems and
//! panics inside the pipeline all come back as a [`SymbolResult::Failed`]
//! record carrying the message.

use crate::domain::benchmark::BenchmarkContext;
use crate::domain::crossover::{last_bearish_crossover, last_bullish_crossover};
use crate::domain::error::TickerboardError;
use crate::domain::indicator::{compute_indicators, IndicatorRow, IndicatorSet, IndicatorType};
use crate::domain::ohlcv::{defined, PricePoint};
use crate::domain::performance::{
    cumulative_return, drawdown_from_peak, drawdown_history, period_change, relative_performance,
    round2, window, History,
};
use crate::domain::period::Period;
use crate::domain::table::PriceTable;
use crate::domain::universe::SymbolIdentity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};

const NO_VALID_CLOSES: &str = "No valid Close prices for processing.";
const INSUFFICIENT_AFTER_PROCESSING: &str = "Insufficient data after processing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Buy,
    Sell,
}

/// Everything a caller chooses per request.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    pub drawdown_period: Period,
    pub change_period: Period,
    pub benchmark: &'a BenchmarkContext,
    /// Reference instant for the current-drawdown window.
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    pub name: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub latest_price: Option<f64>,
    #[serde(rename = "daily_change_pct")]
    pub change_pct: f64,
    pub ema13: Option<f64>,
    pub ema21: Option<f64>,
    pub ema50: Option<f64>,
    pub ema100: Option<f64>,
    pub ema200: Option<f64>,
    pub rsi14: Option<f64>,
    pub current_drawdown_pct: Option<f64>,
    pub ema_signal: Option<Signal>,
    pub ema_long_signal: Option<Signal>,
    pub ema_short_last_signal_date: Option<NaiveDate>,
    pub ema_long_last_signal_date: Option<NaiveDate>,
    pub relative_perf_1y: Option<f64>,
    pub sparkline_data: Vec<f64>,
    pub asset_1y_history_dates: Vec<NaiveDate>,
    pub asset_1y_history_values: Vec<f64>,
    pub rsi_1y_history_dates: Vec<NaiveDate>,
    pub rsi_1y_history_values: Vec<f64>,
    pub ema_1y_history_dates: Vec<NaiveDate>,
    pub ema13_1y_history_values: Vec<Option<f64>>,
    pub ema21_1y_history_values: Vec<Option<f64>>,
    pub ema50_1y_history_values: Vec<Option<f64>>,
    pub ema100_1y_history_values: Vec<Option<f64>>,
    pub ema200_1y_history_values: Vec<Option<f64>>,
    pub drawdown_history_dates: Vec<NaiveDate>,
    pub drawdown_history_values: Vec<f64>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    pub name: String,
    pub display_name: String,
    pub error: String,
}

/// One symbol's record: a full report, or identity plus an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SymbolResult {
    Report(Box<SymbolReport>),
    Failed(SymbolFailure),
}

impl SymbolResult {
    pub fn failed(identity: &SymbolIdentity, error: impl Into<String>) -> Self {
        SymbolResult::Failed(SymbolFailure {
            name: identity.symbol.clone(),
            display_name: identity.display_name.clone(),
            error: error.into(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            SymbolResult::Report(r) => &r.name,
            SymbolResult::Failed(f) => &f.name,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            SymbolResult::Report(r) => &r.display_name,
            SymbolResult::Failed(f) => &f.display_name,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SymbolResult::Report(_) => None,
            SymbolResult::Failed(f) => Some(&f.error),
        }
    }

    pub fn report(&self) -> Option<&SymbolReport> {
        match self {
            SymbolResult::Report(r) => Some(r),
            SymbolResult::Failed(_) => None,
        }
    }
}

/// Builds the record for one symbol, converting every failure into an error record.
pub fn process_symbol(
    identity: &SymbolIdentity,
    table: &PriceTable,
    ctx: &ProcessContext<'_>,
    is_benchmark: bool,
) -> SymbolResult {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        build_report(identity, table, ctx, is_benchmark)
    }))
    .unwrap_or_else(|payload| {
        Err(TickerboardError::Computation {
            symbol: identity.symbol.clone(),
            reason: panic_message(payload.as_ref()),
        })
    });

    match outcome {
        Ok(report) => {
            tracing::debug!(
                symbol = %identity.symbol,
                bars = table.len(),
                latest_price = ?report.latest_price,
                "processed symbol"
            );
            SymbolResult::Report(Box::new(report))
        }
        Err(e) => {
            tracing::warn!(symbol = %identity.symbol, error = %e, "symbol produced an error record");
            SymbolResult::failed(identity, e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during processing".to_string()
    }
}

/// A bar's date with the indicator row for that date, if its close was defined.
struct AlignedRow {
    date: NaiveDate,
    close: Option<f64>,
    indicators: Option<IndicatorRow>,
}

/// Joins indicator rows (keyed by the dates of defined closes) back onto every bar.
fn align(table: &PriceTable, set: &IndicatorSet) -> Vec<AlignedRow> {
    let mut rows = set.rows.iter().peekable();
    table
        .bars()
        .iter()
        .map(|bar| {
            let indicators = rows.next_if(|r| r.date == bar.date).copied();
            AlignedRow {
                date: bar.date,
                close: bar.valid_close(),
                indicators,
            }
        })
        .collect()
}

fn column(aligned: &[AlignedRow], indicator: IndicatorType) -> Vec<Option<f64>> {
    aligned
        .iter()
        .map(|r| defined(r.indicators.and_then(|row| row.get(indicator))))
        .collect()
}

fn build_report(
    identity: &SymbolIdentity,
    table: &PriceTable,
    ctx: &ProcessContext<'_>,
    is_benchmark: bool,
) -> Result<SymbolReport, TickerboardError> {
    let symbol = &identity.symbol;
    let closes = table.closes();
    if closes.len() < 2 {
        return Err(TickerboardError::InsufficientData {
            symbol: symbol.clone(),
            reason: NO_VALID_CLOSES.to_string(),
        });
    }

    let indicators = compute_indicators(&closes);
    let aligned = align(table, &indicators);
    let misaligned = || TickerboardError::Alignment {
        symbol: symbol.clone(),
        reason: INSUFFICIENT_AFTER_PROCESSING.to_string(),
    };
    if aligned.len() < 2 || indicators.is_empty() {
        return Err(misaligned());
    }
    let latest = aligned.last().ok_or_else(misaligned)?;

    let dates: Vec<NaiveDate> = aligned.iter().map(|r| r.date).collect();
    let [ema13, ema21, ema50, ema100, ema200, rsi14] = [
        IndicatorType::Ema(13),
        IndicatorType::Ema(21),
        IndicatorType::Ema(50),
        IndicatorType::Ema(100),
        IndicatorType::Ema(200),
        IndicatorType::Rsi(14),
    ]
    .map(|indicator| column(&aligned, indicator));
    let (ema_signal, ema_short_last_signal_date) = signal_pair(&dates, &ema13, &ema21);
    let (ema_long_signal, ema_long_last_signal_date) = signal_pair(&dates, &ema50, &ema200);

    let relative_perf_1y = if is_benchmark {
        Some(0.0)
    } else {
        relative_performance(
            Some(period_change(&closes, Period::OneYear)),
            ctx.benchmark.one_year_change_pct,
        )
    };

    let last_close_date = closes[closes.len() - 1].date;
    let asset_history = History::from_points(&cumulative_return(&closes, Period::OneYear));
    let rsi_history = rsi_history(&indicators);
    let ema_history = EmaHistory::from_indicators(&indicators);
    let drawdown = drawdown_history(&closes, ctx.drawdown_period.start_from_date(last_close_date));

    Ok(SymbolReport {
        name: symbol.clone(),
        display_name: identity.display_name.clone(),
        asset_type: identity.asset_type.clone(),
        latest_price: latest.close,
        change_pct: period_change(&closes, ctx.change_period),
        ema13: latest_of(&ema13),
        ema21: latest_of(&ema21),
        ema50: latest_of(&ema50),
        ema100: latest_of(&ema100),
        ema200: latest_of(&ema200),
        rsi14: latest_of(&rsi14),
        current_drawdown_pct: drawdown_from_peak(&closes, ctx.drawdown_period.start_from(ctx.as_of)),
        ema_signal,
        ema_long_signal,
        ema_short_last_signal_date,
        ema_long_last_signal_date,
        relative_perf_1y,
        sparkline_data: sparkline(&closes, ctx.change_period),
        asset_1y_history_dates: asset_history.dates,
        asset_1y_history_values: asset_history.values,
        rsi_1y_history_dates: rsi_history.dates,
        rsi_1y_history_values: rsi_history.values,
        ema_1y_history_dates: ema_history.dates,
        ema13_1y_history_values: ema_history.ema13,
        ema21_1y_history_values: ema_history.ema21,
        ema50_1y_history_values: ema_history.ema50,
        ema100_1y_history_values: ema_history.ema100,
        ema200_1y_history_values: ema_history.ema200,
        drawdown_history_dates: drawdown.dates,
        drawdown_history_values: drawdown.values,
        last_updated: Utc::now(),
    })
}

fn latest_of(column: &[Option<f64>]) -> Option<f64> {
    column.last().copied().flatten()
}

/// Direction from the latest values, date from the crossover detector.
fn signal_pair(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
) -> (Option<Signal>, Option<NaiveDate>) {
    match (latest_of(short), latest_of(long)) {
        (Some(s), Some(l)) if s > l => (Some(Signal::Buy), last_bullish_crossover(dates, short, long)),
        (Some(s), Some(l)) if s < l => (Some(Signal::Sell), last_bearish_crossover(dates, short, long)),
        _ => (None, None),
    }
}

/// Closes inside the change window anchored at the last close, else the last two.
fn sparkline(closes: &[PricePoint], change_period: Period) -> Vec<f64> {
    let Some(last) = closes.last() else {
        return Vec::new();
    };
    let recent = window(closes, change_period.start_from_date(last.date));
    let points = if recent.is_empty() {
        &closes[closes.len().saturating_sub(2)..]
    } else {
        recent
    };
    points.iter().map(|p| p.price).collect()
}

/// Trailing one-year slice of `points`, anchored at their own last date.
fn trailing_year(points: &[PricePoint]) -> &[PricePoint] {
    match points.last() {
        Some(last) if points.len() >= 2 => window(points, Period::OneYear.start_from_date(last.date)),
        _ => &[],
    }
}

fn rsi_history(set: &IndicatorSet) -> History {
    let points: Vec<PricePoint> = set
        .rows
        .iter()
        .filter(|r| r.rsi14.is_finite())
        .map(|r| PricePoint {
            date: r.date,
            price: r.rsi14,
        })
        .collect();
    History::from_points(trailing_year(&points))
}

/// The EMA ladder over the EMA13 one-year dates; other spans are looked up on
/// those dates and left as gaps where undefined.
#[derive(Debug, Default)]
struct EmaHistory {
    dates: Vec<NaiveDate>,
    ema13: Vec<Option<f64>>,
    ema21: Vec<Option<f64>>,
    ema50: Vec<Option<f64>>,
    ema100: Vec<Option<f64>>,
    ema200: Vec<Option<f64>>,
}

impl EmaHistory {
    fn from_indicators(set: &IndicatorSet) -> Self {
        let ema13: Vec<PricePoint> = set
            .rows
            .iter()
            .filter(|r| r.ema13.is_finite())
            .map(|r| PricePoint {
                date: r.date,
                price: r.ema13,
            })
            .collect();
        let target = trailing_year(&ema13);
        let Some(first) = target.first() else {
            return Self::default();
        };

        let start = set.rows.partition_point(|r| r.date < first.date);
        let rows: Vec<&IndicatorRow> = set.rows[start..]
            .iter()
            .filter(|r| target.binary_search_by_key(&r.date, |p| p.date).is_ok())
            .collect();
        let series = |span: usize| -> Vec<Option<f64>> {
            rows.iter()
                .map(|r| defined(r.get(IndicatorType::Ema(span))).map(round2))
                .collect()
        };

        Self {
            dates: rows.iter().map(|r| r.date).collect(),
            ema13: series(13),
            ema21: series(21),
            ema50: series(50),
            ema100: series(100),
            ema200: series(200),
        }
    }
}
