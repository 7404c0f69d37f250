//! Reference instrument context shared by every symbol in a request.

use crate::domain::ohlcv::PricePoint;
use crate::domain::performance::{cumulative_return, period_change, History};
use crate::domain::period::Period;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, Utc};

/// Roughly thirteen months: enough for a full year plus slack for holidays.
pub const BENCHMARK_LOOKBACK_DAYS: i64 = 395;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkContext {
    pub one_year_change_pct: Option<f64>,
    pub history: History,
}

impl BenchmarkContext {
    /// No benchmark data; relative figures come out absent.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn from_closes(closes: &[PricePoint]) -> Self {
        if closes.len() < 2 {
            return Self::absent();
        }
        let change = period_change(closes, Period::OneYear);
        Self {
            one_year_change_pct: change.is_finite().then_some(change),
            history: History::from_points(&cumulative_return(closes, Period::OneYear)),
        }
    }

    /// Fetches the benchmark and derives its context. Any failure degrades to
    /// [`BenchmarkContext::absent`].
    pub fn resolve(data: &dyn DataPort, symbol: &str, as_of: DateTime<Utc>) -> Self {
        let start = (as_of - Duration::days(BENCHMARK_LOOKBACK_DAYS)).date_naive();
        let end = as_of.date_naive();

        let table = match data.fetch_history(symbol, start, end) {
            Ok(table) => table.extract(symbol),
            Err(e) => {
                tracing::warn!(%symbol, error = %e, "benchmark unavailable, relative figures disabled");
                return Self::absent();
            }
        };

        let context = Self::from_closes(&table.closes());
        match context.one_year_change_pct {
            Some(change) => tracing::info!(
                %symbol,
                change_pct = change,
                history_points = context.history.len(),
                "benchmark resolved"
            ),
            None => tracing::warn!(%symbol, "benchmark has fewer than two closes"),
        }
        context
    }
}
