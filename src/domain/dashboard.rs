//! Dashboard aggregation: one benchmark fetch, one batch fetch, one record per symbol.

use crate::domain::benchmark::BenchmarkContext;
use crate::domain::period::Period;
use crate::domain::performance::History;
use crate::domain::symbol::{process_symbol, ProcessContext, SymbolResult};
use crate::domain::universe::Universe;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Five years of daily history for every symbol.
pub const BATCH_LOOKBACK_DAYS: i64 = 1825;

pub const BATCH_FAILED: &str = "Batch download failed.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardRequest {
    pub drawdown_period: Period,
    pub change_period: Period,
    pub as_of: DateTime<Utc>,
}

impl DashboardRequest {
    /// Tokens are resolved leniently; unknown tokens mean one day.
    pub fn new(drawdown_period: &str, change_period: &str, as_of: DateTime<Utc>) -> Self {
        Self {
            drawdown_period: Period::parse(drawdown_period),
            change_period: Period::parse(change_period),
            as_of,
        }
    }

    fn range(&self) -> (NaiveDate, NaiveDate) {
        let start = (self.as_of - Duration::days(BATCH_LOOKBACK_DAYS)).date_naive();
        (start, self.as_of.date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload {
    pub market_data: BTreeMap<String, SymbolResult>,
    pub asset_data: BTreeMap<String, SymbolResult>,
    #[serde(rename = "spy_1y_history")]
    pub benchmark_1y_history: History,
}

pub struct Dashboard<'a> {
    universe: Universe,
    data: &'a dyn DataPort,
}

impl<'a> Dashboard<'a> {
    pub fn new(universe: Universe, data: &'a dyn DataPort) -> Self {
        Self { universe, data }
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    fn benchmark(&self, request: &DashboardRequest) -> BenchmarkContext {
        BenchmarkContext::resolve(self.data, &self.universe.benchmark, request.as_of)
    }

    /// Builds the full payload. Never fails: problems surface as error records.
    pub fn build(&self, request: &DashboardRequest) -> DashboardPayload {
        let benchmark = self.benchmark(request);
        let symbols = self.universe.all_symbols();
        let (start, end) = request.range();

        tracing::info!(symbols = symbols.len(), %start, %end, "fetching batch");
        let batch = match self.data.fetch_batch(&symbols, start, end) {
            Ok(table) if !table.is_empty() => Some(table),
            Ok(_) => {
                tracing::warn!("batch download returned no data");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch download failed");
                None
            }
        };

        let ctx = ProcessContext {
            drawdown_period: request.drawdown_period,
            change_period: request.change_period,
            benchmark: &benchmark,
            as_of: request.as_of,
        };

        let mut market_data = BTreeMap::new();
        let mut asset_data = BTreeMap::new();

        for symbol in &symbols {
            let identity = self.universe.identity(symbol);
            let result = match &batch {
                Some(table) => process_symbol(
                    &identity,
                    &table.extract(symbol),
                    &ctx,
                    self.universe.is_benchmark(symbol),
                ),
                None => SymbolResult::failed(&identity, BATCH_FAILED),
            };

            if self.universe.is_asset(symbol) {
                asset_data.insert(symbol.clone(), result.clone());
            }
            if self.universe.is_market(symbol) {
                market_data.insert(symbol.clone(), result);
            }
        }

        tracing::info!(
            market = market_data.len(),
            assets = asset_data.len(),
            "dashboard assembled"
        );

        DashboardPayload {
            market_data,
            asset_data,
            benchmark_1y_history: benchmark.history,
        }
    }

    /// One symbol through the single-symbol fetch path.
    pub fn symbol_report(&self, symbol: &str, request: &DashboardRequest) -> SymbolResult {
        let symbol = symbol.trim().to_uppercase();
        let identity = self.universe.identity(&symbol);
        let benchmark = self.benchmark(request);
        let (start, end) = request.range();

        let table = match self.data.fetch_history(&symbol, start, end) {
            Ok(table) => table.extract(&symbol),
            Err(e) => {
                tracing::warn!(%symbol, error = %e, "fetch failed");
                return SymbolResult::failed(&identity, e.to_string());
            }
        };

        let ctx = ProcessContext {
            drawdown_period: request.drawdown_period,
            change_period: request.change_period,
            benchmark: &benchmark,
            as_of: request.as_of,
        };
        process_symbol(&identity, &table, &ctx, self.universe.is_benchmark(&symbol))
    }
}
