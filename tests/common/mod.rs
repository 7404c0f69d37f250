#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::cell::Cell;
use std::collections::HashMap;
use tickerboard::domain::error::TickerboardError;
use tickerboard::domain::ohlcv::PriceBar;
use tickerboard::domain::table::{BatchTable, MarketTable, PriceTable};
use tickerboard::domain::universe::{parse_assets, parse_market, Universe};
use tickerboard::ports::data_port::DataPort;

/// In-memory data source. Single-symbol fetches read `tables`; batch fetches
/// assemble a [`BatchTable`] from the same tables unless `batch_error` is set.
pub struct MockDataPort {
    pub tables: HashMap<String, PriceTable>,
    pub errors: HashMap<String, String>,
    pub batch_error: Option<String>,
    pub batch_calls: Cell<u32>,
    pub history_calls: Cell<u32>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            errors: HashMap::new(),
            batch_error: None,
            batch_calls: Cell::new(0),
            history_calls: Cell::new(0),
        }
    }

    pub fn with_table(mut self, symbol: &str, table: PriceTable) -> Self {
        self.tables.insert(symbol.to_string(), table);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_batch_error(mut self, reason: &str) -> Self {
        self.batch_error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        self.history_calls.set(self.history_calls.get() + 1);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TickerboardError::data_source(reason.clone()));
        }
        Ok(MarketTable::Single(
            self.tables.get(symbol).cloned().unwrap_or_default(),
        ))
    }

    fn fetch_batch(
        &self,
        symbols: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        self.batch_calls.set(self.batch_calls.get() + 1);
        if let Some(reason) = &self.batch_error {
            return Err(TickerboardError::data_source(reason.clone()));
        }
        let mut batch = BatchTable::new();
        for symbol in symbols {
            if let Some(table) = self.tables.get(symbol) {
                batch.insert_table(symbol, table);
            }
        }
        Ok(MarketTable::Batch(batch))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily flat bars starting at `start`, one per price.
pub fn daily_table(start: NaiveDate, prices: &[f64]) -> PriceTable {
    PriceTable::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceBar::flat(start + Duration::days(i as i64), p))
            .collect(),
    )
}

/// `days` bars ending on `end`, rising linearly from `from` by `step` per day.
pub fn trending_table(end: NaiveDate, days: i64, from: f64, step: f64) -> PriceTable {
    let start = end - Duration::days(days - 1);
    let prices: Vec<f64> = (0..days).map(|i| from + step * i as f64).collect();
    daily_table(start, &prices)
}

pub fn as_of() -> DateTime<Utc> {
    "2024-06-14T21:00:00Z".parse().unwrap()
}

pub fn last_day() -> NaiveDate {
    date(2024, 6, 14)
}

/// SPY appears in both lists; ^DJI is market only; AAPL and BTC-USD are assets only.
pub fn sample_universe() -> Universe {
    Universe::new(
        parse_market("SPY:SPY, ^DJI:Dow Jones").unwrap(),
        parse_assets("SPY:ETF, AAPL:Stock, BTC-USD:Crypto").unwrap(),
        "SPY",
    )
}

pub fn sample_port() -> MockDataPort {
    MockDataPort::new()
        .with_table("SPY", trending_table(last_day(), 500, 400.0, 0.2))
        .with_table("^DJI", trending_table(last_day(), 500, 30000.0, 10.0))
        .with_table("AAPL", trending_table(last_day(), 500, 150.0, 0.1))
}
