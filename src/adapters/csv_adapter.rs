//! CSV directory data adapter: one `<SYMBOL>.csv` per symbol.

use crate::domain::error::TickerboardError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::table::{BatchTable, MarketTable, PriceTable};
use crate::domain::timestamp::BarTimestamp;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, TickerboardError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let date = find("date")
            .ok_or_else(|| TickerboardError::data_source("missing date column"))?;
        Ok(Self {
            date,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: find("close"),
            volume: find("volume"),
        })
    }
}

/// Empty, `NaN` and `null` cells are undefined.
fn parse_cell(
    record: &csv::StringRecord,
    column: Option<usize>,
    name: &str,
) -> Result<Option<f64>, TickerboardError> {
    let Some(raw) = column.and_then(|i| record.get(i)).map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|e| {
        TickerboardError::data_source(format!("invalid {name} value {raw:?}: {e}"))
    })?;
    Ok(value.is_finite().then_some(value))
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// Reads one symbol's file; `Ok(None)` when the file does not exist.
    fn read_table(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<PriceTable>, TickerboardError> {
        let path = self.csv_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TickerboardError::data_source(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| TickerboardError::data_source(format!("CSV header error: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| TickerboardError::data_source(format!("CSV parse error: {e}")))?;

            let raw_ts = record.get(columns.date).unwrap_or_default();
            let ts: BarTimestamp = raw_ts.parse().map_err(|e| {
                TickerboardError::data_source(format!("{}: {e}", path.display()))
            })?;
            let date = ts.utc_date();
            if date < start || date > end {
                continue;
            }

            let mut bar = PriceBar::new(date);
            bar.open = parse_cell(&record, columns.open, "open")?;
            bar.high = parse_cell(&record, columns.high, "high")?;
            bar.low = parse_cell(&record, columns.low, "low")?;
            bar.close = parse_cell(&record, columns.close, "close")?;
            bar.volume = parse_cell(&record, columns.volume, "volume")?;
            rows.push((ts, bar));
        }

        Ok(Some(PriceTable::from_stamped(rows)))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        match self.read_table(symbol, start, end)? {
            Some(table) => Ok(MarketTable::Single(table)),
            None => Err(TickerboardError::data_source(format!(
                "no data file {}",
                self.csv_path(symbol).display()
            ))),
        }
    }

    fn fetch_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        let mut batch = BatchTable::new();
        for symbol in symbols {
            match self.read_table(symbol, start, end) {
                Ok(Some(table)) => batch.insert_table(symbol, &table),
                Ok(None) => tracing::debug!(%symbol, "no data file, leaving symbol out of batch"),
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "unreadable data file, leaving symbol out of batch")
                }
            }
        }
        Ok(MarketTable::Batch(batch))
    }
}
