//! Per-symbol price tables and the multi-symbol batch variant.
//!
//! A data source hands back either one symbol's bars ([`PriceTable`]) or a batch
//! keyed field-then-symbol ([`BatchTable`]). [`MarketTable::extract`] slices either
//! shape into the flat per-symbol table the analytics consume.

use crate::domain::ohlcv::{PriceBar, PricePoint};
use crate::domain::timestamp::BarTimestamp;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Bars for one symbol, strictly increasing by date, one bar per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    bars: Vec<PriceBar>,
}

impl PriceTable {
    /// Sorts by date; a later bar for an already-seen date replaces the earlier one.
    pub fn new(bars: Vec<PriceBar>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
        for bar in bars {
            by_date.insert(bar.date, bar);
        }
        Self {
            bars: by_date.into_values().collect(),
        }
    }

    /// Builds a table from source rows stamped in any timestamp shape.
    pub fn from_stamped<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (BarTimestamp, PriceBar)>,
    {
        Self::new(
            rows.into_iter()
                .map(|(ts, mut bar)| {
                    bar.date = ts.utc_date();
                    bar
                })
                .collect(),
        )
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Dated closes with undefined values dropped.
    pub fn closes(&self) -> Vec<PricePoint> {
        self.bars
            .iter()
            .filter_map(|bar| {
                bar.valid_close().map(|price| PricePoint {
                    date: bar.date,
                    price,
                })
            })
            .collect()
    }

    pub fn has_any_close(&self) -> bool {
        self.bars.iter().any(|bar| bar.valid_close().is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub const ALL: [PriceField; 5] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
        PriceField::Volume,
    ];

    fn slot(self, bar: &mut PriceBar) -> &mut Option<f64> {
        match self {
            PriceField::Open => &mut bar.open,
            PriceField::High => &mut bar.high,
            PriceField::Low => &mut bar.low,
            PriceField::Close => &mut bar.close,
            PriceField::Volume => &mut bar.volume,
        }
    }

    fn get(self, bar: &PriceBar) -> Option<f64> {
        match self {
            PriceField::Open => bar.open,
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume,
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
            PriceField::Volume => "Volume",
        };
        f.write_str(name)
    }
}

/// Multi-symbol result keyed by field, then symbol, then date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchTable {
    columns: BTreeMap<PriceField, BTreeMap<String, BTreeMap<NaiveDate, f64>>>,
}

impl BatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: PriceField, symbol: &str, date: NaiveDate, value: f64) {
        self.columns
            .entry(field)
            .or_default()
            .entry(symbol.to_string())
            .or_default()
            .insert(date, value);
    }

    /// Spreads a single symbol's table into the batch layout.
    pub fn insert_table(&mut self, symbol: &str, table: &PriceTable) {
        for bar in table.bars() {
            for field in PriceField::ALL {
                if let Some(v) = field.get(bar) {
                    self.insert(field, symbol, bar.date, v);
                }
            }
        }
    }

    /// Symbols present under any field.
    pub fn symbols(&self) -> BTreeSet<&str> {
        self.columns
            .values()
            .flat_map(|by_symbol| by_symbol.keys().map(String::as_str))
            .collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.values().any(|m| m.contains_key(symbol))
    }

    pub fn is_empty(&self) -> bool {
        self.columns
            .values()
            .all(|by_symbol| by_symbol.values().all(BTreeMap::is_empty))
    }

    /// The flat table for one symbol; empty when the symbol is absent.
    pub fn slice(&self, symbol: &str) -> PriceTable {
        let mut rows: BTreeMap<NaiveDate, PriceBar> = BTreeMap::new();
        for (field, by_symbol) in &self.columns {
            let Some(series) = by_symbol.get(symbol) else {
                continue;
            };
            for (&date, &value) in series {
                let bar = rows.entry(date).or_insert_with(|| PriceBar::new(date));
                *field.slot(bar) = Some(value);
            }
        }
        PriceTable {
            bars: rows.into_values().collect(),
        }
    }
}

/// What a data source returns: one symbol's table or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketTable {
    Single(PriceTable),
    Batch(BatchTable),
}

impl MarketTable {
    /// The flat table for `symbol`. A single-symbol table is returned as is.
    pub fn extract(&self, symbol: &str) -> PriceTable {
        match self {
            MarketTable::Single(table) => table.clone(),
            MarketTable::Batch(batch) => batch.slice(symbol),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MarketTable::Single(table) => table.is_empty(),
            MarketTable::Batch(batch) => batch.is_empty(),
        }
    }
}
