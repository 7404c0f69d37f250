//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//! - `IndicatorSet`: The dashboard ladder (EMA 13/21/50/100/200 + RSI 14) per date

pub mod ema;
pub mod rsi;

use crate::domain::ohlcv::PricePoint;
use chrono::NaiveDate;
use std::fmt;

pub const EMA_SPANS: [usize; 5] = [13, 21, 50, 100, 200];
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Rsi(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
        }
    }
}

/// Indicator values for one date of the close series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub ema13: f64,
    pub ema21: f64,
    pub ema50: f64,
    pub ema100: f64,
    pub ema200: f64,
    pub rsi14: f64,
}

impl IndicatorRow {
    pub fn get(&self, indicator: IndicatorType) -> Option<f64> {
        match indicator {
            IndicatorType::Ema(13) => Some(self.ema13),
            IndicatorType::Ema(21) => Some(self.ema21),
            IndicatorType::Ema(50) => Some(self.ema50),
            IndicatorType::Ema(100) => Some(self.ema100),
            IndicatorType::Ema(200) => Some(self.ema200),
            IndicatorType::Rsi(RSI_PERIOD) => Some(self.rsi14),
            _ => None,
        }
    }
}

/// The full indicator ladder, one row per date of the source closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Runs every ladder indicator over `closes`. Empty input yields an empty set.
pub fn compute_indicators(closes: &[PricePoint]) -> IndicatorSet {
    if closes.is_empty() {
        return IndicatorSet::default();
    }

    let [e13, e21, e50, e100, e200] = EMA_SPANS.map(|span| ema::calculate_ema(closes, span));
    let rsi = rsi::calculate_rsi(closes, RSI_PERIOD);

    let rows = closes
        .iter()
        .enumerate()
        .map(|(i, p)| IndicatorRow {
            date: p.date,
            ema13: e13.values[i].value,
            ema21: e21.values[i].value,
            ema50: e50.values[i].value,
            ema100: e100.values[i].value,
            ema200: e200.values[i].value,
            rsi14: rsi.values[i].value,
        })
        .collect();

    IndicatorSet { rows }
}
