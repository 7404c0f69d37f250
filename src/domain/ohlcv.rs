//! Daily OHLCV bar representation.
//!
//! Every field may be undefined: sources routinely deliver rows where some or all
//! columns are blank (holidays, partial prints, batch padding).

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    /// Bar whose open/high/low/close all equal `close`.
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: None,
        }
    }

    /// The close, if it is a usable number.
    pub fn valid_close(&self) -> Option<f64> {
        defined(self.close)
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_none()
            && self.high.is_none()
            && self.low.is_none()
            && self.close.is_none()
            && self.volume.is_none()
    }
}

/// A single dated price, the unit the analytics operate on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// `Some(v)` only when `v` is a finite number.
pub fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
