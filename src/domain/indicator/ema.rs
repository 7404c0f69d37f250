//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No warmup: every bar carries a value from the first one on.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub fn calculate_ema(closes: &[PricePoint], span: usize) -> IndicatorSeries {
    if span == 0 || closes.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: Vec::new(),
        };
    }

    let prices: Vec<f64> = closes.iter().map(|p| p.price).collect();
    let smoothed = exponential_average(&prices, smoothing_factor(span));

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: closes
            .iter()
            .zip(smoothed)
            .map(|(p, value)| IndicatorPoint {
                date: p.date,
                value,
            })
            .collect(),
    }
}

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Recursive exponential average seeded with the first input, no bias correction.
pub fn exponential_average(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    let mut avg = first;
    out.push(avg);
    for &v in iter {
        avg = v * alpha + avg * (1.0 - alpha);
        out.push(avg);
    }
    out
}
