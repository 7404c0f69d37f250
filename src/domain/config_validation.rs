//! Configuration validation and the typed values built from it.
//!
//! Validates every section before a dashboard runs, so a bad file fails fast
//! with the section and key named.

use crate::domain::error::TickerboardError;
use crate::domain::period::Period;
use crate::domain::retry::{LinearJitterBackoff, RetryPolicy};
use crate::domain::universe::{
    parse_assets, parse_market, Universe, UniverseError, DEFAULT_BENCHMARK,
};
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: i64 = 3;
pub const DEFAULT_BASE_DELAY_MS: i64 = 1000;
pub const DEFAULT_JITTER_MIN_MS: i64 = 100;
pub const DEFAULT_JITTER_MAX_MS: i64 = 500;
pub const MAX_ATTEMPTS_LIMIT: i64 = 20;
pub const MAX_DELAY_MS: i64 = 60_000;
pub const DEFAULT_DRAWDOWN_PERIOD: &str = "1y";
pub const DEFAULT_CHANGE_PERIOD: &str = "1d";

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), TickerboardError> {
    load_universe(config)?;
    validate_data(config)?;
    load_retry_policy(config)?;
    validate_period(config, "drawdown_period")?;
    validate_period(config, "change_period")?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TickerboardError {
    TickerboardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, TickerboardError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(TickerboardError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn universe_error(key: &str, err: UniverseError) -> TickerboardError {
    invalid("universe", key, err.to_string())
}

/// Market and asset lists plus the benchmark symbol from `[universe]`.
pub fn load_universe(config: &dyn ConfigPort) -> Result<Universe, TickerboardError> {
    let market = parse_market(&required(config, "universe", "market")?)
        .map_err(|e| universe_error("market", e))?;
    let assets = parse_assets(&required(config, "universe", "assets")?)
        .map_err(|e| universe_error("assets", e))?;

    let benchmark = match config.get_string("universe", "benchmark") {
        None => DEFAULT_BENCHMARK.to_string(),
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.contains(',') || trimmed.contains(':') {
                return Err(invalid(
                    "universe",
                    "benchmark",
                    "benchmark must be a single symbol",
                ));
            }
            trimmed.to_string()
        }
    };

    Ok(Universe::new(market, assets, &benchmark))
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), TickerboardError> {
    required(config, "data", "csv_dir").map(|_| ())
}

fn retry_int(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, TickerboardError> {
    config
        .get_int("retry", key)
        .map(|value| value.unwrap_or(default))
        .map_err(|e| invalid("retry", key, format!("{key} must be an integer: {e}")))
}

fn delay_ms(config: &dyn ConfigPort, key: &str, default: i64) -> Result<u64, TickerboardError> {
    let value = retry_int(config, key, default)?;
    if !(0..=MAX_DELAY_MS).contains(&value) {
        return Err(invalid(
            "retry",
            key,
            format!("{key} must be between 0 and {MAX_DELAY_MS}"),
        ));
    }
    u64::try_from(value).map_err(|_| invalid("retry", key, format!("{key} must be non-negative")))
}

/// Retry policy from `[retry]`, every key optional.
pub fn load_retry_policy(
    config: &dyn ConfigPort,
) -> Result<RetryPolicy<LinearJitterBackoff>, TickerboardError> {
    let max_attempts = retry_int(config, "max_attempts", DEFAULT_MAX_ATTEMPTS)?;
    let max_attempts = u32::try_from(max_attempts)
        .ok()
        .filter(|&n| (1..=MAX_ATTEMPTS_LIMIT).contains(&i64::from(n)))
        .ok_or_else(|| {
            invalid(
                "retry",
                "max_attempts",
                format!("max_attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}"),
            )
        })?;

    let base = delay_ms(config, "base_delay_ms", DEFAULT_BASE_DELAY_MS)?;
    let jitter_min = delay_ms(config, "jitter_min_ms", DEFAULT_JITTER_MIN_MS)?;
    let jitter_max = delay_ms(config, "jitter_max_ms", DEFAULT_JITTER_MAX_MS)?;
    if jitter_max < jitter_min {
        return Err(invalid(
            "retry",
            "jitter_max_ms",
            "jitter_max_ms must not be below jitter_min_ms",
        ));
    }

    Ok(RetryPolicy {
        max_attempts,
        backoff: LinearJitterBackoff {
            base: Duration::from_millis(base),
            jitter_min: Duration::from_millis(jitter_min),
            jitter_max: Duration::from_millis(jitter_max),
        },
    })
}

fn validate_period(config: &dyn ConfigPort, key: &str) -> Result<(), TickerboardError> {
    match config.get_string("dashboard", key) {
        Some(token) if Period::from_token(&token).is_none() => Err(invalid(
            "dashboard",
            key,
            format!("unknown period '{}'", token.trim()),
        )),
        _ => Ok(()),
    }
}

/// Configured default period token, falling back to `default`.
pub fn period_token(config: &dyn ConfigPort, key: &str, default: &str) -> String {
    config
        .get_string("dashboard", key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
