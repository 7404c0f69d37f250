//! End-to-end dashboard aggregation over an in-memory data source.
//!
//! Tests cover:
//! - Market/asset partition with a symbol in both lists
//! - Symbols missing from the batch and total batch failure
//! - Benchmark-relative performance and benchmark degradation
//! - Determinism and the serialized payload shape
//! - The single-symbol path through the retry decorator

mod common;

use approx::assert_relative_eq;
use common::*;
use std::cell::RefCell;
use std::time::Duration;
use tickerboard::adapters::retrying_adapter::RetryingDataPort;
use tickerboard::domain::dashboard::{Dashboard, DashboardPayload, DashboardRequest, BATCH_FAILED};
use tickerboard::domain::performance::period_change;
use tickerboard::domain::period::Period;
use tickerboard::domain::retry::{LinearBackoff, RetryPolicy, Sleeper};
use tickerboard::domain::symbol::{Signal, SymbolResult};

fn request() -> DashboardRequest {
    DashboardRequest::new("1y", "1d", as_of())
}

fn build(port: &MockDataPort) -> DashboardPayload {
    Dashboard::new(sample_universe(), port).build(&request())
}

fn report(result: &SymbolResult) -> &tickerboard::domain::symbol::SymbolReport {
    match result.report() {
        Some(r) => r,
        None => panic!("{} is an error record: {:?}", result.name(), result.error()),
    }
}

#[derive(Default)]
struct NoSleep {
    sleeps: RefCell<Vec<Duration>>,
}

impl Sleeper for NoSleep {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

mod aggregation {
    use super::*;

    #[test]
    fn partitions_market_and_assets() {
        let payload = build(&sample_port());

        let market: Vec<&str> = payload.market_data.keys().map(String::as_str).collect();
        let assets: Vec<&str> = payload.asset_data.keys().map(String::as_str).collect();
        assert_eq!(market, vec!["SPY", "^DJI"]);
        assert_eq!(assets, vec!["AAPL", "BTC-USD", "SPY"]);

        // One computation shared by both maps.
        assert_eq!(payload.market_data["SPY"], payload.asset_data["SPY"]);
    }

    #[test]
    fn identities_follow_universe() {
        let payload = build(&sample_port());

        let dji = report(&payload.market_data["^DJI"]);
        assert_eq!(dji.display_name, "Dow Jones");
        assert_eq!(dji.asset_type, "Dow Jones");

        let aapl = report(&payload.asset_data["AAPL"]);
        assert_eq!(aapl.display_name, "AAPL");
        assert_eq!(aapl.asset_type, "Stock");

        let spy = report(&payload.asset_data["SPY"]);
        assert_eq!(spy.asset_type, "SPY");
    }

    #[test]
    fn symbol_absent_from_batch_is_error_record() {
        let payload = build(&sample_port());

        let btc = &payload.asset_data["BTC-USD"];
        assert_eq!(btc.error(), Some("No valid Close prices for processing."));
        assert_eq!(btc.display_name(), "BTC-USD");

        assert!(payload.asset_data["AAPL"].error().is_none());
        assert!(payload.market_data["^DJI"].error().is_none());
    }

    #[test]
    fn total_batch_failure_marks_every_symbol() {
        let port = sample_port().with_batch_error("connection reset");
        let payload = build(&port);

        for result in payload.market_data.values().chain(payload.asset_data.values()) {
            assert_eq!(result.error(), Some(BATCH_FAILED));
        }
        assert_eq!(payload.market_data["^DJI"].display_name(), "Dow Jones");
        assert_eq!(payload.market_data.len(), 2);
        assert_eq!(payload.asset_data.len(), 3);
        // Benchmark comes from its own fetch.
        assert!(!payload.benchmark_1y_history.is_empty());
    }

    #[test]
    fn one_batch_and_one_benchmark_fetch() {
        let port = sample_port();
        build(&port);
        assert_eq!(port.batch_calls.get(), 1);
        assert_eq!(port.history_calls.get(), 1);
    }

    #[test]
    fn rising_series_signal_buy() {
        let payload = build(&sample_port());
        let aapl = report(&payload.asset_data["AAPL"]);
        assert_eq!(aapl.ema_signal, Some(Signal::Buy));
        assert_eq!(aapl.ema_long_signal, Some(Signal::Buy));
        assert_eq!(aapl.current_drawdown_pct, Some(0.0));
        assert!(aapl.drawdown_history_values.iter().all(|&v| v == 0.0));
    }
}

mod benchmark {
    use super::*;

    #[test]
    fn relative_performance_against_benchmark() {
        let port = sample_port();
        let payload = build(&port);

        let spy_change = period_change(&port.tables["SPY"].closes(), Period::OneYear);
        let aapl_change = period_change(&port.tables["AAPL"].closes(), Period::OneYear);

        let aapl = report(&payload.asset_data["AAPL"]);
        assert_relative_eq!(aapl.relative_perf_1y.unwrap(), aapl_change - spy_change);

        let spy = report(&payload.market_data["SPY"]);
        assert_eq!(spy.relative_perf_1y, Some(0.0));
    }

    #[test]
    fn benchmark_history_is_one_year_cumulative_return() {
        let payload = build(&sample_port());
        let history = &payload.benchmark_1y_history;
        assert_eq!(history.dates.len(), history.values.len());
        assert_eq!(history.values[0], 0.0);
        assert_eq!(history.dates.last(), Some(&last_day()));
        assert_eq!(history.dates[0], date(2023, 6, 15));
    }

    #[test]
    fn benchmark_failure_degrades_relative_fields() {
        let port = sample_port().with_error("SPY", "timeout");
        let payload = build(&port);

        assert!(payload.benchmark_1y_history.is_empty());
        let aapl = report(&payload.asset_data["AAPL"]);
        assert_eq!(aapl.relative_perf_1y, None);
        // The batch still carries SPY, and it still reports zero against itself.
        let spy = report(&payload.market_data["SPY"]);
        assert_eq!(spy.relative_perf_1y, Some(0.0));
    }
}

mod determinism {
    use super::*;

    fn normalise(payload: &mut DashboardPayload) {
        let epoch = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
        for result in payload
            .market_data
            .values_mut()
            .chain(payload.asset_data.values_mut())
        {
            if let SymbolResult::Report(r) = result {
                r.last_updated = epoch;
            }
        }
    }

    #[test]
    fn same_input_same_payload() {
        let port = sample_port();
        let mut first = build(&port);
        let mut second = build(&port);
        normalise(&mut first);
        normalise(&mut second);
        assert_eq!(first, second);
    }
}

mod serialization {
    use super::*;

    const RECORD_KEYS: [&str; 31] = [
        "name",
        "display_name",
        "type",
        "latest_price",
        "daily_change_pct",
        "ema13",
        "ema21",
        "ema50",
        "ema100",
        "ema200",
        "rsi14",
        "current_drawdown_pct",
        "ema_signal",
        "ema_long_signal",
        "ema_short_last_signal_date",
        "ema_long_last_signal_date",
        "relative_perf_1y",
        "sparkline_data",
        "asset_1y_history_dates",
        "asset_1y_history_values",
        "rsi_1y_history_dates",
        "rsi_1y_history_values",
        "ema_1y_history_dates",
        "ema13_1y_history_values",
        "ema21_1y_history_values",
        "ema50_1y_history_values",
        "ema100_1y_history_values",
        "ema200_1y_history_values",
        "drawdown_history_dates",
        "drawdown_history_values",
        "last_updated",
    ];

    #[test]
    fn payload_top_level_shape() {
        let json = serde_json::to_value(build(&sample_port())).unwrap();
        let top = json.as_object().unwrap();
        let mut keys: Vec<&str> = top.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["asset_data", "market_data", "spy_1y_history"]);
        assert!(json["spy_1y_history"]["dates"].is_array());
        assert!(json["spy_1y_history"]["values"].is_array());
    }

    #[test]
    fn success_record_is_flat() {
        let json = serde_json::to_value(build(&sample_port())).unwrap();
        let aapl = json["asset_data"]["AAPL"].as_object().unwrap();

        assert_eq!(aapl.len(), RECORD_KEYS.len());
        for key in RECORD_KEYS {
            assert!(aapl.contains_key(key), "missing key {key}");
        }
        assert!(!aapl.contains_key("error"));
        assert_eq!(json["asset_data"]["AAPL"]["ema_signal"], "Buy");
        assert_eq!(
            json["asset_data"]["AAPL"]["asset_1y_history_dates"][0],
            "2023-06-15"
        );
    }

    #[test]
    fn error_record_has_three_keys() {
        let json = serde_json::to_value(build(&sample_port())).unwrap();
        let btc = json["asset_data"]["BTC-USD"].as_object().unwrap();
        let mut keys: Vec<&str> = btc.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["display_name", "error", "name"]);
    }
}

mod single_symbol {
    use super::*;

    fn retrying(
        port: MockDataPort,
    ) -> RetryingDataPort<MockDataPort, LinearBackoff, NoSleep> {
        RetryingDataPort::new(
            port,
            RetryPolicy {
                max_attempts: 3,
                backoff: LinearBackoff {
                    base: Duration::from_millis(50),
                },
            },
            NoSleep::default(),
        )
    }

    #[test]
    fn symbol_report_normalises_case() {
        let port = retrying(sample_port());
        let result = Dashboard::new(sample_universe(), &port).symbol_report(" aapl ", &request());
        let aapl = report(&result);
        assert_eq!(aapl.name, "AAPL");
        assert!(aapl.relative_perf_1y.is_some());
    }

    #[test]
    fn fetch_exhaustion_is_error_record() {
        let port = retrying(sample_port().with_error("XYZ", "HTTP 503"));
        let result = Dashboard::new(sample_universe(), &port).symbol_report("XYZ", &request());

        assert_eq!(result.error(), Some("Failed to fetch data for XYZ after 3 attempts."));
        assert_eq!(result.display_name(), "XYZ");
        // One benchmark fetch plus three attempts for XYZ.
        assert_eq!(port.inner().history_calls.get(), 4);
    }

    #[test]
    fn empty_history_is_retried_to_exhaustion() {
        let port = retrying(sample_port());
        let result = Dashboard::new(sample_universe(), &port).symbol_report("MSFT", &request());
        assert_eq!(result.error(), Some("Failed to fetch data for MSFT after 3 attempts."));
    }
}
