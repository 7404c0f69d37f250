//! Retry decorator for any [`DataPort`].
//!
//! Retries on an empty result, a missing or all-undefined close column, a
//! requested symbol absent from a batched result, and on retryable errors from
//! the wrapped source. Single-symbol results come back already sliced to the
//! requested symbol.

use crate::domain::error::TickerboardError;
use crate::domain::retry::{AttemptError, Backoff, RetryError, RetryPolicy, Sleeper};
use crate::domain::table::MarketTable;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;

pub struct RetryingDataPort<P, B, S> {
    inner: P,
    policy: RetryPolicy<B>,
    sleeper: S,
}

fn classify(err: TickerboardError) -> AttemptError<TickerboardError> {
    if err.is_retryable() {
        AttemptError::Retry(err.to_string())
    } else {
        AttemptError::Abort(err)
    }
}

fn terminal(symbol: &str, err: RetryError<TickerboardError>) -> TickerboardError {
    match err {
        RetryError::Exhausted {
            attempts,
            last_reason,
        } => TickerboardError::RetriesExhausted {
            symbol: symbol.to_string(),
            attempts,
            last_reason,
        },
        RetryError::Aborted(e) => e,
    }
}

/// Why a single-symbol result is unusable, if it is.
fn unusable(market: &MarketTable, symbol: &str) -> Option<String> {
    if market.is_empty() {
        return Some(format!("empty result for {symbol}"));
    }
    if let MarketTable::Batch(batch) = market {
        if !batch.contains(symbol) {
            return Some(format!("{symbol} absent from batched result"));
        }
    }
    if !market.extract(symbol).has_any_close() {
        return Some(format!("no valid close prices for {symbol}"));
    }
    None
}

impl<P, B, S> RetryingDataPort<P, B, S>
where
    P: DataPort,
    B: Backoff,
    S: Sleeper,
{
    pub fn new(inner: P, policy: RetryPolicy<B>, sleeper: S) -> Self {
        Self {
            inner,
            policy,
            sleeper,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P, B, S> DataPort for RetryingDataPort<P, B, S>
where
    P: DataPort,
    B: Backoff,
    S: Sleeper,
{
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        self.policy
            .run(&self.sleeper, |attempt| {
                tracing::debug!(%symbol, attempt = attempt + 1, "fetching history");
                let market = self
                    .inner
                    .fetch_history(symbol, start, end)
                    .map_err(classify)?;
                match unusable(&market, symbol) {
                    Some(reason) => Err(AttemptError::Retry(reason)),
                    None => Ok(MarketTable::Single(market.extract(symbol))),
                }
            })
            .map_err(|e| terminal(symbol, e))
    }

    fn fetch_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError> {
        self.policy
            .run(&self.sleeper, |attempt| {
                tracing::debug!(symbols = symbols.len(), attempt = attempt + 1, "fetching batch");
                let market = self
                    .inner
                    .fetch_batch(symbols, start, end)
                    .map_err(classify)?;
                if market.is_empty() {
                    return Err(AttemptError::Retry("empty batch result".into()));
                }
                Ok(market)
            })
            .map_err(|e| terminal("batch", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::retry::testing::RecordingSleeper;
    use crate::domain::retry::LinearBackoff;
    use crate::domain::table::{BatchTable, PriceField, PriceTable};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays scripted responses in order, then keeps failing.
    struct Scripted {
        responses: RefCell<VecDeque<Result<MarketTable, TickerboardError>>>,
        calls: Cell<u32>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<MarketTable, TickerboardError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: Cell::new(0),
            }
        }

        fn next(&self) -> Result<MarketTable, TickerboardError> {
            self.calls.set(self.calls.get() + 1);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TickerboardError::data_source("script exhausted")))
        }
    }

    impl DataPort for Scripted {
        fn fetch_history(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<MarketTable, TickerboardError> {
            self.next()
        }

        fn fetch_batch(
            &self,
            _symbols: &[String],
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<MarketTable, TickerboardError> {
            self.next()
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn good_table() -> PriceTable {
        PriceTable::new(vec![PriceBar::flat(date(1), 1.0), PriceBar::flat(date(2), 2.0)])
    }

    fn no_close_table() -> PriceTable {
        let mut bar = PriceBar::new(date(1));
        bar.volume = Some(10.0);
        PriceTable::new(vec![bar])
    }

    fn wrap(inner: Scripted) -> RetryingDataPort<Scripted, LinearBackoff, RecordingSleeper> {
        RetryingDataPort::new(
            inner,
            RetryPolicy {
                max_attempts: 3,
                backoff: LinearBackoff {
                    base: Duration::from_millis(100),
                },
            },
            RecordingSleeper::default(),
        )
    }

    #[test]
    fn first_good_result_passes_through() {
        let port = wrap(Scripted::new(vec![Ok(MarketTable::Single(good_table()))]));
        let market = port.fetch_history("AAPL", date(1), date(31)).unwrap();
        assert_eq!(market, MarketTable::Single(good_table()));
        assert_eq!(port.inner().calls.get(), 1);
        assert!(port.sleeper.sleeps.borrow().is_empty());
    }

    #[test]
    fn retries_empty_and_closeless_results() {
        let port = wrap(Scripted::new(vec![
            Ok(MarketTable::Single(PriceTable::default())),
            Ok(MarketTable::Single(no_close_table())),
            Ok(MarketTable::Single(good_table())),
        ]));
        assert!(port.fetch_history("AAPL", date(1), date(31)).is_ok());
        assert_eq!(port.inner().calls.get(), 3);
        assert_eq!(
            *port.sleeper.sleeps.borrow(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn batch_without_symbol_is_retried_then_sliced() {
        let mut other = BatchTable::new();
        other.insert(PriceField::Close, "MSFT", date(1), 5.0);
        let mut wanted = BatchTable::new();
        wanted.insert_table("AAPL", &good_table());
        wanted.insert(PriceField::Close, "MSFT", date(1), 5.0);

        let port = wrap(Scripted::new(vec![
            Ok(MarketTable::Batch(other)),
            Ok(MarketTable::Batch(wanted)),
        ]));
        let market = port.fetch_history("AAPL", date(1), date(31)).unwrap();
        assert_eq!(market, MarketTable::Single(good_table()));
        assert_eq!(port.inner().calls.get(), 2);
    }

    #[test]
    fn exhaustion_is_terminal_error() {
        let port = wrap(Scripted::new(vec![
            Err(TickerboardError::data_source("timeout")),
            Err(TickerboardError::data_source("timeout")),
            Err(TickerboardError::data_source("reset")),
        ]));
        let err = port.fetch_history("AAPL", date(1), date(31)).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch data for AAPL after 3 attempts.");
        assert!(matches!(
            err,
            TickerboardError::RetriesExhausted { last_reason, .. } if last_reason.contains("reset")
        ));
        assert_eq!(port.inner().calls.get(), 3);
    }

    #[test]
    fn non_retryable_error_aborts() {
        let port = wrap(Scripted::new(vec![Err(TickerboardError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })]));
        let err = port.fetch_history("AAPL", date(1), date(31)).unwrap_err();
        assert!(matches!(err, TickerboardError::ConfigMissing { .. }));
        assert_eq!(port.inner().calls.get(), 1);
    }

    #[test]
    fn empty_batch_is_retried() {
        let mut batch = BatchTable::new();
        batch.insert_table("AAPL", &good_table());
        let port = wrap(Scripted::new(vec![
            Ok(MarketTable::Batch(BatchTable::new())),
            Ok(MarketTable::Batch(batch)),
        ]));
        let symbols = vec!["AAPL".to_string()];
        let market = port.fetch_batch(&symbols, date(1), date(31)).unwrap();
        assert_eq!(market.extract("AAPL"), good_table());
        assert_eq!(port.inner().calls.get(), 2);
    }

    #[test]
    fn batch_exhaustion() {
        let port = wrap(Scripted::new(vec![]));
        let symbols = vec!["AAPL".to_string()];
        let err = port.fetch_batch(&symbols, date(1), date(31)).unwrap_err();
        assert!(matches!(err, TickerboardError::RetriesExhausted { attempts: 3, .. }));
    }
}
