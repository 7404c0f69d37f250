//! Data acquisition port trait.

use crate::domain::error::TickerboardError;
use crate::domain::table::MarketTable;
use chrono::NaiveDate;

/// Supplier of raw daily bars, one symbol at a time or in a batch.
///
/// Implementations return whatever shape they naturally produce; callers slice
/// with [`MarketTable::extract`].
pub trait DataPort {
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError>;

    fn fetch_batch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketTable, TickerboardError>;
}
