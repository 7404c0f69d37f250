//! Core domain types and logic.

pub mod ohlcv;
pub mod timestamp;
pub mod table;
pub mod period;
pub mod indicator;
pub mod crossover;
pub mod performance;
pub mod benchmark;
pub mod symbol;
pub mod universe;
pub mod dashboard;
pub mod retry;
pub mod config_validation;
pub mod error;
