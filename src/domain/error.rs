//! Domain error types.

/// Top-level error type for tickerboard.
#[derive(Debug, thiserror::Error)]
pub enum TickerboardError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("{reason}")]
    InsufficientData { symbol: String, reason: String },

    #[error("{reason}")]
    Alignment { symbol: String, reason: String },

    #[error("Failed to fetch data for {symbol} after {attempts} attempts.")]
    RetriesExhausted {
        symbol: String,
        attempts: u32,
        last_reason: String,
    },

    #[error("{reason}")]
    Computation { symbol: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TickerboardError {
    pub fn data_source(reason: impl Into<String>) -> Self {
        TickerboardError::DataSource {
            reason: reason.into(),
        }
    }

    /// Whether a fetch that failed this way is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TickerboardError::DataSource { .. }
                | TickerboardError::NoData { .. }
                | TickerboardError::InsufficientData { .. }
                | TickerboardError::Io(_)
        )
    }
}

impl From<&TickerboardError> for std::process::ExitCode {
    fn from(err: &TickerboardError) -> Self {
        let code: u8 = match err {
            TickerboardError::Io(_) => 1,
            TickerboardError::ConfigParse { .. }
            | TickerboardError::ConfigMissing { .. }
            | TickerboardError::ConfigInvalid { .. } => 2,
            TickerboardError::DataSource { .. } | TickerboardError::RetriesExhausted { .. } => 3,
            TickerboardError::Computation { .. } => 4,
            TickerboardError::NoData { .. }
            | TickerboardError::InsufficientData { .. }
            | TickerboardError::Alignment { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
