//! Domain error types.

/// Top-level error type for signalbench.
#[derive(Debug, thiserror::Error)]
pub enum SignalbenchError {
    #[error("missing indicator column `{column}`")]
    MissingIndicator { column: String },

    #[error("invalid quantity {quantity}: must be a positive, finite number")]
    InvalidQuantity { quantity: f64 },

    #[error("unknown strategy `{name}`")]
    UnknownStrategy { name: String },

    #[error("bars out of order at row {index}: timestamps must be strictly increasing")]
    UnorderedBars { index: usize },

    #[error("column `{column}` has {actual} rows, table has {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

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

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("failed to fetch {symbol}: {reason}")]
    DataFetch { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("order rejected for {symbol}: {reason}")]
    OrderRejected { symbol: String, reason: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalbenchError {
    /// Errors worth retrying: the data source may answer on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SignalbenchError::DataFetch { .. } | SignalbenchError::Io(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignalbenchError::MissingIndicator { .. }
                | SignalbenchError::InvalidQuantity { .. }
                | SignalbenchError::UnknownStrategy { .. }
                | SignalbenchError::UnorderedBars { .. }
                | SignalbenchError::ColumnLength { .. }
                | SignalbenchError::ConfigParse { .. }
                | SignalbenchError::ConfigMissing { .. }
                | SignalbenchError::ConfigInvalid { .. }
                | SignalbenchError::InsufficientData { .. }
        )
    }
}

impl From<&SignalbenchError> for std::process::ExitCode {
    fn from(err: &SignalbenchError) -> Self {
        let code: u8 = match err {
            SignalbenchError::Io(_) => 1,
            SignalbenchError::ConfigParse { .. }
            | SignalbenchError::ConfigMissing { .. }
            | SignalbenchError::ConfigInvalid { .. }
            | SignalbenchError::UnknownStrategy { .. } => 2,
            SignalbenchError::MissingIndicator { .. }
            | SignalbenchError::InvalidQuantity { .. }
            | SignalbenchError::UnorderedBars { .. }
            | SignalbenchError::ColumnLength { .. } => 3,
            SignalbenchError::DataFetch { .. }
            | SignalbenchError::NoData { .. }
            | SignalbenchError::InsufficientData { .. } => 5,
            SignalbenchError::OrderRejected { .. } | SignalbenchError::Broker { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
