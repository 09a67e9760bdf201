use std::io;

pub type StatsResult<T> = Result<T, StatsError>;

/// Errors surfaced by the statistics core. Every variant is recoverable: the
/// caller renders a placeholder or asks for different input.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("row {row}: invalid value {value:?} in column {column}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("invalid grouping: {reason}")]
    InvalidGrouping { reason: String },

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("not enough data: {usable} usable point(s), need at least {required}")]
    InsufficientData { usable: usize, required: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl StatsError {
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        StatsError::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// True for the "valid request, not enough data" family that a dashboard
    /// shows as an empty-state message rather than an error.
    pub fn is_no_data(&self) -> bool {
        matches!(self, StatsError::InsufficientData { .. })
    }
}
