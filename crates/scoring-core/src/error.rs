use thiserror::Error;

/// Failures raised by the collaborators around the scoring engine.
///
/// The engine itself never fails. Everything here is surfaced before it is
/// invoked, so callers can tell "no data" apart from a transport problem.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No data for symbol: {0}")]
    NotFound(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl DataError {
    /// True when the error means "this symbol has no usable record".
    pub fn is_no_data(&self) -> bool {
        matches!(self, DataError::NotFound(_) | DataError::InvalidData(_))
    }
}

pub type DataResult<T> = Result<T, DataError>;
