use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

pub type BeatmapResult<T> = Result<T, BeatmapError>;

/// Failures while reading beatmap input. Curve flattening itself never fails.
#[derive(Debug, Error)]
pub enum BeatmapError {
    #[error("failed to read beatmap file: {0}")]
    Io(#[from] std::io::Error),
    #[error("beatmap has no [{0}] section")]
    MissingSection(&'static str),
    #[error("expected at least {expected} fields, found {found}")]
    MissingField { expected: usize, found: usize },
    #[error("invalid number: {0}")]
    InvalidFloat(#[from] ParseFloatError),
    #[error("invalid integer: {0}")]
    InvalidInt(#[from] ParseIntError),
    #[error("invalid curve token `{0}`")]
    InvalidCurve(String),
}

#[cfg(feature = "python")]
impl From<BeatmapError> for pyo3::PyErr {
    fn from(err: BeatmapError) -> Self {
        match err {
            BeatmapError::Io(_) => pyo3::exceptions::PyIOError::new_err(err.to_string()),
            _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
        }
    }
}
