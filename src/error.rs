#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    General(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

impl From<toml::de::Error> for SummaryError {
    fn from(err: toml::de::Error) -> Self {
        SummaryError::Config(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<SummaryError> for PyErr {
    fn from(err: SummaryError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<PyErr> for SummaryError {
    fn from(err: PyErr) -> Self {
        SummaryError::General(err.to_string())
    }
}
