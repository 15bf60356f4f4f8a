//! Error types for the SSM/T-2 converter library.

use thiserror::Error as ThisError;

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when converting SSM/T-2 or CFSR files.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Missing or malformed command arguments (e.g. wrong input suffix)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The input does not follow the expected header/record layout
    #[error("Invalid T2 format: {0}")]
    Format(#[from] FormatError),

    /// I/O error occurred while reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// Decoded arrays do not match the output schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Violations of the `.T2` file layout.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum FormatError {
    #[error("no header sentinel found before end of file")]
    SentinelNotFound,

    #[error("header is empty")]
    EmptyHeader,

    #[error("header field '{0}' not found")]
    MissingField(&'static str),

    #[error("header field '{field}' has unparseable value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("ambiguous header line '{0}'")]
    AmbiguousLine(String),

    #[error("record layout is {layout} bytes but header declares {header} bytes per record")]
    RecordSizeMismatch { layout: usize, header: usize },

    #[error("data region ends at byte {expected} but input is only {actual} bytes")]
    Truncated { expected: usize, actual: usize },

    #[error("input exhausted in record {record} while reading '{field}'")]
    ShortRead { record: usize, field: &'static str },

    #[error("decoder stopped at byte {position}, expected data region end at {expected}")]
    MisalignedEnd { position: usize, expected: usize },
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
