//! Error type shared by every pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`PipelineError`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Parse,
    Io,
    Config,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("network request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid delay range {min}..={max} seconds")]
    InvalidDelay { min: f64, max: f64 },
    #[error("invalid URL {url}")]
    InvalidUrl { url: String },
    #[error("access denied (403 Forbidden) for {url}")]
    AccessDenied { url: String },
    #[error("HTTP {status} returned for {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV is missing expected columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    #[error("unparseable SETTLEMENTDATE {value:?} on line {line}")]
    InvalidTimestamp { line: u64, value: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Network { .. } | PipelineError::InvalidUrl { .. } => {
                ErrorKind::Network
            }
            PipelineError::AccessDenied { .. } | PipelineError::HttpStatus { .. } => {
                ErrorKind::HttpStatus
            }
            PipelineError::Csv(_)
            | PipelineError::MissingColumns { .. }
            | PipelineError::InvalidTimestamp { .. } => ErrorKind::Parse,
            PipelineError::Io { .. } | PipelineError::Workbook(_) => ErrorKind::Io,
            PipelineError::InvalidDelay { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
