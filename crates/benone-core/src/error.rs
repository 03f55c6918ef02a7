use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a source could not be analyzed as a table at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrongFileCause {
    NotExists,
    Corrupted,
}

impl fmt::Display for WrongFileCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrongFileCause::NotExists => f.write_str("does not exist"),
            WrongFileCause::Corrupted => f.write_str("is corrupted"),
        }
    }
}

/// Error type for opening, parsing and querying an analysis.
///
/// `SourceNotFound`, `WrongFile`, `Io` and `Csv` abort an analysis; `WrongLetter` and
/// `WrongColumn` only come from accessors on an already built record.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("file {} does not exist", .0.display())]
    SourceNotFound(PathBuf),
    #[error("file {} {}", .path.display(), .cause)]
    WrongFile { path: PathBuf, cause: WrongFileCause },
    #[error("wrong letter = {0}, digits allowed only")]
    WrongLetter(String),
    #[error("wrong column = {0}, not present in counters")]
    WrongColumn(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    pub(crate) fn corrupted(path: impl Into<PathBuf>) -> Self {
        AnalysisError::WrongFile {
            path: path.into(),
            cause: WrongFileCause::Corrupted,
        }
    }

    /// Point a `WrongFile` error at `path` instead of the name it was parsed under.
    pub(crate) fn at_path(self, path: &Path) -> Self {
        match self {
            AnalysisError::WrongFile { cause, .. } => AnalysisError::WrongFile {
                path: path.to_path_buf(),
                cause,
            },
            other => other,
        }
    }
}

/// Error type for the content-id keyed analysis store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("analysis has been already done, id = {0}")]
    AlreadyExists(String),
    #[error("file {} changed while it was being analyzed", .0.display())]
    SourceChanged(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Error type for loading the application config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("config {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
