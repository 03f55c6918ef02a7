//! Application configuration, loaded from a JSON file.
//!
//! Every key is optional. Keys may be written in lower snake case or in the
//! upper-case form older config files used (`UPLOAD_FOLDER`, ...).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_UPLOAD_FOLDER: &str = "data/users_files";
pub const DEFAULT_ANALYSES_DB: &str = "data/analyses.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where previously uploaded files live, by name.
    #[serde(alias = "UPLOAD_FOLDER")]
    pub upload_folder: PathBuf,
    /// JSON file backing the analysis store.
    #[serde(alias = "ANALYSES_DB")]
    pub analyses_db: PathBuf,
    /// Format hint used when none is given; empty means detect by suffix.
    #[serde(alias = "DEFAULT_FORMAT")]
    pub default_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            upload_folder: PathBuf::from(DEFAULT_UPLOAD_FOLDER),
            analyses_db: PathBuf::from(DEFAULT_ANALYSES_DB),
            default_format: String::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
