pub mod analyze;
pub mod check;
pub mod formats;
pub mod identity;

use std::path::{Path, PathBuf};

use benone_core::{AppConfig, Format};

/// Print `msg` to stderr and exit with status 1.
pub fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

/// Load the config file if one was given; defaults otherwise.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config = AppConfig::load_or_default(path.map(Path::new)).unwrap_or_else(|e| fail(e));
    log::debug!("config: {config:?}");
    config
}

/// Format hint from the command line, falling back to the configured default.
/// Unknown hints are passed through (and end up ignored) with a warning.
pub fn format_hint(flag: Option<&str>, config: &AppConfig) -> String {
    let hint = flag.unwrap_or(&config.default_format).to_string();
    if !hint.is_empty() && Format::from_extension(&hint).is_none() {
        eprintln!(
            "Warning: unknown format '{hint}', detecting from file suffix (supported: {})",
            benone_core::SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    hint
}

/// Store location from the command line, falling back to the configured one.
pub fn store_path(flag: Option<&str>, config: &AppConfig) -> PathBuf {
    flag.map(PathBuf::from)
        .unwrap_or_else(|| config.analyses_db.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hint_prefers_flag() {
        let config = AppConfig {
            default_format: ".tsv".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(format_hint(Some(".csv"), &config), ".csv");
        assert_eq!(format_hint(None, &config), ".tsv");
    }

    #[test]
    fn test_format_hint_empty_by_default() {
        assert_eq!(format_hint(None, &AppConfig::default()), "");
    }

    #[test]
    fn test_store_path_fallback() {
        let config = AppConfig::default();
        assert_eq!(store_path(None, &config), config.analyses_db);
        assert_eq!(store_path(Some("x.json"), &config), PathBuf::from("x.json"));
    }

    #[test]
    fn test_load_config_default() {
        assert_eq!(load_config(None), AppConfig::default());
    }
}
