//! # benone-core
//!
//! **How Benford-like are the numbers in your table?**
//!
//! `benone-core` reads comma- or tab-separated files in one streaming pass and
//! builds a per-column digit profile: how often each digit occurs anywhere in a
//! field, how often it leads a field, the matching percentage distributions, and a
//! Kolmogorov-Smirnov p-value comparing each column's leading digits to Benford's
//! Law.
//!
//! ## Quick Start
//!
//! ```no_run
//! use benone_core::{CounterKind, analyze};
//!
//! let record = analyze("ledger.tsv", "").unwrap();
//! println!("{} rows, id {}", record.stats().parsed_lines, record.id());
//! for (column, p) in record.benford() {
//!     println!("{column}: p = {p}");
//! }
//! let ones = record.get_count(CounterKind::Lead, "1", None).unwrap();
//! # let _ = ones;
//! ```
//!
//! ## Architecture
//!
//! bytes → [`HashingReader`] → [`TabularReader`] → [`count`] → [`normalize`] →
//! [`benford_test`] → [`AnalysisRecord`]
//!
//! Records are keyed by [`ContentId`], the SHA-256 of the raw bytes plus the
//! format tag, so an [`AnalysisStore`] can hand back an earlier result for the
//! same bytes without reading the file again ([`analyze_cached`]).

pub mod analysis;
pub mod benford;
pub mod config;
pub mod counter;
pub mod error;
pub mod frequency;
pub mod identity;
pub mod reader;
pub mod store;

pub use analysis::{AnalysisRecord, ParseStats, analyze, analyze_reader};
pub use benford::{benford_p_value, benford_test};
pub use config::AppConfig;
pub use counter::{
    ColumnMap, CountOutcome, CounterKind, DIGITS, DigitCounter, Tally, count, to_digit_counter,
};
pub use error::{AnalysisError, ConfigError, StoreError, WrongFileCause};
pub use frequency::{FrequencyMap, normalize};
pub use identity::{
    ContentId, HashingReader, UploadCheck, check_upload, content_id, file_id, same_content,
};
pub use reader::{Format, Row, SUPPORTED_EXTENSIONS, TabularReader, supported_extensions};
pub use store::{AnalysisStore, JsonFileStore, MemoryStore, analyze_cached};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
