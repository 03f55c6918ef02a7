//! Full analysis of one tabular source into an immutable [`AnalysisRecord`].
//!
//! The content hash and the digit tallies come from the same pass: the parser
//! reads through a [`HashingReader`], and the digest is finalized once the row
//! stream is exhausted. The resulting id equals the one a separate hashing pass
//! would produce.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::benford::benford_p_value;
use crate::counter::{
    ColumnMap, CountOutcome, CounterKind, DigitCounter, count, key_by_column, merged_counter,
};
use crate::error::AnalysisError;
use crate::frequency::{FrequencyMap, normalize};
use crate::identity::{ContentId, HashingReader};
use crate::reader::{Format, TabularReader, ensure_file};

/// Statistics gathered while parsing a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub filename: String,
    /// Recognized extension the source was parsed with; empty in raw mode.
    pub ext: String,
    pub hash: ContentId,
    pub header_size: usize,
    /// Data rows whose field count matched the header.
    pub parsed_lines: u64,
    /// Data rows skipped for a field count mismatch.
    pub omitted_lines: u64,
    pub parsed_words: u64,
}

/// Digit profile of one source, keyed by its content id.
///
/// Built once by [`analyze`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    id: ContentId,
    stats: ParseStats,
    simple_counters: ColumnMap<DigitCounter>,
    lead_counters: ColumnMap<DigitCounter>,
    merged_simple: DigitCounter,
    merged_lead: DigitCounter,
    simple_frequencies: ColumnMap<FrequencyMap>,
    lead_frequencies: ColumnMap<FrequencyMap>,
    benford: ColumnMap<f64>,
}

impl AnalysisRecord {
    /// Assemble a record from a finished counting pass.
    pub fn build(id: ContentId, filename: &str, format: Format, outcome: CountOutcome) -> Self {
        let stats = ParseStats {
            filename: filename.to_string(),
            ext: format.extension().to_string(),
            hash: id.clone(),
            header_size: outcome.header.len(),
            parsed_lines: outcome.parsed_lines,
            omitted_lines: outcome.omitted_lines,
            parsed_words: outcome.parsed_words,
        };

        let simple_counters = key_by_column(&outcome.header, &outcome.simple);
        let lead_counters = key_by_column(&outcome.header, &outcome.lead);
        let merged_simple = merged_counter(&simple_counters, CounterKind::Simple);
        let merged_lead = merged_counter(&lead_counters, CounterKind::Lead);

        let normalize_all = |counters: &ColumnMap<DigitCounter>| -> ColumnMap<FrequencyMap> {
            counters
                .iter()
                .map(|(column, counter)| (column.clone(), normalize(counter)))
                .collect()
        };
        let simple_frequencies = normalize_all(&simple_counters);
        let lead_frequencies = normalize_all(&lead_counters);

        let benford = lead_frequencies
            .iter()
            .map(|(column, freq)| (column.clone(), benford_p_value(freq)))
            .collect();

        AnalysisRecord {
            id,
            stats,
            simple_counters,
            lead_counters,
            merged_simple,
            merged_lead,
            simple_frequencies,
            lead_frequencies,
            benford,
        }
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Column names, sorted.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.simple_counters.keys().map(String::as_str)
    }

    pub fn get_counters(&self, kind: CounterKind) -> &ColumnMap<DigitCounter> {
        match kind {
            CounterKind::Simple => &self.simple_counters,
            CounterKind::Lead => &self.lead_counters,
        }
    }

    /// Counter for `column`, or the whole-file counter when `column` is `None`.
    pub fn get_counter(
        &self,
        kind: CounterKind,
        column: Option<&str>,
    ) -> Result<&DigitCounter, AnalysisError> {
        match column {
            None => Ok(match kind {
                CounterKind::Simple => &self.merged_simple,
                CounterKind::Lead => &self.merged_lead,
            }),
            Some(name) => self
                .get_counters(kind)
                .get(name)
                .ok_or_else(|| AnalysisError::WrongColumn(name.to_string())),
        }
    }

    /// Count of `letter` (a single digit, `"0"` to `"9"`) in `column` or the whole file.
    ///
    /// The column is checked before the letter.
    pub fn get_count(
        &self,
        kind: CounterKind,
        letter: &str,
        column: Option<&str>,
    ) -> Result<u64, AnalysisError> {
        let counter = self.get_counter(kind, column)?;
        counter
            .get_letter(letter)
            .ok_or_else(|| AnalysisError::WrongLetter(letter.to_string()))
    }

    pub fn get_frequency_maps(&self, kind: CounterKind) -> &ColumnMap<FrequencyMap> {
        match kind {
            CounterKind::Simple => &self.simple_frequencies,
            CounterKind::Lead => &self.lead_frequencies,
        }
    }

    /// Frequencies for `column`, or for the whole-file counter when `column` is `None`.
    pub fn get_frequencies(
        &self,
        kind: CounterKind,
        column: Option<&str>,
    ) -> Result<FrequencyMap, AnalysisError> {
        match column {
            None => Ok(normalize(self.get_counter(kind, None)?)),
            Some(name) => self
                .get_frequency_maps(kind)
                .get(name)
                .copied()
                .ok_or_else(|| AnalysisError::WrongColumn(name.to_string())),
        }
    }

    /// Benford p-value per column, computed from lead frequencies.
    pub fn benford(&self) -> &ColumnMap<f64> {
        &self.benford
    }

    pub fn benford_p_value(&self, column: &str) -> Result<f64, AnalysisError> {
        self.benford
            .get(column)
            .copied()
            .ok_or_else(|| AnalysisError::WrongColumn(column.to_string()))
    }
}

/// Analyze the file at `path`.
///
/// `hint` selects the format when it names a recognized extension; otherwise the
/// file suffix decides, and unknown suffixes are read in raw mode. Fails with
/// `SourceNotFound` before reading anything when `path` is not a file.
pub fn analyze(path: impl AsRef<Path>, hint: &str) -> Result<AnalysisRecord, AnalysisError> {
    let path = path.as_ref();
    ensure_file(path)?;
    let format = Format::resolve(path, hint);
    let file = File::open(path)?;
    analyze_reader(file, &display_name(path), format).map_err(|e| e.at_path(path))
}

/// Final path component, as recorded in [`ParseStats::filename`].
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Analyze any byte source under an already resolved `format`.
pub fn analyze_reader<R: Read>(
    reader: R,
    filename: &str,
    format: Format,
) -> Result<AnalysisRecord, AnalysisError> {
    let mut rows = TabularReader::from_reader(HashingReader::new(reader), format);
    let outcome = count(rows.by_ref(), Path::new(filename))?;
    let id = ContentId::new(&rows.into_inner().finish()?, format);
    debug!(
        "analyzed {filename} as {format:?}: {} columns, {} rows parsed, {} omitted, id {id}",
        outcome.header.len(),
        outcome.parsed_lines,
        outcome.omitted_lines,
    );
    Ok(AnalysisRecord::build(id, filename, format, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::content_id;

    fn record(data: &str, format: Format) -> AnalysisRecord {
        analyze_reader(data.as_bytes(), "test", format).unwrap()
    }

    #[test]
    fn test_two_column_tsv_record() {
        let rec = record("A\tB\n12\t34\n56\t78\n", Format::Tsv);
        let stats = rec.stats();
        assert_eq!(stats.ext, ".tsv");
        assert_eq!(stats.header_size, 2);
        assert_eq!((stats.parsed_lines, stats.omitted_lines, stats.parsed_words), (2, 0, 4));
        assert_eq!(rec.get_count(CounterKind::Simple, "1", Some("A")).unwrap(), 1);
        assert_eq!(rec.get_count(CounterKind::Simple, "3", Some("A")).unwrap(), 0);
        assert_eq!(rec.get_count(CounterKind::Simple, "8", Some("B")).unwrap(), 1);
        assert_eq!(rec.get_count(CounterKind::Lead, "5", Some("A")).unwrap(), 1);
        assert_eq!(rec.get_count(CounterKind::Lead, "6", Some("A")).unwrap(), 0);
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_id_matches_two_pass_hash() {
        let data = "A,B\n1,2\n3,4\n";
        let rec = record(data, Format::Csv);
        assert_eq!(rec.id(), &content_id(data.as_bytes(), Format::Csv).unwrap());
        assert_eq!(&rec.stats().hash, rec.id());
    }

    #[test]
    fn test_header_only_record() {
        let rec = record("X\n", Format::Csv);
        let counter = rec.get_counter(CounterKind::Simple, Some("X")).unwrap();
        assert_eq!(counter, &DigitCounter::new());
        let freq = rec.get_frequencies(CounterKind::Lead, Some("X")).unwrap();
        assert_eq!(freq.percentages(), &[0.0; 10]);
        assert_eq!(rec.benford_p_value("X").unwrap(), 0.0);
    }

    #[test]
    fn test_wrong_letter_and_column() {
        let rec = record("A\tB\n12\t34\n", Format::Tsv);
        assert!(matches!(
            rec.get_count(CounterKind::Simple, "a", None),
            Err(AnalysisError::WrongLetter(l)) if l == "a"
        ));
        assert!(matches!(
            rec.get_count(CounterKind::Simple, "0", Some("nope")),
            Err(AnalysisError::WrongColumn(c)) if c == "nope"
        ));
        // column is resolved first
        assert!(matches!(
            rec.get_count(CounterKind::Simple, "a", Some("nope")),
            Err(AnalysisError::WrongColumn(_))
        ));
        assert!(matches!(
            rec.get_frequencies(CounterKind::Lead, Some("nope")),
            Err(AnalysisError::WrongColumn(_))
        ));
        assert!(rec.benford_p_value("nope").is_err());
    }

    #[test]
    fn test_merged_frequencies_include_header() {
        let rec = record("c1\n5\n", Format::Csv);
        let merged = rec.get_frequencies(CounterKind::Simple, None).unwrap();
        assert_eq!(merged.get('1'), Some(50.0));
        assert_eq!(merged.get('5'), Some(50.0));
        let column = rec.get_frequencies(CounterKind::Simple, Some("c1")).unwrap();
        assert_eq!(column.get('5'), Some(100.0));
    }

    #[test]
    fn test_benford_uses_lead_frequencies() {
        // every value leads with '1'
        let rec = record("n\n19\n18\n17\n", Format::Csv);
        let lead = rec.get_frequencies(CounterKind::Lead, Some("n")).unwrap();
        assert_eq!(lead.get('1'), Some(100.0));
        let expected = crate::benford::benford_p_value(&lead);
        assert_eq!(rec.benford_p_value("n").unwrap(), expected);
    }

    #[test]
    fn test_record_is_deterministic() {
        let data = "a,b\n123,456\n7,\n,8\n1,2,3\n";
        assert_eq!(record(data, Format::Csv), record(data, Format::Csv));
    }

    #[test]
    fn test_record_json_roundtrip() {
        let rec = record("a,b\n123,456\n", Format::Csv);
        let json = serde_json::to_string(&rec).unwrap();
        let back: AnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), rec.id());
        assert_eq!(back.stats(), rec.stats());
        assert_eq!(back.get_counters(CounterKind::Lead), rec.get_counters(CounterKind::Lead));
        assert_eq!(
            back.get_counter(CounterKind::Simple, None).unwrap(),
            rec.get_counter(CounterKind::Simple, None).unwrap()
        );
    }

    #[test]
    fn test_empty_reader_is_corrupted() {
        let err = analyze_reader(&b""[..], "empty.csv", Format::Csv).unwrap_err();
        assert!(matches!(err, AnalysisError::WrongFile { .. }));
    }
}
