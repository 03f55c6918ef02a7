//! Per-column digit tallies.
//!
//! A single pass over the row stream fills two fixed-size byte tallies per column:
//! the simple tally (every byte of every field) and the lead tally (first byte of
//! each non-empty field). After the pass both are reduced to [`DigitCounter`]s.
//!
//! Tallies are per byte rather than per Unicode scalar. Digits are ASCII, and the
//! first byte of a multi-byte character is never an ASCII digit, so the digit
//! counts are identical either way.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::reader::Row;

/// The ten digit keys, in order.
pub const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Which tally a counter or frequency map was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// Every character of every field.
    Simple,
    /// Only the first character of each non-empty field.
    Lead,
}

/// Column-keyed collection. Duplicate header names collapse: the later column wins.
pub type ColumnMap<T> = BTreeMap<String, T>;

// ---------------------------------------------------------------------------
// Full-alphabet tally
// ---------------------------------------------------------------------------

/// Occurrence count of every byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally([u64; 256]);

impl Default for Tally {
    fn default() -> Self {
        Tally([0; 256])
    }
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_byte(&mut self, b: u8) {
        self.0[b as usize] += 1;
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0[b as usize] += 1;
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }

    pub fn get(&self, b: u8) -> u64 {
        self.0[b as usize]
    }
}

// ---------------------------------------------------------------------------
// Digit counter
// ---------------------------------------------------------------------------

/// Count of each digit '0' through '9'. All ten keys are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, u64>", try_from = "BTreeMap<String, u64>")]
pub struct DigitCounter([u64; 10]);

impl DigitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: [u64; 10]) -> Self {
        DigitCounter(counts)
    }

    pub fn counts(&self) -> &[u64; 10] {
        &self.0
    }

    /// Count for a digit character; `None` for anything that is not '0'..='9'.
    pub fn get(&self, letter: char) -> Option<u64> {
        letter.to_digit(10).map(|d| self.0[d as usize])
    }

    /// Count for a one-character digit string such as `"7"`.
    pub fn get_letter(&self, letter: &str) -> Option<u64> {
        let mut chars = letter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => self.get(c),
            _ => None,
        }
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        DIGITS.iter().copied().zip(self.0.iter().copied())
    }
}

impl AddAssign for DigitCounter {
    fn add_assign(&mut self, rhs: DigitCounter) {
        for (mine, theirs) in self.0.iter_mut().zip(rhs.0) {
            *mine += theirs;
        }
    }
}

impl Add for DigitCounter {
    type Output = DigitCounter;

    fn add(mut self, rhs: DigitCounter) -> DigitCounter {
        self += rhs;
        self
    }
}

impl<'a> Sum<&'a DigitCounter> for DigitCounter {
    fn sum<I: Iterator<Item = &'a DigitCounter>>(iter: I) -> DigitCounter {
        iter.fold(DigitCounter::new(), |acc, c| acc + *c)
    }
}

impl From<DigitCounter> for BTreeMap<String, u64> {
    fn from(counter: DigitCounter) -> Self {
        counter.iter().map(|(d, n)| (d.to_string(), n)).collect()
    }
}

impl TryFrom<BTreeMap<String, u64>> for DigitCounter {
    type Error = String;

    fn try_from(map: BTreeMap<String, u64>) -> Result<Self, Self::Error> {
        let mut counts = [0u64; 10];
        for (key, value) in map {
            let digit = key
                .parse::<usize>()
                .ok()
                .filter(|d| *d < 10 && key.len() == 1)
                .ok_or_else(|| format!("invalid digit key {key:?}"))?;
            counts[digit] = value;
        }
        Ok(DigitCounter(counts))
    }
}

/// Keep only the digit keys of a full tally; missing digits count as zero.
pub fn to_digit_counter(tally: &Tally) -> DigitCounter {
    let mut counts = [0u64; 10];
    for (i, slot) in counts.iter_mut().enumerate() {
        *slot = tally.get(b'0' + i as u8);
    }
    DigitCounter(counts)
}

// ---------------------------------------------------------------------------
// Counting pass
// ---------------------------------------------------------------------------

/// Raw result of the counting pass, indexed by column position.
#[derive(Debug, Clone, PartialEq)]
pub struct CountOutcome {
    pub header: Vec<String>,
    pub simple: Vec<DigitCounter>,
    pub lead: Vec<DigitCounter>,
    pub parsed_lines: u64,
    pub omitted_lines: u64,
    pub parsed_words: u64,
}

/// Consume `rows`, treating the first as the header, and tally every data row whose
/// field count matches the header. Mismatched rows are counted as omitted and
/// contribute nothing.
///
/// An empty stream fails with `WrongFile(corrupted)`; `source` only names it.
pub fn count<I>(rows: I, source: &Path) -> Result<CountOutcome, AnalysisError>
where
    I: IntoIterator<Item = Result<Row, AnalysisError>>,
{
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(row) => row?,
        None => return Err(AnalysisError::corrupted(source)),
    };
    let width = header.len();
    let mut simple = vec![Tally::new(); width];
    let mut lead = vec![Tally::new(); width];

    let mut parsed_lines = 0u64;
    let mut omitted_lines = 0u64;
    let mut parsed_words = 0u64;

    for (index, row) in rows.enumerate() {
        let row = row?;
        if row.len() != width {
            omitted_lines += 1;
            trace!(
                "{}: data row {} has {} fields, header has {width}; skipped",
                source.display(),
                index + 1,
                row.len()
            );
            continue;
        }
        parsed_lines += 1;
        for (i, field) in row.fields().enumerate() {
            parsed_words += 1;
            simple[i].add_bytes(field);
            if let Some(&first) = field.first() {
                lead[i].add_byte(first);
            }
        }
    }

    Ok(CountOutcome {
        header: header.to_strings(),
        simple: simple.iter().map(to_digit_counter).collect(),
        lead: lead.iter().map(to_digit_counter).collect(),
        parsed_lines,
        omitted_lines,
        parsed_words,
    })
}

/// Key column-indexed values by header name. A repeated name keeps the value of its
/// last occurrence.
pub fn key_by_column<T: Clone>(header: &[String], values: &[T]) -> ColumnMap<T> {
    header
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect()
}

/// Whole-file counter: the sum of every column plus the header names themselves,
/// tallied as if they were data. Per-column counters never include header text.
pub fn merged_counter(columns: &ColumnMap<DigitCounter>, kind: CounterKind) -> DigitCounter {
    let mut header = Tally::new();
    for name in columns.keys() {
        match kind {
            CounterKind::Simple => header.add_bytes(name.as_bytes()),
            CounterKind::Lead => {
                if let Some(&first) = name.as_bytes().first() {
                    header.add_byte(first);
                }
            }
        }
    }
    columns.values().sum::<DigitCounter>() + to_digit_counter(&header)
}
