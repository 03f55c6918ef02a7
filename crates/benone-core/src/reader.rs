//! Format-sensing streaming reader for delimited tables.
//!
//! The format comes from an explicit hint when it names a recognized extension,
//! otherwise from the file suffix, otherwise the file is read in raw mode where every
//! line is a single-field row. Blank lines in delimited files come out as rows
//! with no fields. Rows are produced lazily, one at a time, so memory use
//! does not grow with the size of the file.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Extensions recognized as delimited formats, in display order.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".csv", ".tsv"];

/// The recognized extensions as an owned list.
pub fn supported_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

/// How a source is split into rows and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Comma separated.
    Csv,
    /// Tab separated.
    Tsv,
    /// No splitting: one field per line.
    Raw,
}

impl Format {
    /// Extension tag used in content ids; empty for raw mode.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => ".csv",
            Format::Tsv => ".tsv",
            Format::Raw => "",
        }
    }

    pub fn delimiter(self) -> Option<u8> {
        match self {
            Format::Csv => Some(b','),
            Format::Tsv => Some(b'\t'),
            Format::Raw => None,
        }
    }

    /// Parse a recognized extension. The leading dot is optional and case is ignored.
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim();
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        if ext.eq_ignore_ascii_case("csv") {
            Some(Format::Csv)
        } else if ext.eq_ignore_ascii_case("tsv") {
            Some(Format::Tsv)
        } else {
            None
        }
    }

    /// Resolve the format for `path`: recognized hint, then file suffix, then raw.
    pub fn resolve(path: &Path, hint: &str) -> Format {
        if let Some(format) = Format::from_extension(hint) {
            return format;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
            .unwrap_or(Format::Raw)
    }
}

/// One record of the table: an ordered sequence of fields.
///
/// Fields are kept as bytes; digit tallies only ever look at ASCII so nothing is
/// lost for non UTF-8 input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(ByteRecord);

impl Row {
    pub fn from_fields<T: AsRef<[u8]>>(fields: &[T]) -> Row {
        Row(ByteRecord::from(fields))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &[u8]> {
        self.0.iter()
    }

    /// Field `i` as text, replacing invalid UTF-8.
    pub fn get(&self, i: usize) -> Option<Cow<'_, str>> {
        self.0.get(i).map(String::from_utf8_lossy)
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.fields()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }
}

/// Lexer position inside a delimited line, enough to tell quoted newlines apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Pass-through reader that remembers the stream offset of every blank line.
///
/// The csv parser skips empty lines without a trace, but a blank line is still a
/// row with zero fields. Offsets are matched against the parser's byte position to
/// put each blank line back in order.
struct BlankLines<R> {
    inner: R,
    delimiter: u8,
    offset: u64,
    field: Field,
    line_empty: bool,
    blanks: VecDeque<u64>,
}

impl<R: Read> BlankLines<R> {
    fn new(inner: R, delimiter: u8) -> Self {
        BlankLines {
            inner,
            delimiter,
            offset: 0,
            field: Field::Start,
            line_empty: true,
            blanks: VecDeque::new(),
        }
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let at = self.offset;
            self.offset += 1;
            self.field = match (self.field, b) {
                (Field::Quoted, b'"') => Field::QuoteInQuoted,
                (Field::Quoted, _) => Field::Quoted,
                (_, b'\n') => {
                    if self.line_empty {
                        self.blanks.push_back(at);
                    }
                    self.line_empty = true;
                    Field::Start
                }
                // part of a CRLF terminator
                (field, b'\r') => field,
                (Field::Start, b'"') => {
                    self.line_empty = false;
                    Field::Quoted
                }
                (Field::QuoteInQuoted, b'"') => Field::Quoted,
                (_, b) if b == self.delimiter => {
                    self.line_empty = false;
                    Field::Start
                }
                _ => {
                    self.line_empty = false;
                    Field::Unquoted
                }
            };
        }
    }

    /// Pop one blank line that ends before stream offset `before`.
    fn take_before(&mut self, before: u64) -> bool {
        match self.blanks.front() {
            Some(&at) if at < before => {
                self.blanks.pop_front();
                true
            }
            _ => false,
        }
    }
}

impl<R: Read> Read for BlankLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.scan(&buf[..n]);
        Ok(n)
    }
}

enum Source<R: Read> {
    Delimited {
        reader: csv::Reader<BlankLines<R>>,
        /// Record already parsed, waiting behind the blank lines that preceded it.
        held: Option<Row>,
    },
    Raw(BufReader<R>),
}

/// Lazy row iterator over a byte source.
pub struct TabularReader<R: Read> {
    source: Source<R>,
    format: Format,
}

/// Fail with `SourceNotFound` unless `path` is an existing file.
pub(crate) fn ensure_file(path: &Path) -> Result<(), AnalysisError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AnalysisError::SourceNotFound(path.to_path_buf()))
    }
}

impl TabularReader<File> {
    /// Open `path` for reading. Existence is checked here, before any row is read.
    pub fn open(path: impl AsRef<Path>, hint: &str) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        ensure_file(path)?;
        let format = Format::resolve(path, hint);
        let file = File::open(path)?;
        Ok(TabularReader::from_reader(file, format))
    }
}

impl<R: Read> TabularReader<R> {
    pub fn from_reader(reader: R, format: Format) -> Self {
        let source = match format.delimiter() {
            Some(delimiter) => Source::Delimited {
                reader: ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(BlankLines::new(reader, delimiter)),
                held: None,
            },
            None => Source::Raw(BufReader::new(reader)),
        };
        TabularReader { source, format }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Give back the underlying byte source. Bytes buffered but not yet parsed are
    /// dropped; they have already been pulled from `R`.
    pub fn into_inner(self) -> R {
        match self.source {
            Source::Delimited { reader, .. } => reader.into_inner().inner,
            Source::Raw(reader) => reader.into_inner(),
        }
    }

    fn read_row(&mut self) -> Result<Option<Row>, AnalysisError> {
        match &mut self.source {
            Source::Delimited { reader, held } => {
                let parsed = reader.position().byte();
                if reader.get_mut().take_before(parsed) {
                    return Ok(Some(Row::default()));
                }
                if let Some(row) = held.take() {
                    return Ok(Some(row));
                }
                let mut record = ByteRecord::new();
                if !reader.read_byte_record(&mut record)? {
                    // blank lines after the last record
                    let trailing = reader.get_mut().take_before(u64::MAX);
                    return Ok(trailing.then(Row::default));
                }
                let parsed = reader.position().byte();
                if reader.get_mut().take_before(parsed) {
                    *held = Some(Row(record));
                    return Ok(Some(Row::default()));
                }
                Ok(Some(Row(record)))
            }
            Source::Raw(reader) => {
                let mut line = Vec::new();
                if reader.read_until(b'\n', &mut line)? == 0 {
                    return Ok(None);
                }
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                Ok(Some(Row::from_fields(&[line])))
            }
        }
    }
}

impl<R: Read> Iterator for TabularReader<R> {
    type Item = Result<Row, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}
