//! Content identity: a SHA-256 digest of the raw bytes plus the parse format tag.
//!
//! Identical bytes parsed under different formats get different ids, because the
//! parse policy changes the result.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::reader::Format;

/// Read size used when hashing a stream.
pub const CHUNK_SIZE: usize = 4096;

/// Hex SHA-256 digest of a source followed by its recognized extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(digest_hex: &str, format: Format) -> Self {
        ContentId(format!("{digest_hex}{}", format.extension()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digest part, without the extension tag.
    pub fn digest(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ContentId {
    fn from(s: String) -> Self {
        ContentId(s)
    }
}

/// Hex SHA-256 of everything `reader` yields, read in [`CHUNK_SIZE`] chunks.
pub fn sha256_hex<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Content id of a stream under `format`. Consumes the stream.
pub fn content_id<R: Read>(reader: R, format: Format) -> io::Result<ContentId> {
    Ok(ContentId::new(&sha256_hex(reader)?, format))
}

/// Content id of the file at `path` under `format`.
pub fn file_id(path: &Path, format: Format) -> io::Result<ContentId> {
    content_id(File::open(path)?, format)
}

/// Whether the file at `existing` holds exactly the bytes `candidate` yields.
///
/// Filenames and format tags play no part.
pub fn same_content<R: Read>(existing: &Path, candidate: R) -> io::Result<bool> {
    Ok(sha256_hex(File::open(existing)?)? == sha256_hex(candidate)?)
}

/// Outcome of comparing an upload against a stored file of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCheck {
    /// Nothing stored under that name yet.
    New,
    /// Stored file has identical content.
    Duplicate,
    /// Same name, different content. Callers reject these.
    Conflict,
}

/// Compare `candidate` against the file stored at `stored`.
pub fn check_upload<R: Read>(stored: &Path, candidate: R) -> io::Result<UploadCheck> {
    if !stored.exists() {
        return Ok(UploadCheck::New);
    }
    Ok(if same_content(stored, candidate)? {
        UploadCheck::Duplicate
    } else {
        UploadCheck::Conflict
    })
}

/// A `Read` adapter that hashes every byte it passes through.
///
/// Lets the parser and the content id share a single pass over the source.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha256,
    bytes: u64,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        HashingReader {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    /// Bytes hashed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Drain whatever is left of the source and return the hex digest of the whole
    /// stream, equal to [`sha256_hex`] over the same bytes.
    pub fn finish(mut self) -> io::Result<String> {
        io::copy(&mut self, &mut io::sink())?;
        Ok(hex::encode(self.hasher.finalize()))
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("abc")
    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_known_digest() {
        assert_eq!(sha256_hex(&b"abc"[..]).unwrap(), ABC);
    }

    #[test]
    fn test_content_id_appends_extension() {
        let csv = content_id(&b"abc"[..], Format::Csv).unwrap();
        let tsv = content_id(&b"abc"[..], Format::Tsv).unwrap();
        let raw = content_id(&b"abc"[..], Format::Raw).unwrap();
        assert_eq!(csv.as_str(), format!("{ABC}.csv"));
        assert_eq!(tsv.as_str(), format!("{ABC}.tsv"));
        assert_eq!(raw.as_str(), ABC);
        assert_ne!(csv, tsv);
        assert_eq!(csv.digest(), ABC);
        assert_eq!(raw.digest(), ABC);
    }

    #[test]
    fn test_content_id_is_pure() {
        let data = vec![7u8; CHUNK_SIZE * 3 + 17];
        let a = content_id(&data[..], Format::Csv).unwrap();
        let b = content_id(&data[..], Format::Csv).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hashing_reader_matches_plain_digest() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = HashingReader::new(&data[..]);
        let mut head = [0u8; 100];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(reader.bytes_read(), 100);
        // finish() must cover the unread tail too
        assert_eq!(reader.finish().unwrap(), sha256_hex(&data[..]).unwrap());
    }

    #[test]
    fn test_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("stored.csv");
        std::fs::write(&stored, b"a,b\n1,2\n").unwrap();
        assert!(same_content(&stored, &b"a,b\n1,2\n"[..]).unwrap());
        assert!(!same_content(&stored, &b"a,b\n1,3\n"[..]).unwrap());
    }

    #[test]
    fn test_check_upload() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("data.tsv");
        assert_eq!(check_upload(&stored, &b"x"[..]).unwrap(), UploadCheck::New);
        std::fs::write(&stored, b"x\n1\n").unwrap();
        assert_eq!(
            check_upload(&stored, &b"x\n1\n"[..]).unwrap(),
            UploadCheck::Duplicate
        );
        assert_eq!(
            check_upload(&stored, &b"x\n2\n"[..]).unwrap(),
            UploadCheck::Conflict
        );
    }
}
