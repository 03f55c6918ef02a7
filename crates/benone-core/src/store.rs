//! Content-id keyed store of finished analyses.
//!
//! A store answers "has this exact file already been analyzed?". Records are
//! inserted once and never replaced; a second `put` for the same id fails with
//! `AlreadyExists`. Both stores here are single-owner (`&mut self`), so there is
//! nothing to deduplicate between concurrent callers; a shared store must provide
//! at-most-once computation per id itself.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use crate::analysis::{AnalysisRecord, analyze_reader, display_name};
use crate::error::StoreError;
use crate::identity::{ContentId, content_id};
use crate::reader::{Format, ensure_file};

/// Lookup and insert-once storage for analysis records.
pub trait AnalysisStore {
    fn get(&self, id: &ContentId) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Insert `record`. Fails with `AlreadyExists` if its id is already stored.
    fn put(&mut self, record: AnalysisRecord) -> Result<(), StoreError>;

    fn contains(&self, id: &ContentId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<ContentId, AnalysisRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AnalysisStore for MemoryStore {
    fn get(&self, id: &ContentId) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, record: AnalysisRecord) -> Result<(), StoreError> {
        if self.records.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().to_string()));
        }
        self.records.insert(record.id().clone(), record);
        Ok(())
    }
}

/// Store persisted as a single JSON object `{content_id: record}`.
///
/// The whole map is rewritten on every `put`, through a temp file in the same
/// directory so a crash never leaves a truncated store behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: BTreeMap<ContentId, AnalysisRecord>,
}

impl JsonFileStore {
    /// Load the store at `path`, creating an empty one (and its parent directories)
    /// if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            let store = JsonFileStore {
                path,
                records: BTreeMap::new(),
            };
            store.save()?;
            debug!("initialized empty analysis store at {}", store.path.display());
            return Ok(store);
        }
        let data = fs::read(&path)?;
        let records: BTreeMap<ContentId, AnalysisRecord> = serde_json::from_slice(&data)?;
        debug!(
            "loaded {} analyses from {}",
            records.len(),
            path.display()
        );
        Ok(JsonFileStore { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the current map to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.records)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl AnalysisStore for JsonFileStore {
    fn get(&self, id: &ContentId) -> Result<Option<AnalysisRecord>, StoreError> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, record: AnalysisRecord) -> Result<(), StoreError> {
        if self.records.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().to_string()));
        }
        self.records.insert(record.id().clone(), record);
        self.save()
    }
}

/// Return the stored analysis of `path` if its content id is known, otherwise
/// analyze the file and store the result.
///
/// The cache lookup needs the content id, so a hit costs one hashing pass and a
/// miss costs that pass plus the fused analysis pass, both over the same handle.
/// Fails with `SourceChanged` if the two passes saw different bytes; nothing is
/// stored then.
pub fn analyze_cached<S: AnalysisStore + ?Sized>(
    store: &mut S,
    path: impl AsRef<Path>,
    hint: &str,
) -> Result<AnalysisRecord, StoreError> {
    let path = path.as_ref();
    ensure_file(path)?;
    let file = File::open(path)?;
    cached_or_analyzed(store, file, path, Format::resolve(path, hint))
}

fn cached_or_analyzed<S, R>(
    store: &mut S,
    mut source: R,
    path: &Path,
    format: Format,
) -> Result<AnalysisRecord, StoreError>
where
    S: AnalysisStore + ?Sized,
    R: Read + Seek,
{
    let id = content_id(&mut source, format)?;
    if let Some(record) = store.get(&id)? {
        debug!("{}: cached analysis {id}", path.display());
        return Ok(record);
    }
    debug!("{}: no analysis for {id}, computing", path.display());
    source.rewind()?;
    let record =
        analyze_reader(source, &display_name(path), format).map_err(|e| e.at_path(path))?;
    if record.id() != &id {
        return Err(StoreError::SourceChanged(path.to_path_buf()));
    }
    store.put(record.clone())?;
    Ok(record)
}
