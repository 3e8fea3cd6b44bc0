use crate::archive::format::{normalize_name, read_directory, DirectoryEntry};
use crate::archive::stream::EntryStream;
use crate::error::{PakError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Where an archive's bytes live
enum Backing {
    /// Read handle held for the archive's lifetime
    File(Mutex<File>),
    /// Container already in memory
    Memory(Vec<u8>),
}

/// PAK archive reader with O(1) entry lookup
///
/// All reads take `&self`; file-backed archives serialize seeks on an internal
/// lock so one archive can be shared across threads.
pub struct PakArchive {
    label: String,
    backing: Backing,
    len: u64,
    entries: Vec<DirectoryEntry>,
    lookup: HashMap<String, usize>,
    duplicates: Vec<String>,
}

impl PakArchive {
    /// Open an archive file and parse its directory table
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        let entries = {
            let reader = BufReader::new(&mut file);
            read_directory(reader, len)?
        };

        debug!(
            "Opened archive {:?} ({} entries, {} bytes)",
            path,
            entries.len(),
            len
        );

        Ok(Self::with_entries(
            path.display().to_string(),
            Backing::File(Mutex::new(file)),
            len,
            entries,
        ))
    }

    /// Parse an archive held in memory
    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len() as u64;
        let entries = read_directory(&bytes[..], len)?;
        Ok(Self::with_entries(label.into(), Backing::Memory(bytes), len, entries))
    }

    fn with_entries(
        label: String,
        backing: Backing,
        len: u64,
        entries: Vec<DirectoryEntry>,
    ) -> Self {
        let mut lookup = HashMap::with_capacity(entries.len());
        let mut duplicates = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let key = normalize_name(&entry.name);
            if lookup.contains_key(&key) {
                // First occurrence wins
                warn!("Archive {} lists '{}' more than once", label, entry.name);
                duplicates.push(entry.name.clone());
                continue;
            }
            lookup.insert(key, index);
        }

        Self {
            label,
            backing,
            len,
            entries,
            lookup,
            duplicates,
        }
    }

    /// Path (or caller-supplied label) identifying this archive
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Size of the container in bytes
    pub fn size(&self) -> u64 {
        self.len
    }

    /// Number of directory rows, duplicates included
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Directory rows in on-disk order
    pub fn list_entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Names that appear more than once in the directory
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Check if an entry exists (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(&normalize_name(name))
    }

    /// Directory row for `name`, first occurrence for duplicates
    pub fn entry(&self, name: &str) -> Option<&DirectoryEntry> {
        self.index_of(name).map(|i| &self.entries[i])
    }

    /// Position of `name` in the directory table
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(&normalize_name(name)).copied()
    }

    /// Open a stream bounded to the entry's byte range
    pub fn open_entry(&self, name: &str) -> Result<EntryStream> {
        let index = self
            .index_of(name)
            .ok_or_else(|| PakError::NotFound(name.to_string()))?;
        self.open_entry_at(index)
    }

    /// Open the entry at directory position `index`
    pub fn open_entry_at(&self, index: usize) -> Result<EntryStream> {
        let entry = self.entries.get(index).ok_or_else(|| {
            PakError::NotFound(format!("{}: entry #{}", self.label, index))
        })?;
        self.read_range(entry).map(EntryStream::new)
    }

    /// Read an entry fully
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        self.open_entry(name).map(EntryStream::into_bytes)
    }

    fn read_range(&self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        if entry.end() > self.len {
            return Err(self.out_of_bounds(entry));
        }

        match &self.backing {
            Backing::Memory(bytes) => {
                let start = entry.offset as usize;
                let end = entry.end() as usize;
                Ok(bytes[start..end].to_vec())
            }
            Backing::File(file) => {
                let mut file = file.lock();
                file.seek(SeekFrom::Start(entry.offset))?;
                let mut data = vec![0u8; entry.length as usize];
                match file.read_exact(&mut data) {
                    Ok(()) => Ok(data),
                    // The file shrank underneath us
                    Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                        Err(self.out_of_bounds(entry))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    fn out_of_bounds(&self, entry: &DirectoryEntry) -> PakError {
        PakError::Corrupt(format!(
            "{}: entry '{}' [{}, {}) exceeds archive size {}",
            self.label,
            entry.name,
            entry.offset,
            entry.end(),
            self.len
        ))
    }
}

impl std::fmt::Debug for PakArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PakArchive")
            .field("label", &self.label)
            .field("len", &self.len)
            .field("entries", &self.entries.len())
            .finish()
    }
}
