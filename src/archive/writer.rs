use crate::archive::format::{
    directory_size, normalize_name, validate_name, write_directory, DirectoryEntry,
};
use crate::error::{PakError, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive writer for creating PAK files
///
/// The directory table sits in front of the data and its size depends on
/// every name, so entries are buffered until `finalize`.
pub struct PakWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    pending: Vec<(String, Vec<u8>)>,
    seen: HashSet<String>,
}

impl PakWriter {
    /// Create a new archive file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            pending: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Add a file to the archive; names are stored as given
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name)?;
        if !self.seen.insert(normalize_name(name)) {
            return Err(PakError::DuplicateEntry(name.to_string()));
        }
        self.pending.push((name.to_string(), data.to_vec()));
        Ok(())
    }

    /// Add a file from disk
    pub fn add_file_from_disk(&mut self, name: &str, disk_path: &Path) -> Result<()> {
        let data = std::fs::read(disk_path)?;
        self.add_file(name, &data)
    }

    /// Number of entries queued so far
    pub fn entry_count(&self) -> usize {
        self.pending.len()
    }

    /// Finalize the archive by writing the directory table and all data
    pub fn finalize(mut self) -> Result<()> {
        write_pak(&mut self.writer, &self.pending[..])?;
        self.writer.flush()?;

        debug!(
            "Wrote archive {:?} ({} entries)",
            self.path,
            self.pending.len()
        );
        Ok(())
    }
}

/// Build a complete PAK container in memory
pub fn encode_pak(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut seen = HashSet::new();
    for (name, _) in entries {
        validate_name(name)?;
        if !seen.insert(normalize_name(name)) {
            return Err(PakError::DuplicateEntry(name.to_string()));
        }
    }

    let mut buf = Vec::new();
    write_pak(&mut buf, entries)?;
    Ok(buf)
}

fn write_pak<W, N, D>(mut writer: W, entries: &[(N, D)]) -> Result<()>
where
    W: Write,
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut offset = directory_size(entries.iter().map(|(n, _)| n.as_ref()));

    let mut table = Vec::with_capacity(entries.len());
    for (name, data) in entries {
        let length = data.as_ref().len() as u64;
        table.push(DirectoryEntry {
            name: name.as_ref().to_string(),
            offset,
            length,
        });
        offset += length;
    }

    write_directory(&mut writer, &table)?;
    for (_, data) in entries {
        writer.write_all(data.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PakArchive;
    use tempfile::NamedTempFile;

    #[test]
    fn test_writer_output_opens() -> Result<()> {
        let temp = NamedTempFile::new()?;
        {
            let mut writer = PakWriter::create(temp.path())?;
            writer.add_file("DUNE.PAL", &[1, 2, 3])?;
            writer.add_file("MOUSE.SHP", b"shape")?;
            assert_eq!(writer.entry_count(), 2);
            writer.finalize()?;
        }

        let archive = PakArchive::open(temp.path())?;
        let entries = archive.list_entries();
        assert_eq!(entries.len(), 2);
        // (4 + 9) + (4 + 10) + 4 terminator
        assert_eq!(entries[0].offset, 31);
        assert_eq!(entries[1].offset, 34);
        assert_eq!(archive.read_entry("mouse.shp")?, b"shape");
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let temp = NamedTempFile::new().unwrap();
        let mut writer = PakWriter::create(temp.path()).unwrap();
        writer.add_file("A.TXT", b"1").unwrap();

        let result = writer.add_file("a.txt", b"2");
        assert!(matches!(result, Err(PakError::DuplicateEntry(_))));

        let result = encode_pak(&[("X", b"1".as_slice()), ("x", b"2".as_slice())]);
        assert!(matches!(result, Err(PakError::DuplicateEntry(_))));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let result = encode_pak(&[("", b"1".as_slice())]);
        assert!(matches!(result, Err(PakError::InvalidName(_))));
    }

    #[test]
    fn test_empty_archive() -> Result<()> {
        let bytes = encode_pak(&[])?;
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let archive = PakArchive::from_bytes("empty", bytes)?;
        assert_eq!(archive.entry_count(), 0);
        Ok(())
    }
}
