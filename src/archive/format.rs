use crate::error::{PakError, Result};
use std::io::{Read, Write};

/// Maximum entry name length in bytes (excluding the NUL terminator)
pub const MAX_NAME_LENGTH: usize = 255;

/// Size of one directory offset field
pub const OFFSET_SIZE: usize = 4;

/// File extensions recognized as PAK containers (compared case-insensitively)
pub const PAK_EXTENSIONS: &[&str] = &["pak"];

/// Normalize an asset name for lookup.
///
/// Backslashes become forward slashes and ASCII letters are lower-cased, so
/// `GFX\Cursor.PNG` and `gfx/cursor.png` name the same asset. Loose files and
/// archive entries go through the same function.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/").to_ascii_lowercase()
}

/// True if `file_name` carries a recognized archive extension
pub fn is_archive_name(file_name: &str, extensions: &[String]) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        }
        _ => false,
    }
}

/// One row of the directory table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Name as stored in the container
    pub name: String,
    /// Absolute offset of the entry data
    pub offset: u64,
    /// Length of the entry data in bytes
    pub length: u64,
}

impl DirectoryEntry {
    /// Exclusive end of the entry's byte range
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Parse the directory table at the start of a container of `total_len` bytes.
///
/// The table is a sequence of `(u32 offset, NUL-terminated name)` records
/// ending with a zero offset, or at the first entry's data offset for tables
/// that omit the terminator. Lengths are derived from neighbouring offsets.
pub fn read_directory<R: Read>(mut reader: R, total_len: u64) -> Result<Vec<DirectoryEntry>> {
    let mut raw: Vec<(String, u64)> = Vec::new();
    let mut position: u64 = 0;

    loop {
        // A table without terminator stops where the data begins
        if let Some((_, first_offset)) = raw.first() {
            if position == *first_offset {
                break;
            }
        }

        let offset = u64::from(read_u32(&mut reader).map_err(|_| {
            PakError::Corrupt(format!("truncated directory table at byte {}", position))
        })?);
        position += OFFSET_SIZE as u64;

        if offset == 0 {
            break;
        }

        let name = read_name(&mut reader, position)?;
        position += name.len() as u64 + 1;
        raw.push((name, offset));
    }

    let table_end = position;
    let mut entries = Vec::with_capacity(raw.len());

    for (index, (name, offset)) in raw.iter().enumerate() {
        if *offset < table_end {
            return Err(PakError::Corrupt(format!(
                "entry '{}' starts at {} inside the directory table (ends at {})",
                name, offset, table_end
            )));
        }
        if *offset > total_len {
            return Err(PakError::Corrupt(format!(
                "entry '{}' starts at {} beyond archive end {}",
                name, offset, total_len
            )));
        }

        let next = raw.get(index + 1).map(|(_, o)| *o).unwrap_or(total_len);
        if next < *offset {
            return Err(PakError::Corrupt(format!(
                "entry '{}' at {} overlaps the next entry at {}",
                name, offset, next
            )));
        }

        entries.push(DirectoryEntry {
            name: name.clone(),
            offset: *offset,
            length: next - offset,
        });
    }

    Ok(entries)
}

/// Size in bytes of the directory table for the given names, terminator included
pub fn directory_size<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|n| (OFFSET_SIZE + n.len() + 1) as u64)
        .sum::<u64>()
        + OFFSET_SIZE as u64
}

/// Write a directory table for `(name, offset)` pairs followed by the terminator
pub fn write_directory<W: Write>(mut writer: W, entries: &[DirectoryEntry]) -> Result<()> {
    for entry in entries {
        let offset = u32::try_from(entry.offset).map_err(|_| {
            PakError::Corrupt(format!(
                "{}: offset {} does not fit the 32-bit directory field",
                entry.name, entry.offset
            ))
        })?;
        writer.write_all(&offset.to_le_bytes())?;
        writer.write_all(entry.name.as_bytes())?;
        writer.write_all(&[0u8])?;
    }
    writer.write_all(&0u32.to_le_bytes())?;
    Ok(())
}

/// Check that a name can be stored in a directory table
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PakError::InvalidName("empty name".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(PakError::InvalidName(format!(
            "{} bytes (max {})",
            name.len(),
            MAX_NAME_LENGTH
        )));
    }
    if name.as_bytes().contains(&0) {
        return Err(PakError::InvalidName(format!("{:?} contains NUL", name)));
    }
    Ok(())
}

fn read_name<R: Read>(mut reader: R, position: u64) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        reader.read_exact(&mut byte).map_err(|_| {
            PakError::Corrupt(format!("truncated entry name at byte {}", position))
        })?;
        if byte[0] == 0 {
            break;
        }
        if bytes.len() == MAX_NAME_LENGTH {
            return Err(PakError::Corrupt(format!(
                "entry name at byte {} exceeds {} bytes",
                position, MAX_NAME_LENGTH
            )));
        }
        bytes.push(byte[0]);
    }

    if bytes.is_empty() {
        return Err(PakError::Corrupt(format!("empty entry name at byte {}", position)));
    }

    String::from_utf8(bytes)
        .map_err(|e| PakError::Corrupt(format!("invalid UTF-8 in entry name: {}", e)))
}

fn read_u32<R: Read>(mut reader: R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
