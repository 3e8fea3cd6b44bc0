use std::io::{Cursor, Read, Seek, SeekFrom};

/// An independent, seekable byte stream over one resolved asset.
///
/// Streams own their bytes, so any number of them may be open over the same
/// archive or loose file at once.
#[derive(Debug, Clone)]
pub struct EntryStream {
    data: Cursor<Vec<u8>>,
}

impl EntryStream {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Cursor::new(data),
        }
    }

    /// Total length of the stream in bytes
    pub fn len(&self) -> u64 {
        self.data.get_ref().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }

    /// Borrow the full contents regardless of the current position
    pub fn as_bytes(&self) -> &[u8] {
        self.data.get_ref()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_inner()
    }
}

impl Read for EntryStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.data.read(buf)
    }
}

impl Seek for EntryStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.data.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_read_and_seek() {
        let mut stream = EntryStream::new(b"Hello, World!".to_vec());
        assert_eq!(stream.len(), 13);

        stream.seek(SeekFrom::Start(7)).unwrap();
        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "World!");

        // Position does not affect the borrowed view
        assert_eq!(stream.as_bytes(), b"Hello, World!");
    }
}
