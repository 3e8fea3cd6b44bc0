mod format;
mod reader;
mod stream;
mod writer;

pub use format::{
    directory_size, is_archive_name, normalize_name, read_directory, validate_name,
    write_directory, DirectoryEntry, MAX_NAME_LENGTH, OFFSET_SIZE, PAK_EXTENSIONS,
};
pub use reader::PakArchive;
pub use stream::EntryStream;
pub use writer::{encode_pak, PakWriter};
