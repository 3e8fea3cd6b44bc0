use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pakvfs operations
pub type Result<T> = std::result::Result<T, PakError>;

/// Unified error type for all pakvfs operations
#[derive(Debug, Error)]
pub enum PakError {
    // Resolution errors
    #[error("Asset not found: {0}")]
    NotFound(String),

    // Archive errors
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Failed to load {}: {source}", .path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: Box<PakError>,
    },

    // Writer errors
    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    #[error("Duplicate entry name: {0}")]
    DuplicateEntry(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    TomlError(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PakError {
    /// Wrap an error as a construction failure for `path`
    pub fn load_failure(path: impl Into<PathBuf>, source: PakError) -> Self {
        PakError::LoadFailure {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// True for the recoverable "name absent" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, PakError::NotFound(_))
    }
}

impl From<toml::de::Error> for PakError {
    fn from(err: toml::de::Error) -> Self {
        PakError::TomlError(err.to_string())
    }
}

impl From<toml::ser::Error> for PakError {
    fn from(err: toml::ser::Error) -> Self {
        PakError::TomlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_names_path_and_cause() {
        let err = PakError::load_failure("data/DUNE.PAK", PakError::Corrupt("truncated".into()));
        let msg = err.to_string();
        assert!(msg.contains("DUNE.PAK"));
        assert!(msg.contains("truncated"));
        assert!(!err.is_not_found());
    }
}
