//! pakvfs-rs: virtual filesystem over loose asset directories and PAK archives
//!
//! Game assets (sprites, sounds, data tables) live either as loose files in a
//! set of search roots or packed inside legacy PAK containers. This library
//! presents both behind one "open by name" interface:
//! - PAK directory table parsing and writing
//! - Ordered, deduplicated search roots from install hints
//! - A unique-resolution index with fixed precedence (loose beats archived)
//! - Install validation: missing assets and SHA-256 content digests
//!
//! # Example
//!
//! ```no_run
//! use pakvfs_rs::{AssetEngine, Inventory, VfsConfig};
//!
//! let config = VfsConfig::load("pakvfs.toml")?;
//! let engine = AssetEngine::from_config(&config)?;
//!
//! let palette = engine.read("IBM.PAL")?;
//! let missing = Inventory::new(&engine).missing_assets(&config.manifest());
//! # Ok::<(), pakvfs_rs::error::PakError>(())
//! ```

// Core modules
pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod search_path;

// Re-export commonly used types
pub use archive::{
    encode_pak, normalize_name, DirectoryEntry, EntryStream, PakArchive, PakWriter,
    MAX_NAME_LENGTH, PAK_EXTENSIONS,
};
pub use config::VfsConfig;
pub use engine::{AssetEngine, AssetSource, EngineOptions, IndexEntry, LoadReport, SkippedArchive};
pub use error::{PakError, Result};
pub use inventory::{
    required_asset_names, ContentDigest, FailedAsset, Inventory, InventoryReport, RequiredAsset,
    RequiredAssetManifest,
};
pub use search_path::{compute_search_roots, InstallHints, SearchRoots};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure core types are accessible
        let _options = EngineOptions::default();
        let _roots = SearchRoots::default();
        assert_eq!(normalize_name("A\\B.PAK"), "a/b.pak");
    }
}
