//! TOML configuration
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock search path, the built-in required asset list and strict loading.
//!
//! ```toml
//! language = "de"
//! save_mode = true
//! install_dirs = ["/opt/dune/data"]
//! extra_roots = ["mods/hd"]
//!
//! [checksums]
//! "DUNE.PAK" = "5a1b...e9"
//! ```

use crate::archive::PAK_EXTENSIONS;
use crate::engine::EngineOptions;
use crate::error::{PakError, Result};
use crate::inventory::{required_asset_names, RequiredAsset, RequiredAssetManifest};
use crate::search_path::InstallHints;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for building an [`AssetEngine`](crate::AssetEngine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Application directory name for platform default locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Game data install directories
    pub install_dirs: Vec<PathBuf>,

    /// User override directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_dir: Option<PathBuf>,

    /// Roots consulted before the user and install directories
    pub extra_roots: Vec<PathBuf>,

    /// Language code selecting localized sub-roots and language PAKs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Skip archives that fail to load instead of aborting
    pub save_mode: bool,

    /// Extensions recognized as archive containers
    pub archive_extensions: Vec<String>,

    /// Preferred archive load order; defaults to the required asset list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_order: Option<Vec<String>>,

    /// Names the installation must provide; defaults to the built-in list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_assets: Option<Vec<String>>,

    /// Expected SHA-256 digests (hex) keyed by asset name
    pub checksums: BTreeMap<String, String>,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            install_dirs: Vec::new(),
            user_dir: None,
            extra_roots: Vec::new(),
            language: None,
            save_mode: false,
            archive_extensions: PAK_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            archive_order: None,
            required_assets: None,
            checksums: BTreeMap::new(),
        }
    }
}

impl VfsConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would only fail later
    pub fn validate(&self) -> Result<()> {
        if self.archive_extensions.iter().any(|e| e.is_empty() || e.contains('.')) {
            return Err(PakError::Config(
                "archive_extensions must be bare extensions such as \"pak\"".to_string(),
            ));
        }

        for (name, digest) in &self.checksums {
            let valid = digest.len() == 64 && hex::decode(digest).is_ok();
            if !valid {
                return Err(PakError::Config(format!(
                    "checksum for {} is not a 64-digit hex SHA-256",
                    name
                )));
            }
        }

        if let Some(lang) = &self.language {
            if lang.contains(['/', '\\']) || lang == ".." {
                return Err(PakError::Config(format!("invalid language code {:?}", lang)));
            }
        }
        Ok(())
    }

    pub fn install_hints(&self) -> InstallHints {
        InstallHints {
            app_name: self.app_name.clone(),
            install_dirs: self.install_dirs.clone(),
            user_dir: self.user_dir.clone(),
            extra_roots: self.extra_roots.clone(),
            language: self.language.clone(),
        }
    }

    /// Names the installation must provide
    pub fn required_names(&self) -> Vec<String> {
        self.required_assets
            .clone()
            .unwrap_or_else(|| required_asset_names(self.language.as_deref()))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            save_mode: self.save_mode,
            archive_extensions: self.archive_extensions.clone(),
            archive_order: self
                .archive_order
                .clone()
                .unwrap_or_else(|| self.required_names()),
        }
    }

    /// Required asset manifest with any configured digests attached
    pub fn manifest(&self) -> RequiredAssetManifest {
        let mut checksums: BTreeMap<String, &String> = self
            .checksums
            .iter()
            .map(|(name, digest)| (crate::archive::normalize_name(name), digest))
            .collect();

        let mut assets: Vec<RequiredAsset> = self
            .required_names()
            .into_iter()
            .map(|name| {
                let sha256 = checksums
                    .remove(&crate::archive::normalize_name(&name))
                    .map(|d| d.to_ascii_lowercase());
                RequiredAsset { name, sha256 }
            })
            .collect();

        // Digests for names outside the required list are still verified
        for (name, digest) in self.checksums.iter() {
            if checksums.contains_key(&crate::archive::normalize_name(name)) {
                assets.push(RequiredAsset {
                    name: name.clone(),
                    sha256: Some(digest.to_ascii_lowercase()),
                });
            }
        }

        RequiredAssetManifest::from_assets(assets)
    }
}
