//! Install validation
//!
//! Reports which required assets an engine cannot resolve and computes
//! SHA-256 content digests so a validator can tell game data versions apart.
//! Nothing here changes resolution.
//!
//! # Usage
//!
//! ```no_run
//! use pakvfs_rs::{AssetEngine, Inventory, RequiredAssetManifest, SearchRoots};
//! # use pakvfs_rs::Result;
//!
//! # fn main() -> Result<()> {
//! let engine = AssetEngine::build(&SearchRoots::new(["data"]), true)?;
//! let manifest = RequiredAssetManifest::builtin(None);
//!
//! let inventory = Inventory::new(&engine);
//! for name in inventory.missing_assets(&manifest) {
//!     eprintln!("missing: {}", name);
//! }
//! println!("{}", inventory.report(&manifest).to_json()?);
//! # Ok(())
//! # }
//! ```

use crate::engine::AssetEngine;
use crate::error::{PakError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// PAK files every installation needs, in load-preference order
const BASE_PAKS: &[&str] = &[
    "LEGACY.PAK",
    "OPENSD2.PAK",
    "DUNE.PAK",
    "SCENARIO.PAK",
    "MENTAT.PAK",
    "VOC.PAK",
    "MERC.PAK",
    "FINALE.PAK",
    "INTRO.PAK",
    "INTROVOC.PAK",
    "SOUND.PAK",
];

/// Per-house PAK files, loaded after the language PAK
const HOUSE_PAKS: &[&str] = &["HARK.PAK", "ATRE.PAK", "ORDOS.PAK"];

/// Language PAK for a language code; English when unknown
fn language_pak(language: Option<&str>) -> &'static str {
    match language.map(|l| l.to_ascii_lowercase()).as_deref() {
        Some("de") | Some("german") => "GERMAN.PAK",
        Some("fr") | Some("french") => "FRENCH.PAK",
        _ => "ENGLISH.PAK",
    }
}

/// The client's built-in list of needed files for `language`
pub fn required_asset_names(language: Option<&str>) -> Vec<String> {
    BASE_PAKS
        .iter()
        .copied()
        .chain(std::iter::once(language_pak(language)))
        .chain(HOUSE_PAKS.iter().copied())
        .map(str::to_string)
        .collect()
}

/// One name the installation must provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAsset {
    pub name: String,

    /// Expected SHA-256 of the content (lower-case hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Externally supplied set of names the application depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAssetManifest {
    assets: Vec<RequiredAsset>,
}

impl RequiredAssetManifest {
    /// Manifest from plain names, without expected digests
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_assets(names.into_iter().map(|name| RequiredAsset {
            name: name.into(),
            sha256: None,
        }))
    }

    /// Manifest from assets; a repeated name keeps its first entry
    pub fn from_assets<I>(assets: I) -> Self
    where
        I: IntoIterator<Item = RequiredAsset>,
    {
        let mut seen = BTreeSet::new();
        let assets = assets
            .into_iter()
            .filter(|a| seen.insert(crate::archive::normalize_name(&a.name)))
            .collect();
        Self { assets }
    }

    /// The built-in needed-file list
    pub fn builtin(language: Option<&str>) -> Self {
        Self::new(required_asset_names(language))
    }

    pub fn assets(&self) -> &[RequiredAsset] {
        &self.assets
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// SHA-256 digest of an asset's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Compare against a hex digest, ignoring case
    pub fn matches_hex(&self, expected: &str) -> bool {
        self.to_hex().eq_ignore_ascii_case(expected)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A required asset whose content differs from the expected digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumMismatch {
    pub name: String,
    pub expected: String,
    pub actual: String,
}

/// One resolvable required asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentAsset {
    pub name: String,
    /// Loose path or `archive:entry`
    pub source: String,
    pub size: u64,
    pub sha256: String,
}

/// A required asset that resolves but could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAsset {
    pub name: String,
    pub reason: String,
}

/// Serializable install validation result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub present: Vec<PresentAsset>,
    pub missing: Vec<String>,
    pub mismatched: Vec<ChecksumMismatch>,
    /// Indexed assets whose content could not be read
    #[serde(default)]
    pub failed: Vec<FailedAsset>,
    /// Archives skipped at load time, as `path: reason`
    #[serde(default)]
    pub skipped_archives: Vec<String>,
}

impl InventoryReport {
    /// True when every asset was read and every digest matches
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.failed.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Diagnostic view over a built engine
#[derive(Debug, Clone, Copy)]
pub struct Inventory<'a> {
    engine: &'a AssetEngine,
}

impl<'a> Inventory<'a> {
    pub fn new(engine: &'a AssetEngine) -> Self {
        Self { engine }
    }

    /// Every manifest name the engine cannot resolve
    pub fn missing_assets(&self, manifest: &RequiredAssetManifest) -> BTreeSet<String> {
        manifest
            .names()
            .filter(|name| !self.engine.exists(name))
            .map(str::to_string)
            .collect()
    }

    /// SHA-256 of the resolved content of `name`
    pub fn checksum(&self, name: &str) -> Result<ContentDigest> {
        let mut stream = self.engine.resolve(name)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut stream, &mut hasher)?;
        Ok(ContentDigest(hasher.finalize().into()))
    }

    /// Required assets present with a content digest other than expected
    ///
    /// Assets that cannot be read are left out; [`report`](Self::report)
    /// lists them under `failed`.
    pub fn mismatched_assets(&self, manifest: &RequiredAssetManifest) -> Vec<ChecksumMismatch> {
        let mut mismatched = Vec::new();
        for asset in manifest.assets() {
            let Some(expected) = &asset.sha256 else {
                continue;
            };
            let actual = match self.checksum(&asset.name) {
                Ok(digest) => digest,
                Err(PakError::NotFound(_)) => continue,
                Err(e) => {
                    warn!("Cannot checksum {}: {}", asset.name, e);
                    continue;
                }
            };
            if !actual.matches_hex(expected) {
                mismatched.push(ChecksumMismatch {
                    name: asset.name.clone(),
                    expected: expected.to_ascii_lowercase(),
                    actual: actual.to_hex(),
                });
            }
        }
        mismatched
    }

    /// Full report over `manifest`
    pub fn report(&self, manifest: &RequiredAssetManifest) -> InventoryReport {
        let mut report = InventoryReport::default();

        for asset in manifest.assets() {
            let bytes = match self.engine.read(&asset.name) {
                Ok(bytes) => bytes,
                Err(PakError::NotFound(_)) => {
                    report.missing.push(asset.name.clone());
                    continue;
                }
                Err(e) => {
                    warn!("Cannot read {}: {}", asset.name, e);
                    report.failed.push(FailedAsset {
                        name: asset.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let digest = ContentDigest::of(&bytes);
            if let Some(expected) = &asset.sha256 {
                if !digest.matches_hex(expected) {
                    report.mismatched.push(ChecksumMismatch {
                        name: asset.name.clone(),
                        expected: expected.to_ascii_lowercase(),
                        actual: digest.to_hex(),
                    });
                }
            }

            report.present.push(PresentAsset {
                name: asset.name.clone(),
                source: self.engine.describe_source(&asset.name).unwrap_or_default(),
                size: bytes.len() as u64,
                sha256: digest.to_hex(),
            });
        }

        report.skipped_archives = self
            .engine
            .load_report()
            .skipped
            .iter()
            .map(|s| format!("{}: {}", s.path.display(), s.reason))
            .collect();

        report
    }
}
