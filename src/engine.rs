//! Asset resolution engine
//!
//! Resolves logical asset names to bytes across loose files and PAK archives
//! found along the search roots. The index is built once and never changes.
//!
//! # Precedence
//!
//! - a loose file in root `i` beats a loose file in root `j > i`;
//! - any loose file beats any archived entry;
//! - an entry from the archive loaded `k`-th beats one loaded later;
//! - inside one archive the first listed entry wins (duplicates are reported).
//!
//! # Example
//!
//! ```no_run
//! use pakvfs_rs::{AssetEngine, SearchRoots};
//! use std::io::Read;
//!
//! let roots = SearchRoots::new(["user/data", "/usr/share/dunelegacy"]);
//! let engine = AssetEngine::build(&roots, false)?;
//!
//! let mut stream = engine.resolve("MOUSE.SHP")?;
//! let mut bytes = Vec::new();
//! stream.read_to_end(&mut bytes)?;
//! # Ok::<(), pakvfs_rs::PakError>(())
//! ```

use crate::archive::{is_archive_name, normalize_name, EntryStream, PakArchive, PAK_EXTENSIONS};
use crate::config::VfsConfig;
use crate::error::{PakError, Result};
use crate::search_path::{compute_search_roots, SearchRoots};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Construction options beyond the search roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Skip archives that fail to load instead of aborting
    pub save_mode: bool,
    /// Extensions recognized as archive containers
    pub archive_extensions: Vec<String>,
    /// Archive names loaded first within a root, in this order
    pub archive_order: Vec<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            save_mode: false,
            archive_extensions: PAK_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            archive_order: Vec::new(),
        }
    }
}

/// Where a logical name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Loose file found directly under search root `root`
    Loose { root: usize, path: PathBuf },
    /// Directory row `entry` of the `archive`-th loaded archive
    Archived { archive: usize, entry: usize },
}

/// One resolution record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Name as spelled on disk or in the archive directory
    pub name: String,
    pub source: AssetSource,
}

/// An archive left out of the index in save mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArchive {
    pub path: PathBuf,
    pub reason: String,
}

/// A name listed more than once inside one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateName {
    pub archive: String,
    pub name: String,
}

/// What construction encountered besides the index itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Archives or roots skipped because they failed to load
    pub skipped: Vec<SkippedArchive>,
    /// Duplicate names inside single archives
    pub duplicates: Vec<DuplicateName>,
    /// Loose files hidden by an earlier same-named file
    pub shadowed: Vec<PathBuf>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.duplicates.is_empty()
    }
}

/// Read-only asset index over loose files and loaded archives
///
/// `AssetEngine` is `Send + Sync`; share it by reference or `Arc` and call
/// [`resolve`](Self::resolve) from any thread.
pub struct AssetEngine {
    roots: SearchRoots,
    archives: Vec<PakArchive>,
    index: HashMap<String, IndexEntry>,
    report: LoadReport,
}

impl AssetEngine {
    /// Build the index over `roots` with default options
    pub fn build(roots: &SearchRoots, save_mode: bool) -> Result<Self> {
        let options = EngineOptions {
            save_mode,
            ..EngineOptions::default()
        };
        Self::build_with(roots, &options)
    }

    /// Compute the search roots from configuration and build the index
    pub fn from_config(config: &VfsConfig) -> Result<Self> {
        let roots = compute_search_roots(&config.install_hints());
        Self::build_with(&roots, &config.engine_options())
    }

    /// Build the index over `roots`
    pub fn build_with(roots: &SearchRoots, options: &EngineOptions) -> Result<Self> {
        let mut index: HashMap<String, IndexEntry> = HashMap::new();
        let mut report = LoadReport::default();
        let mut queued: Vec<PathBuf> = Vec::new();

        for (root_index, root) in roots.iter().enumerate() {
            if root.is_dir() {
                let files = match list_files(root) {
                    Ok(files) => files,
                    Err(e) => {
                        Self::skip_or_fail(root, e.into(), options.save_mode, &mut report)?;
                        continue;
                    }
                };

                let mut root_archives = Vec::new();
                for (file_name, path) in files {
                    let is_archive = is_archive_name(&file_name, &options.archive_extensions);
                    match index.entry(normalize_name(&file_name)) {
                        Entry::Vacant(slot) => {
                            slot.insert(IndexEntry {
                                name: file_name.clone(),
                                source: AssetSource::Loose {
                                    root: root_index,
                                    path: path.clone(),
                                },
                            });
                        }
                        Entry::Occupied(existing) => {
                            debug!("{:?} shadowed by {:?}", path, existing.get().source);
                            report.shadowed.push(path);
                            // A shadowed container is not loaded either
                            continue;
                        }
                    }
                    if is_archive {
                        root_archives.push((file_name, path));
                    }
                }

                sort_by_preference(&mut root_archives, &options.archive_order);
                queued.extend(root_archives.into_iter().map(|(_, path)| path));
            } else if root.is_file() && root_is_archive(root, &options.archive_extensions) {
                queued.push(root.clone());
            } else {
                debug!("Search root {:?} is neither a directory nor an archive", root);
            }
        }

        let mut archives = Vec::with_capacity(queued.len());
        let mut opened: HashSet<PathBuf> = HashSet::new();
        for path in queued {
            // The same container can be reached as a root and inside a root
            let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !opened.insert(key) {
                debug!("Archive {:?} already loaded", path);
                continue;
            }
            match PakArchive::open(&path) {
                Ok(archive) => archives.push(archive),
                Err(e) => Self::skip_or_fail(&path, e, options.save_mode, &mut report)?,
            }
        }

        for (archive_index, archive) in archives.iter().enumerate() {
            for name in archive.duplicates() {
                report.duplicates.push(DuplicateName {
                    archive: archive.label().to_string(),
                    name: name.clone(),
                });
            }

            for (entry_index, entry) in archive.list_entries().iter().enumerate() {
                index
                    .entry(normalize_name(&entry.name))
                    .or_insert_with(|| IndexEntry {
                        name: entry.name.clone(),
                        source: AssetSource::Archived {
                            archive: archive_index,
                            entry: entry_index,
                        },
                    });
            }
        }

        info!(
            "Asset index built: {} names from {} roots and {} archives ({} skipped)",
            index.len(),
            roots.len(),
            archives.len(),
            report.skipped.len()
        );

        Ok(Self {
            roots: roots.clone(),
            archives,
            index,
            report,
        })
    }

    fn skip_or_fail(
        path: &Path,
        error: PakError,
        save_mode: bool,
        report: &mut LoadReport,
    ) -> Result<()> {
        if !save_mode {
            return Err(PakError::load_failure(path, error));
        }
        warn!("Skipping {:?}: {}", path, error);
        report.skipped.push(SkippedArchive {
            path: path.to_path_buf(),
            reason: error.to_string(),
        });
        Ok(())
    }

    /// Open a fresh stream over the asset's bytes
    pub fn resolve(&self, name: &str) -> Result<EntryStream> {
        let entry = self
            .lookup(name)
            .ok_or_else(|| PakError::NotFound(name.to_string()))?;

        match &entry.source {
            AssetSource::Loose { path, .. } => match std::fs::read(path) {
                Ok(bytes) => Ok(EntryStream::new(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(PakError::NotFound(name.to_string()))
                }
                Err(e) => Err(e.into()),
            },
            AssetSource::Archived { archive, entry } => {
                self.archives[*archive].open_entry_at(*entry)
            }
        }
    }

    /// Read the asset fully
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.resolve(name).map(EntryStream::into_bytes)
    }

    /// Check if a name resolves, without opening anything
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Resolution record for `name`
    pub fn lookup(&self, name: &str) -> Option<&IndexEntry> {
        self.index.get(&normalize_name(name))
    }

    pub fn source(&self, name: &str) -> Option<&AssetSource> {
        self.lookup(name).map(|e| &e.source)
    }

    /// Human-readable origin of `name`: a loose path or `archive:entry`
    pub fn describe_source(&self, name: &str) -> Option<String> {
        let entry = self.lookup(name)?;
        Some(match &entry.source {
            AssetSource::Loose { path, .. } => path.display().to_string(),
            AssetSource::Archived { archive, .. } => {
                format!("{}:{}", self.archives[*archive].label(), entry.name)
            }
        })
    }

    /// Every indexed name as spelled at its winning source, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.values().map(|e| e.name.as_str()).collect();
        names.sort_by_cached_key(|n| normalize_name(n));
        names
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Loaded archives in load order
    pub fn archives(&self) -> &[PakArchive] {
        &self.archives
    }

    pub fn search_roots(&self) -> &SearchRoots {
        &self.roots
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }
}

impl Drop for AssetEngine {
    fn drop(&mut self) {
        // Release archive handles in reverse load order
        while let Some(archive) = self.archives.pop() {
            debug!("Closing archive {}", archive.label());
        }
    }
}

impl std::fmt::Debug for AssetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetEngine")
            .field("roots", &self.roots)
            .field("archives", &self.archives)
            .field("names", &self.index.len())
            .finish()
    }
}

/// Regular files directly under `root`, sorted by name
fn list_files(root: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push((name, path)),
            Err(raw) => warn!("Ignoring non-UTF-8 file name {:?}", raw),
        }
    }
    files.sort();
    Ok(files)
}

fn root_is_archive(root: &Path, extensions: &[String]) -> bool {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(|n| is_archive_name(n, extensions))
        .unwrap_or(false)
}

/// Preferred names first (in preference order), the rest by normalized name
fn sort_by_preference(archives: &mut [(String, PathBuf)], order: &[String]) {
    let rank: HashMap<String, usize> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (normalize_name(name), i))
        .collect();

    archives.sort_by_cached_key(|(name, _)| {
        let key = normalize_name(name);
        (rank.get(&key).copied().unwrap_or(usize::MAX), key)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::encode_pak;
    use tempfile::TempDir;

    fn write_pak(path: &Path, entries: &[(&str, &[u8])]) {
        std::fs::write(path, encode_pak(entries).unwrap()).unwrap();
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AssetEngine>();
    }

    #[test]
    fn test_archive_preference_order() {
        let mut archives = vec![
            ("A.PAK".to_string(), PathBuf::from("a")),
            ("dune.pak".to_string(), PathBuf::from("d")),
            ("ZZZ.PAK".to_string(), PathBuf::from("z")),
            ("LEGACY.PAK".to_string(), PathBuf::from("l")),
        ];
        sort_by_preference(&mut archives, &["LEGACY.PAK".into(), "DUNE.PAK".into()]);
        let names: Vec<&str> = archives.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["LEGACY.PAK", "dune.pak", "A.PAK", "ZZZ.PAK"]);
    }

    #[test]
    fn test_resolve_loose_and_archived() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("Loose.TXT"), b"loose")?;
        write_pak(&temp.path().join("DATA.PAK"), &[("INNER.BIN", b"inner".as_slice())]);

        let engine = AssetEngine::build(&SearchRoots::new([temp.path()]), false)?;
        assert_eq!(engine.read("loose.txt")?, b"loose");
        assert_eq!(engine.read("inner.bin")?, b"inner");
        assert!(engine.exists("DATA.PAK"));
        assert_eq!(engine.archives().len(), 1);
        assert_eq!(
            engine.source("inner.bin"),
            Some(&AssetSource::Archived { archive: 0, entry: 0 })
        );
        assert!(engine.describe_source("inner.bin").unwrap().ends_with(":INNER.BIN"));
        Ok(())
    }

    #[test]
    fn test_shadowed_archive_not_loaded() -> Result<()> {
        let high = TempDir::new()?;
        let low = TempDir::new()?;
        write_pak(&high.path().join("DUNE.PAK"), &[("A.BIN", b"high".as_slice())]);
        write_pak(
            &low.path().join("dune.pak"),
            &[("A.BIN", b"low".as_slice()), ("B.BIN", b"low".as_slice())],
        );

        let engine = AssetEngine::build(&SearchRoots::new([high.path(), low.path()]), false)?;
        assert_eq!(engine.archives().len(), 1);
        assert_eq!(engine.read("a.bin")?, b"high");
        assert!(!engine.exists("b.bin"));
        assert_eq!(engine.load_report().shadowed, vec![low.path().join("dune.pak")]);
        Ok(())
    }

    #[test]
    fn test_root_may_name_an_archive() -> Result<()> {
        let temp = TempDir::new()?;
        let pak = temp.path().join("MOD.PAK");
        write_pak(&pak, &[("UNIT.SHP", b"mod".as_slice())]);

        let engine = AssetEngine::build(&SearchRoots::new([pak]), false)?;
        assert_eq!(engine.read("unit.shp")?, b"mod");
        Ok(())
    }

    #[test]
    fn test_archive_reachable_twice_loads_once() -> Result<()> {
        let temp = TempDir::new()?;
        let pak = temp.path().join("MOD.PAK");
        write_pak(&pak, &[("UNIT.SHP", b"mod".as_slice())]);

        let roots = SearchRoots::new([pak.clone(), temp.path().to_path_buf()]);
        let engine = AssetEngine::build(&roots, false)?;
        assert_eq!(engine.archives().len(), 1);
        assert_eq!(engine.read("unit.shp")?, b"mod");
        assert!(engine.exists("mod.pak"));
        Ok(())
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_archives_closed_in_reverse_load_order() {
        let temp = TempDir::new().unwrap();
        for name in ["A.PAK", "B.PAK", "C.PAK"] {
            write_pak(&temp.path().join(name), &[("X", name.as_bytes())]);
        }

        let capture = CaptureWriter::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let engine = AssetEngine::build(&SearchRoots::new([temp.path()]), false).unwrap();
            assert_eq!(engine.read("x").unwrap(), b"A.PAK");
            assert_eq!(engine.archives().len(), 3);
            drop(engine);
        });

        let output = String::from_utf8(capture.0.lock().clone()).unwrap();
        let closed: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("Closing archive"))
            .map(str::trim_end)
            .collect();
        assert_eq!(closed.len(), 3, "{}", output);
        assert!(closed[0].ends_with("C.PAK"));
        assert!(closed[1].ends_with("B.PAK"));
        assert!(closed[2].ends_with("A.PAK"));
    }

    #[test]
    fn test_subdirectories_are_not_indexed() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir(temp.path().join("sub"))?;
        std::fs::write(temp.path().join("sub/deep.txt"), b"x")?;

        let engine = AssetEngine::build(&SearchRoots::new([temp.path()]), false)?;
        assert!(!engine.exists("deep.txt"));
        assert!(!engine.exists("sub"));
        assert!(engine.is_empty());
        Ok(())
    }

    #[test]
    fn test_names_sorted() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("b.txt"), b"")?;
        std::fs::write(temp.path().join("A.txt"), b"")?;

        let engine = AssetEngine::build(&SearchRoots::new([temp.path()]), false)?;
        assert_eq!(engine.names(), vec!["A.txt", "b.txt"]);
        Ok(())
    }
}
