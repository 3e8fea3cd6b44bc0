//! Search path computation
//!
//! Produces the ordered list of locations consulted for assets, highest
//! priority first:
//!
//! 1. extra roots named in the configuration,
//! 2. the user override directory,
//! 3. every install directory.
//!
//! When a language is configured, `<dir>/<language>` is placed directly in
//! front of each user and install directory so localized assets shadow the
//! defaults. Absent locations are skipped and duplicates keep their first
//! (highest) position.

use std::path::{Path, PathBuf};

/// Application name used for platform default locations
pub const DEFAULT_APP_NAME: &str = "dunelegacy";

/// Inputs for [`compute_search_roots`]; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallHints {
    /// Application directory name under the platform data locations
    pub app_name: Option<String>,
    /// Game data install directories, highest priority first
    pub install_dirs: Vec<PathBuf>,
    /// User override directory
    pub user_dir: Option<PathBuf>,
    /// Additional roots consulted before everything else
    pub extra_roots: Vec<PathBuf>,
    /// Language code for localized sub-roots (e.g. `de`)
    pub language: Option<String>,
}

impl InstallHints {
    fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    /// User directory, falling back to `<data dir>/<app>/data`
    pub fn effective_user_dir(&self) -> Option<PathBuf> {
        self.user_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(self.app_name()).join("data")))
    }

    /// Install directories, falling back to the platform install locations
    pub fn effective_install_dirs(&self) -> Vec<PathBuf> {
        if !self.install_dirs.is_empty() {
            return self.install_dirs.clone();
        }
        default_install_dirs(self.app_name())
    }
}

#[cfg(unix)]
fn default_install_dirs(app_name: &str) -> Vec<PathBuf> {
    vec![
        Path::new("/usr/local/share").join(app_name),
        Path::new("/usr/share").join(app_name),
    ]
}

#[cfg(not(unix))]
fn default_install_dirs(_app_name: &str) -> Vec<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .into_iter()
        .collect()
}

/// Ordered, deduplicated search roots, highest priority first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    roots: Vec<PathBuf>,
}

impl SearchRoots {
    /// Build from explicit paths; later duplicates are dropped, no I/O
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots: Vec<PathBuf> = Vec::new();
        for path in paths {
            let path = path.into();
            if !roots.contains(&path) {
                roots.push(path);
            }
        }
        Self { roots }
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<'a> IntoIterator for &'a SearchRoots {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.iter()
    }
}

/// Compute the search roots for the given hints.
///
/// Only existence checks touch the filesystem. Paths that exist are compared
/// by canonical form so `data/` and `./data` collapse into one root.
pub fn compute_search_roots(hints: &InstallHints) -> SearchRoots {
    let mut candidates: Vec<PathBuf> = hints.extra_roots.clone();

    if let Some(user_dir) = hints.effective_user_dir() {
        push_with_localized(&mut candidates, user_dir, hints.language.as_deref());
    }
    for dir in hints.effective_install_dirs() {
        push_with_localized(&mut candidates, dir, hints.language.as_deref());
    }

    let mut roots = Vec::new();
    let mut seen = Vec::new();

    for candidate in candidates {
        if !candidate.exists() {
            continue;
        }
        let canonical = std::fs::canonicalize(&candidate).unwrap_or_else(|_| candidate.clone());
        if seen.contains(&canonical) {
            continue;
        }
        seen.push(canonical);
        roots.push(candidate);
    }

    SearchRoots { roots }
}

fn push_with_localized(out: &mut Vec<PathBuf>, dir: PathBuf, language: Option<&str>) {
    if let Some(lang) = language.filter(|l| !l.is_empty()) {
        out.push(dir.join(lang));
    }
    out.push(dir);
}
