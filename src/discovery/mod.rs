//! Input discovery and classification
//!
//! Turns a root path into the ordered list of files and directories that a
//! run should process:
//!
//! 1. Enumerate candidates by extension, by glob pattern, or as disc bundles
//!    (see [`find_bundles`]).
//! 2. Drop parity archives so generated output is never fed back in.
//! 3. Drop anything without content ([`filter_nonempty`]).
//!
//! Every function returns its paths in natural order with duplicates removed,
//! so a run over the same tree always visits items in the same order.

use crate::error::{Error, Result};
use crate::parity::PARITY_EXTENSION;
use crate::utils::{has_extension, natural_sort};
use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

mod bundles;

pub use bundles::{BundleMarker, find_bundles};

/// Extensions never treated as related files
const JUNK_EXTENSIONS: &[&str] = &["nzb", PARITY_EXTENSION, "torrent"];

/// Glob used for disc discovery when none is given
pub const DEFAULT_BUNDLE_PATTERN: &str = "*/";

/// How candidates are selected under the root
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Files whose extension is in the list
    Extensions(Vec<String>),
    /// Files and directories matching any of the glob patterns
    Glob(Vec<String>),
    /// Blu-ray discs (`BDMV/index.bdmv`) under directories matching the patterns
    Bdmv(Vec<String>),
    /// DVDs (`VIDEO_TS/VIDEO_TS.{VOB,IFO,BUP}`) under directories matching the patterns
    Dvd(Vec<String>),
}

impl Selection {
    /// Whether this selection yields directory bundles
    pub fn is_bundle(&self) -> bool {
        matches!(self, Selection::Bdmv(_) | Selection::Dvd(_))
    }
}

/// Enumerate the candidates under `root` for `selection`
///
/// A `root` that is a plain file short-circuits to a one-item list. Parity
/// archives are always excluded.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `root` does not exist.
pub fn discover(root: &Path, selection: &Selection) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(filter_parity_files(vec![root.to_path_buf()]));
    }

    let found = match selection {
        Selection::Extensions(exts) => enumerate_by_extension(root, exts)?,
        Selection::Glob(patterns) => enumerate_by_glob(root, patterns)?,
        Selection::Bdmv(patterns) => find_bundles(root, patterns, &BundleMarker::bdmv())?,
        Selection::Dvd(patterns) => find_bundles(root, patterns, &BundleMarker::dvd())?,
    };

    Ok(filter_parity_files(found))
}

fn require_dir(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::invalid_input(root, "path does not exist"));
    }
    if !root.is_dir() {
        return Err(Error::invalid_input(root, "path is not a directory"));
    }
    Ok(())
}

/// All files under `root` whose extension (case-insensitive, leading dot
/// ignored) is in `extensions`
pub fn enumerate_by_extension(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    require_dir(root)?;

    let wanted: Vec<&str> = extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .filter(|e| !e.is_empty())
        .collect();

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| wanted.iter().any(|ext| has_extension(path, ext)))
        .collect();

    natural_sort(&mut files);
    debug!(?root, count = files.len(), "enumerated files by extension");
    Ok(files)
}

/// A compiled glob pattern
///
/// `*` and `?` never cross a `/`; `**` does. A trailing `/` restricts the
/// pattern to directories.
struct PathPattern {
    matcher: GlobMatcher,
    dirs_only: bool,
    max_depth: Option<usize>,
}

impl PathPattern {
    fn new(pattern: &str) -> Result<Self> {
        let dirs_only = pattern.ends_with('/');
        let trimmed = pattern.trim_end_matches('/');
        let matcher = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        let max_depth = (!trimmed.contains("**")).then(|| trimmed.split('/').count());

        Ok(Self {
            matcher,
            dirs_only,
            max_depth,
        })
    }

    fn is_match(&self, relative: &str, is_dir: bool) -> bool {
        (!self.dirs_only || is_dir) && self.matcher.is_match(relative)
    }
}

/// Files and directories under `root` matching any of `patterns`
///
/// Patterns are relative to `root`. The result is the union over all patterns.
pub fn enumerate_by_glob(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    require_dir(root)?;

    let compiled = patterns
        .iter()
        .map(|p| PathPattern::new(p))
        .collect::<Result<Vec<_>>>()?;

    // Walk only as deep as the deepest pattern needs
    let max_depth = compiled
        .iter()
        .map(|p| p.max_depth)
        .try_fold(0usize, |acc, depth| depth.map(|d| acc.max(d)));

    let mut walker = WalkDir::new(root).follow_links(true).min_depth(1);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut matches = Vec::new();
    for entry in walker.into_iter().filter_map(|entry| entry.ok()) {
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let is_dir = entry.file_type().is_dir();

        if compiled.iter().any(|p| p.is_match(&relative, is_dir)) {
            matches.push(entry.into_path());
        }
    }

    natural_sort(&mut matches);
    debug!(?root, ?patterns, count = matches.len(), "enumerated glob matches");
    Ok(matches)
}

/// Drop parity archives (`.par2`, any case)
pub fn filter_parity_files(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = paths
        .into_iter()
        .filter(|path| !has_extension(path, PARITY_EXTENSION))
        .collect();
    natural_sort(&mut kept);
    kept
}

/// Keep files with at least one byte and directories holding at least one
/// non-empty file somewhere below them
///
/// Anything that is neither a file nor a directory is dropped too.
pub fn filter_nonempty(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = paths.into_iter().filter(|path| has_content(path)).collect();
    natural_sort(&mut kept);
    kept
}

fn has_content(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };

    if metadata.is_file() {
        return metadata.len() > 0;
    }

    if metadata.is_dir() {
        return WalkDir::new(path)
            .follow_links(true)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .any(|entry| entry.metadata().is_ok_and(|m| m.len() > 0));
    }

    false
}

/// Files that belong with `file`, such as unmuxed subtitles
///
/// Searches below the file's directory for files named after the file's stem
/// (followed by a separator such as `.` or ` `) whose extension is in
/// `extensions`. Receipts, parity archives, torrents and the file itself are
/// never included.
pub fn related_files(file: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let (Some(parent), Some(stem), Some(name)) = (
        file.parent(),
        file.file_stem().map(|s| s.to_string_lossy().into_owned()),
        file.file_name(),
    ) else {
        return Vec::new();
    };

    let mut related: Vec<PathBuf> = WalkDir::new(parent)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name() != name)
        .filter(|entry| shares_stem(&entry.file_name().to_string_lossy(), &stem))
        .map(|entry| entry.into_path())
        .filter(|path| extensions.iter().any(|ext| has_extension(path, ext)))
        .filter(|path| !JUNK_EXTENSIONS.iter().any(|junk| has_extension(path, junk)))
        .collect();

    natural_sort(&mut related);
    related
}

/// `name` is `stem` followed by a separator, so `ep1.en.srt` belongs to
/// `ep1.mkv` but `ep10.srt` does not
fn shares_stem(name: &str, stem: &str) -> bool {
    name.strip_prefix(stem)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_alphanumeric())
}

/// Move each plain file `dir/name.ext` into `dir/name/name.ext`
///
/// Directories are left untouched. Returns the new locations of the moved files.
pub fn move_into_own_dirs(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut moved = Vec::new();

    for source in files.iter().filter(|path| path.is_file()) {
        let (Some(parent), Some(stem), Some(name)) =
            (source.parent(), source.file_stem(), source.file_name())
        else {
            continue;
        };

        let folder = parent.join(stem);
        std::fs::create_dir_all(&folder)?;
        let destination = folder.join(name);
        std::fs::rename(source, &destination)?;

        debug!(?source, ?destination, "moved file into its own folder");
        moved.push(destination);
    }

    Ok(moved)
}
