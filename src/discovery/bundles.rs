//! Disc bundle discovery
//!
//! A disc image on disk is a directory tree identified by a marker file at a
//! fixed relative location, e.g.
//!
//! ```text
//! [BDMV] Big Buck Bunny
//! ├── Big Buck Bunny [Vol.1]
//! │   └── DISC_01
//! │       └── BDMV
//! │           ├── index.bdmv
//! │           └── MovieObject.bdmv
//! └── Big Buck Bunny [Vol.2]
//!     └── DISC_01
//!         └── BDMV
//!             └── index.bdmv
//! ```
//!
//! Each `BDMV/index.bdmv` found collapses to its disc root (`DISC_01`), so the
//! example yields two bundles.

use super::enumerate_by_glob;
use crate::error::Result;
use crate::utils::natural_sort;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Marker file that identifies a disc root
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleMarker {
    /// Directory components between the disc root and the marker file
    dirs: Vec<String>,
    /// Accepted marker file names
    files: Vec<String>,
    case_insensitive: bool,
}

impl BundleMarker {
    /// Marker at `relpath` below the disc root, matched exactly
    pub fn new(relpath: &str) -> Self {
        let mut parts: Vec<String> = relpath
            .split('/')
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        let file = parts.pop().unwrap_or_default();

        Self {
            dirs: parts,
            files: vec![file],
            case_insensitive: false,
        }
    }

    /// Blu-ray: `BDMV/index.bdmv`
    pub fn bdmv() -> Self {
        Self::new("BDMV/index.bdmv")
    }

    /// DVD: any of `VIDEO_TS/VIDEO_TS.{VOB,IFO,BUP}`, case-insensitive
    pub fn dvd() -> Self {
        Self {
            dirs: vec!["VIDEO_TS".into()],
            files: vec![
                "VIDEO_TS.VOB".into(),
                "VIDEO_TS.IFO".into(),
                "VIDEO_TS.BUP".into(),
            ],
            case_insensitive: true,
        }
    }

    /// Number of path components from the disc root down to the marker file
    fn depth(&self) -> usize {
        self.dirs.len() + 1
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_insensitive {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    }

    /// Disc root for `path` if it is a marker file
    fn disc_root(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?.to_string_lossy();
        if !self.files.iter().any(|f| self.names_match(f, &name)) {
            return None;
        }

        let mut dir = path.parent()?;
        for expected in self.dirs.iter().rev() {
            let actual = dir.file_name()?.to_string_lossy();
            if !self.names_match(expected, &actual) {
                return None;
            }
            dir = dir.parent()?;
        }

        Some(dir.to_path_buf())
    }
}

/// Disc roots below the directories matched by `patterns`
///
/// Every marker found yields its own disc root, so a directory holding N
/// discs yields N bundles. A matched directory with no marker at all yields
/// nothing; matches that are plain files are ignored.
pub fn find_bundles(root: &Path, patterns: &[String], marker: &BundleMarker) -> Result<Vec<PathBuf>> {
    let mut bundles = Vec::new();

    for folder in enumerate_by_glob(root, patterns)?
        .into_iter()
        .filter(|path| path.is_dir())
    {
        for entry in WalkDir::new(&folder)
            .follow_links(true)
            .min_depth(marker.depth())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            if let Some(disc) = marker.disc_root(entry.path()) {
                let shown = disc.strip_prefix(root).unwrap_or(&disc);
                info!(disc = %shown.display(), "found disc");
                bundles.push(disc);
            }
        }
    }

    natural_sort(&mut bundles);
    Ok(bundles)
}
