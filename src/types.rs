//! Core types for usenet-ul

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Upload scope
///
/// Each scope has its own posting-tool configuration and its own subtree in
/// the receipt output directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Public upload (falls back to the private posting config if none is set)
    Public,
    /// Private upload
    #[default]
    Private,
}

impl Scope {
    /// The literal written to the resume ledger and used as output subdirectory
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Public => "public",
            Scope::Private => "private",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Scope::Public),
            "private" => Ok(Scope::Private),
            other => Err(Error::Other(format!("unknown scope: {other}"))),
        }
    }
}

/// What a [`WorkItem`] points at
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single regular file
    File,
    /// A directory uploaded as one unit (e.g. a disc bundle)
    Directory,
}

/// A file or directory selected for processing
///
/// Built once from a path and never mutated afterwards; the pipeline only
/// passes it around by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    path: PathBuf,
    kind: ItemKind,
    size: u64,
    count: u64,
}

impl WorkItem {
    /// Stat `path` and build the item
    ///
    /// For a directory, `size` is the sum of all descendant file sizes and
    /// `count` the number of descendant files. A plain file has a count of 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the path is neither a file nor a directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .map_err(|e| Error::invalid_input(&path, format!("cannot stat: {e}")))?;

        if metadata.is_file() {
            return Ok(Self {
                path,
                kind: ItemKind::File,
                size: metadata.len(),
                count: 1,
            });
        }

        if metadata.is_dir() {
            let (size, count) = walkdir::WalkDir::new(&path)
                .follow_links(true)
                .min_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .fold((0u64, 0u64), |(size, count), entry| {
                    let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    (size + len, count + 1)
                });
            return Ok(Self {
                path,
                kind: ItemKind::Directory,
                size,
                count,
            });
        }

        Err(Error::invalid_input(path, "not a regular file or directory"))
    }

    /// Absolute (or caller-supplied) path of the item
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File or directory
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Total size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of descendant files (1 for a plain file)
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether the item is a plain file
    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    /// Basename of the item, lossily converted to UTF-8
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// How the parity tool records input paths inside the parity metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingMode {
    /// Only the file name is stored (single files)
    Basename,
    /// The path relative to the filepath base is stored (directory bundles)
    Path,
}

impl NamingMode {
    /// Naming mode required for an item of the given kind
    pub fn for_kind(kind: ItemKind) -> Self {
        match kind {
            ItemKind::File => NamingMode::Basename,
            ItemKind::Directory => NamingMode::Path,
        }
    }

    /// Value passed to `--filepath-format`
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingMode::Basename => "basename",
            NamingMode::Path => "path",
        }
    }
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured result of one external tool invocation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Full argument vector, program first
    pub args: Vec<String>,
    /// Exit code (`None` if the process was killed by a signal)
    pub exit_code: Option<i32>,
    /// Captured stdout (`None` when output was streamed to the console)
    pub stdout: Option<String>,
    /// Captured stderr (`None` when output was streamed to the console)
    pub stderr: Option<String>,
}

impl ProcessOutput {
    /// Exit code 0
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Event emitted while a batch is processed
///
/// Subscribers receive these over the broadcast channel handed to
/// [`crate::pipeline::UploadPipeline`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Classification finished
    ScanComplete {
        /// Paths matched by the selection
        matched: usize,
        /// Paths left after dropping empty content
        non_empty: usize,
        /// Paths left after the resume filter
        pending: usize,
    },

    /// Item skipped because the ledger already has it
    Skipped {
        /// Item basename
        name: String,
    },

    /// Parity generation started
    Generating {
        /// Item basename
        name: String,
    },

    /// Parity generation finished
    GenerateComplete {
        /// Item basename
        name: String,
        /// Number of parity files collected
        parity_files: usize,
        /// Whether the tool exited cleanly
        success: bool,
    },

    /// Upload started
    Uploading {
        /// Item basename
        name: String,
    },

    /// Upload finished successfully
    UploadComplete {
        /// Item basename
        name: String,
        /// Final receipt location
        nzb: PathBuf,
        /// The posting tool skipped some recoverable per-article errors
        partial: bool,
    },

    /// Upload failed
    UploadFailed {
        /// Item basename
        name: String,
        /// Exit code reported by the posting tool
        exit_code: Option<i32>,
    },

    /// Raw article repost finished
    RepostComplete {
        /// Article file name
        article: String,
        /// Whether the repost succeeded
        success: bool,
    },

    /// The run stopped early because cancellation was requested
    Cancelled {
        /// Items that were never attempted
        remaining: usize,
    },
}
