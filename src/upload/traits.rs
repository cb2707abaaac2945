//! Traits and types for posting

use super::PARTIAL_SUCCESS_EXIT_CODE;
use crate::types::{ProcessOutput, WorkItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a posting tool invocation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Exit code 0
    Success,
    /// Completed after skipping recoverable per-article errors
    Partial,
    /// Any other exit, including death by signal
    Failed,
}

impl UploadStatus {
    /// Classify a posting tool exit code
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => UploadStatus::Success,
            Some(PARTIAL_SUCCESS_EXIT_CODE) => UploadStatus::Partial,
            _ => UploadStatus::Failed,
        }
    }

    /// Success and partial success both count as posted
    pub fn is_success(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Partial)
    }
}

/// Result of uploading one item
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Final receipt location (`None` unless the upload succeeded)
    pub nzb: Option<PathBuf>,
    /// Outcome
    pub status: UploadStatus,
    /// The invocation and what it printed
    pub output: ProcessOutput,
}

impl UploadReceipt {
    /// Whether the item counts as uploaded
    pub fn success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of reposting one raw article
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// The article that was resubmitted
    pub article: PathBuf,
    /// Outcome
    pub status: UploadStatus,
    /// The invocation and what it printed
    pub output: ProcessOutput,
}

impl RawOutput {
    /// Whether the article was posted
    pub fn success(&self) -> bool {
        self.status.is_success()
    }
}

/// Trait for posting items and reposting failed articles
///
/// Like [`crate::parity::ParityGenerator`], a posting tool that runs and
/// fails is reported through the returned status; `Err` is reserved for
/// problems around the tool (it cannot be started, the receipt cannot be
/// moved).
#[async_trait]
pub trait Poster: Send + Sync {
    /// Post `item` together with its related files and parity archives
    ///
    /// On success the receipt is moved into the output tree and the parity
    /// archives are deleted. On failure everything is left in place.
    async fn upload(
        &self,
        item: &WorkItem,
        parity_files: &[PathBuf],
        related: &[PathBuf],
    ) -> crate::Result<UploadReceipt>;

    /// Resubmit one previously failed raw article
    ///
    /// The tool deletes the article itself once it has been posted.
    async fn repost_raw(&self, article: &Path) -> crate::Result<RawOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
