//! Traits and types for parity generation

use crate::types::{NamingMode, ProcessOutput, WorkItem};
use async_trait::async_trait;
use std::path::PathBuf;

/// Parity archives produced for one [`WorkItem`]
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityArtifactSet {
    /// Archives found after the tool exited, in natural order
    pub parity_files: Vec<PathBuf>,
    /// How input paths were recorded inside the archives
    pub naming_mode: NamingMode,
    /// Directory the recorded paths are relative to
    pub base_path: PathBuf,
    /// Whether the tool exited cleanly
    pub success: bool,
    /// The invocation and what it printed
    pub output: ProcessOutput,
}

impl ParityArtifactSet {
    /// Archives that already exist on disk and need no tool invocation
    pub fn existing(item: &WorkItem, parity_files: Vec<PathBuf>) -> Self {
        Self {
            parity_files,
            naming_mode: NamingMode::for_kind(item.kind()),
            base_path: item.path().parent().map(PathBuf::from).unwrap_or_default(),
            success: true,
            output: ProcessOutput::default(),
        }
    }

    /// Exit code of the parity tool, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        self.output.exit_code
    }
}

/// Trait for generating parity archives
///
/// A tool that runs but exits non-zero is reported through
/// [`ParityArtifactSet::success`], not as an error. Archives collected from a
/// failed run are still returned so they can be inspected.
#[async_trait]
pub trait ParityGenerator: Send + Sync {
    /// Generate parity archives for `item`
    ///
    /// `related` files are protected by the same archive set.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started or the scratch
    /// directory cannot be created.
    async fn generate(
        &self,
        item: &WorkItem,
        related: &[PathBuf],
    ) -> crate::Result<ParityArtifactSet>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
