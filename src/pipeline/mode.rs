//! Run modes

use serde::{Deserialize, Serialize};

/// What a run does
///
/// At most one mode is active per run. When several mode flags are set,
/// [`RunMode::from_flags`] picks the one with the highest priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Repost raw articles, then generate and upload every pending item
    #[default]
    Full,
    /// Generate and upload without touching the raw article queue
    SkipRepost,
    /// Only generate parity archives, next to the inputs
    GenerateOnly,
    /// Only upload, using parity archives already next to the inputs
    UploadOnly,
    /// Only repost raw articles
    RepostOnly,
    /// Move every matched file into a folder of its own and stop
    Move,
    /// Delete every raw article
    ClearRaw,
    /// Delete the resume ledger
    ClearResume,
}

/// Mode switches as given on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeFlags {
    /// Delete the resume ledger
    pub clear_resume: bool,
    /// Delete raw articles
    pub clear_raw: bool,
    /// Only repost raw articles
    pub repost_only: bool,
    /// Move files into their own folders
    pub move_files: bool,
    /// Only run the parity tool
    pub generate_only: bool,
    /// Only run the posting tool
    pub upload_only: bool,
    /// Skip the raw article pass
    pub skip_repost: bool,
}

impl RunMode {
    /// Resolve flags to a mode
    ///
    /// Priority: clear-resume, clear-raw, repost-only, move, generate-only,
    /// upload-only, skip-repost, then the full run.
    pub fn from_flags(flags: ModeFlags) -> Self {
        if flags.clear_resume {
            RunMode::ClearResume
        } else if flags.clear_raw {
            RunMode::ClearRaw
        } else if flags.repost_only {
            RunMode::RepostOnly
        } else if flags.move_files {
            RunMode::Move
        } else if flags.generate_only {
            RunMode::GenerateOnly
        } else if flags.upload_only {
            RunMode::UploadOnly
        } else if flags.skip_repost {
            RunMode::SkipRepost
        } else {
            RunMode::Full
        }
    }

    /// Whether the parity tool runs
    pub fn generates(&self) -> bool {
        matches!(
            self,
            RunMode::Full | RunMode::SkipRepost | RunMode::GenerateOnly
        )
    }

    /// Whether the posting tool uploads items
    pub fn uploads(&self) -> bool {
        matches!(
            self,
            RunMode::Full | RunMode::SkipRepost | RunMode::UploadOnly
        )
    }

    /// Whether the raw article queue is drained
    pub fn reposts(&self) -> bool {
        matches!(self, RunMode::Full | RunMode::RepostOnly)
    }

    /// Whether the tools should work next to the inputs instead of in the work directory
    pub fn works_in_place(&self) -> bool {
        matches!(self, RunMode::GenerateOnly | RunMode::UploadOnly)
    }
}
