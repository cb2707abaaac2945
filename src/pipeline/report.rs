//! Run reports

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Process exit code for a run with no failures
pub const EXIT_OK: i32 = 0;
/// At least one item or article failed
pub const EXIT_FAILURES: i32 = 1;
/// Invalid configuration or input
pub const EXIT_FATAL: i32 = 2;
/// Nothing matched, or every match was empty
pub const EXIT_NO_INPUT: i32 = 3;
/// Interrupted
pub const EXIT_INTERRUPTED: i32 = 130;

/// Why a run had nothing to process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NothingToDo {
    /// The selection matched nothing
    NoMatches,
    /// Every match was empty
    AllEmpty,
    /// Every non-empty match is already in the resume ledger
    AllUploaded,
    /// Repost-only run with an empty drop directory
    NoRawArticles,
}

/// How a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every pending item was attempted
    Completed,
    /// Nothing needed doing
    NothingToDo(NothingToDo),
    /// The ledger or the raw article queue was cleared
    Cleared,
    /// Stopped early on request
    Cancelled,
}

/// What happened to one item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Uploaded and recorded
    Uploaded {
        /// Final receipt location
        nzb: PathBuf,
    },
    /// Uploaded and recorded, with some articles skipped by the posting tool
    UploadedPartial {
        /// Final receipt location
        nzb: PathBuf,
    },
    /// Parity archives generated (generate-only runs)
    Generated {
        /// Number of archives produced
        parity_files: usize,
    },
    /// Parity generation failed; the item was not uploaded
    ParityFailed {
        /// Exit code of the parity tool
        exit_code: Option<i32>,
        /// Error raised around the tool, if any
        error: Option<String>,
    },
    /// The upload failed
    UploadFailed {
        /// Exit code of the posting tool
        exit_code: Option<i32>,
        /// Error raised around the tool, if any
        error: Option<String>,
    },
    /// Already in the resume ledger
    Skipped,
}

impl ItemOutcome {
    /// Whether this outcome needs operator attention
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ItemOutcome::ParityFailed { .. } | ItemOutcome::UploadFailed { .. }
        )
    }
}

/// One item's line in the report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    /// Item path
    pub path: PathBuf,
    /// Item basename
    pub name: String,
    /// What happened
    pub outcome: ItemOutcome,
}

/// One raw article's line in the report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepostReport {
    /// Article path
    pub article: PathBuf,
    /// Whether it was posted
    pub success: bool,
    /// Exit code of the posting tool
    pub exit_code: Option<i32>,
}

/// Everything a run did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// How the run ended
    pub status: RunStatus,
    /// Per-item outcomes, in processing order
    pub items: Vec<ItemReport>,
    /// Per-article repost outcomes
    pub reposts: Vec<RepostReport>,
    /// New locations of files moved into their own folders
    pub moved: Vec<PathBuf>,
    /// Number of raw articles deleted
    pub cleared_articles: usize,
}

impl RunReport {
    /// Empty report with the given status
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            items: Vec::new(),
            reposts: Vec::new(),
            moved: Vec::new(),
            cleared_articles: 0,
        }
    }

    /// Items and articles that failed
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_failure()).count()
            + self.reposts.iter().filter(|r| !r.success).count()
    }

    /// Items that ended up uploaded
    pub fn uploaded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(
                    i.outcome,
                    ItemOutcome::Uploaded { .. } | ItemOutcome::UploadedPartial { .. }
                )
            })
            .count()
    }

    /// Items skipped because they were already uploaded
    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome == ItemOutcome::Skipped)
            .count()
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::Cancelled => EXIT_INTERRUPTED,
            RunStatus::NothingToDo(NothingToDo::NoMatches | NothingToDo::AllEmpty) => {
                EXIT_NO_INPUT
            }
            _ if self.failures() > 0 => EXIT_FAILURES,
            _ => EXIT_OK,
        }
    }
}
