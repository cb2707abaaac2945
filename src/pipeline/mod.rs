//! Upload pipeline
//!
//! Drives one batch from a root path to uploaded receipts:
//!
//! 1. Repost raw articles left over from earlier runs (full runs only)
//! 2. Discover items under the root and drop empty ones
//! 3. Drop items already in the resume ledger
//! 4. Per item, in order: generate parity, upload, record in the ledger
//!
//! Items are independent. A failure is reported for that item and the batch
//! moves on; the item is not recorded, so the next run retries it. An item
//! whose parity generation failed is never uploaded.
//!
//! Cancellation is checked between items. The item in flight runs to
//! completion, so the ledger always reflects every finished upload.

use crate::discovery::{Selection, discover, filter_nonempty, move_into_own_dirs, related_files};
use crate::error::Result;
use crate::parity::{ParityArtifactSet, ParityGenerator, find_existing_parity};
use crate::resume::{ResumeLedger, ResumeRecord};
use crate::types::{Event, Scope, WorkItem};
use crate::upload::{Poster, UploadStatus, clear_raw_articles, list_raw_articles};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod mode;
mod report;

pub use mode::{ModeFlags, RunMode};
pub use report::{
    EXIT_FAILURES, EXIT_FATAL, EXIT_INTERRUPTED, EXIT_NO_INPUT, EXIT_OK, ItemOutcome, ItemReport,
    NothingToDo, RepostReport, RunReport, RunStatus,
};

/// What a batch runs over
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// File or directory to process
    pub root: PathBuf,
    /// How items are selected under the root
    pub selection: Selection,
    /// Upload scope
    pub scope: Scope,
    /// What the run does
    pub mode: RunMode,
    /// Extensions of files uploaded together with a plain-file item
    pub related_extensions: Vec<String>,
    /// Drop directory for raw articles
    pub raw_dump_dir: PathBuf,
}

/// Batch executor
pub struct UploadPipeline {
    /// Event channel for emitting progress events
    event_tx: broadcast::Sender<Event>,
    options: PipelineOptions,
    generator: Arc<dyn ParityGenerator>,
    poster: Arc<dyn Poster>,
    ledger: ResumeLedger,
    cancel: CancellationToken,
}

impl UploadPipeline {
    /// Create a pipeline
    pub fn new(
        event_tx: broadcast::Sender<Event>,
        options: PipelineOptions,
        generator: Arc<dyn ParityGenerator>,
        poster: Arc<dyn Poster>,
        ledger: ResumeLedger,
    ) -> Self {
        Self {
            event_tx,
            options,
            generator,
            poster,
            ledger,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between items once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run between items
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Run the batch
    ///
    /// # Errors
    ///
    /// Only fatal problems are returned: an unusable root, an invalid glob,
    /// an unreadable ledger. Tool failures end up in the report.
    pub async fn run(&self) -> Result<RunReport> {
        let mode = self.options.mode;
        info!(
            root = ?self.options.root,
            ?mode,
            scope = %self.options.scope,
            generator = self.generator.name(),
            poster = self.poster.name(),
            "starting run"
        );

        match mode {
            RunMode::ClearResume => {
                self.ledger.clear().await?;
                return Ok(RunReport::new(RunStatus::Cleared));
            }
            RunMode::ClearRaw => {
                let mut report = RunReport::new(RunStatus::Cleared);
                report.cleared_articles = clear_raw_articles(&self.options.raw_dump_dir).await?;
                return Ok(report);
            }
            RunMode::RepostOnly => {
                let mut report = RunReport::new(RunStatus::Completed);
                let articles = list_raw_articles(&self.options.raw_dump_dir)?;
                if articles.is_empty() {
                    info!("no raw articles available for reposting");
                    report.status = RunStatus::NothingToDo(NothingToDo::NoRawArticles);
                    return Ok(report);
                }
                if !self.repost_all(articles, &mut report).await {
                    report.status = RunStatus::Cancelled;
                }
                return Ok(report);
            }
            _ => {}
        }

        let matched = discover(&self.options.root, &self.options.selection)?;
        if matched.is_empty() {
            warn!(root = ?self.options.root, "no matching files or folders found");
            return Ok(RunReport::new(RunStatus::NothingToDo(NothingToDo::NoMatches)));
        }

        if mode == RunMode::Move {
            let mut report = RunReport::new(RunStatus::Completed);
            report.moved = move_into_own_dirs(&matched)?;
            info!(moved = report.moved.len(), "moved files into their own folders");
            return Ok(report);
        }

        let matched_count = matched.len();
        let non_empty = filter_nonempty(matched);
        debug!(
            total = matched_count,
            empty = matched_count - non_empty.len(),
            "filtered empty inputs"
        );
        if non_empty.is_empty() {
            warn!("matching files or folders found, but all of them are empty");
            return Ok(RunReport::new(RunStatus::NothingToDo(NothingToDo::AllEmpty)));
        }
        let non_empty_count = non_empty.len();

        let items = non_empty
            .into_iter()
            .map(WorkItem::from_path)
            .collect::<Result<Vec<_>>>()?;

        let mut report = RunReport::new(RunStatus::Completed);
        let pending = self
            .ledger
            .filter_unrecorded(items.clone(), self.options.scope)
            .await?;
        for item in items.iter().filter(|item| !pending.contains(item)) {
            self.record_skip(item, &mut report);
        }

        self.emit_event(Event::ScanComplete {
            matched: matched_count,
            non_empty: non_empty_count,
            pending: pending.len(),
        });

        if pending.is_empty() {
            info!("everything matched was already uploaded, nothing to do");
            report.status = RunStatus::NothingToDo(NothingToDo::AllUploaded);
            return Ok(report);
        }

        if mode.reposts() {
            let articles = list_raw_articles(&self.options.raw_dump_dir)?;
            if !articles.is_empty() {
                info!(count = articles.len(), "reposting raw articles from an earlier run");
                if !self.repost_all(articles, &mut report).await {
                    self.cancelled(pending.len(), &mut report);
                    return Ok(report);
                }
            }
        } else if mode == RunMode::SkipRepost {
            warn!("raw article reposting is skipped");
        }

        for (index, item) in pending.iter().enumerate() {
            if self.cancel.is_cancelled() {
                self.cancelled(pending.len() - index, &mut report);
                break;
            }

            let record = ResumeRecord::for_item(item, self.options.scope);
            if self.ledger.is_recorded(&record).await? {
                self.record_skip(item, &mut report);
                continue;
            }

            let outcome = self.process_item(item).await?;
            report.items.push(ItemReport {
                path: item.path().to_path_buf(),
                name: item.name(),
                outcome,
            });
        }

        info!(
            uploaded = report.uploaded(),
            skipped = report.skipped(),
            failures = report.failures(),
            "run finished"
        );
        Ok(report)
    }

    fn record_skip(&self, item: &WorkItem, report: &mut RunReport) {
        self.emit_event(Event::Skipped { name: item.name() });
        report.items.push(ItemReport {
            path: item.path().to_path_buf(),
            name: item.name(),
            outcome: ItemOutcome::Skipped,
        });
    }

    fn cancelled(&self, remaining: usize, report: &mut RunReport) {
        warn!(remaining, "run cancelled");
        self.emit_event(Event::Cancelled { remaining });
        report.status = RunStatus::Cancelled;
    }

    /// Repost every article; returns false if cancelled part way
    async fn repost_all(&self, articles: Vec<PathBuf>, report: &mut RunReport) -> bool {
        for article in articles {
            if self.cancel.is_cancelled() {
                return false;
            }

            let name = article
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let (success, exit_code) = match self.poster.repost_raw(&article).await {
                Ok(raw) => (raw.success(), raw.output.exit_code),
                Err(e) => {
                    error!(article = %name, error = %e, "raw article repost failed");
                    (false, None)
                }
            };

            self.emit_event(Event::RepostComplete {
                article: name,
                success,
            });
            report.reposts.push(RepostReport {
                article,
                success,
                exit_code,
            });
        }
        true
    }

    /// Generate, upload and record one item
    ///
    /// Fatal errors propagate; anything else becomes a failed outcome.
    async fn process_item(&self, item: &WorkItem) -> Result<ItemOutcome> {
        let mode = self.options.mode;
        let name = item.name();

        let related = if item.is_file() {
            related_files(item.path(), &self.options.related_extensions)
        } else {
            Vec::new()
        };
        if related.is_empty() {
            debug!(item = %name, "no related files");
        } else {
            info!(item = %name, count = related.len(), "found related files");
        }

        let parity = if mode.generates() {
            self.emit_event(Event::Generating { name: name.clone() });
            let parity = match self.generator.generate(item, &related).await {
                Ok(parity) => parity,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(item = %name, error = %e, "parity generation failed");
                    self.emit_event(Event::GenerateComplete {
                        name,
                        parity_files: 0,
                        success: false,
                    });
                    return Ok(ItemOutcome::ParityFailed {
                        exit_code: None,
                        error: Some(e.to_string()),
                    });
                }
            };

            self.emit_event(Event::GenerateComplete {
                name: name.clone(),
                parity_files: parity.parity_files.len(),
                success: parity.success,
            });

            if !parity.success {
                error!(item = %name, exit_code = ?parity.exit_code(), "parity generation failed, not uploading");
                return Ok(ItemOutcome::ParityFailed {
                    exit_code: parity.exit_code(),
                    error: None,
                });
            }
            parity
        } else {
            let existing = find_existing_parity(item);
            if existing.is_empty() {
                warn!(item = %name, "no parity files found next to the item, uploading without recovery data");
            } else {
                debug!(item = %name, count = existing.len(), "using existing parity files");
            }
            ParityArtifactSet::existing(item, existing)
        };

        if !mode.uploads() {
            info!(item = %name, "parity files generated");
            return Ok(ItemOutcome::Generated {
                parity_files: parity.parity_files.len(),
            });
        }

        self.emit_event(Event::Uploading { name: name.clone() });
        let receipt = match self.poster.upload(item, &parity.parity_files, &related).await {
            Ok(receipt) => receipt,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(item = %name, error = %e, "upload failed");
                self.emit_event(Event::UploadFailed {
                    name,
                    exit_code: None,
                });
                return Ok(ItemOutcome::UploadFailed {
                    exit_code: None,
                    error: Some(e.to_string()),
                });
            }
        };

        let nzb = match (receipt.status, receipt.nzb) {
            (UploadStatus::Success | UploadStatus::Partial, Some(nzb)) => nzb,
            _ => {
                error!(item = %name, exit_code = ?receipt.output.exit_code, "upload failed");
                self.emit_event(Event::UploadFailed {
                    name,
                    exit_code: receipt.output.exit_code,
                });
                return Ok(ItemOutcome::UploadFailed {
                    exit_code: receipt.output.exit_code,
                    error: None,
                });
            }
        };

        self.ledger
            .record(&ResumeRecord::for_item(item, self.options.scope))
            .await?;

        let partial = receipt.status == UploadStatus::Partial;
        self.emit_event(Event::UploadComplete {
            name: name.clone(),
            nzb: nzb.clone(),
            partial,
        });

        if partial {
            warn!(item = %name, ?nzb, "uploaded with skipped articles");
            Ok(ItemOutcome::UploadedPartial { nzb })
        } else {
            info!(item = %name, ?nzb, "uploaded");
            Ok(ItemOutcome::Uploaded { nzb })
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
