//! CLI-based poster using the external nyuu binary

use super::naming::{receipt_destination, receipt_name};
use super::traits::{Poster, RawOutput, UploadReceipt, UploadStatus};
use crate::config::CollisionAction;
use crate::error::{Error, Result};
use crate::types::{Scope, WorkItem};
use crate::utils::{delete_files, get_unique_path, move_file, remove_empty_parents, run_command};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Poster that runs `nyuu`
///
/// Receipts are written into the work directory (or next to the item) and
/// then moved to `<output_dir>/<scope>/<source root name>/<subdir>/`.
#[derive(Debug, Clone)]
pub struct NyuuPoster {
    binary_path: PathBuf,
    config_path: PathBuf,
    source_root: PathBuf,
    output_dir: PathBuf,
    scope: Scope,
    work_dir: Option<PathBuf>,
    bundle_naming: bool,
    collision: CollisionAction,
    capture_output: bool,
}

impl NyuuPoster {
    /// Create a poster
    ///
    /// # Arguments
    ///
    /// * `binary_path` - Path to the nyuu binary
    /// * `config_path` - nyuu JSON config for the active scope
    /// * `source_root` - Directory the batch was discovered under; receipt
    ///   subdirectories mirror the item's location relative to it
    /// * `output_dir` - Root of the receipt output tree
    /// * `scope` - Output subtree
    pub fn new(
        binary_path: PathBuf,
        config_path: PathBuf,
        source_root: PathBuf,
        output_dir: PathBuf,
        scope: Scope,
    ) -> Self {
        Self {
            binary_path,
            config_path,
            source_root,
            output_dir,
            scope,
            work_dir: None,
            bundle_naming: false,
            collision: CollisionAction::default(),
            capture_output: true,
        }
    }

    /// Directory nyuu runs in, or `None` to run next to each item
    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }

    /// Prefix directory receipts with their parent directory name
    pub fn with_bundle_naming(mut self, enabled: bool) -> Self {
        self.bundle_naming = enabled;
        self
    }

    /// What to do when a receipt already exists at its destination
    pub fn with_collision(mut self, collision: CollisionAction) -> Self {
        self.collision = collision;
        self
    }

    /// Capture the tool's output (default) or let it write to the console
    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Receipt file name for `item`
    pub fn receipt_name(&self, item: &WorkItem) -> String {
        receipt_name(item.path(), !item.is_file(), self.bundle_naming)
    }

    /// Final receipt location for `item`, before collision handling
    pub fn receipt_destination(&self, item: &WorkItem) -> PathBuf {
        receipt_destination(
            &self.output_dir,
            self.scope,
            &self.source_root,
            item.path(),
            &self.receipt_name(item),
        )
    }

    /// Upload arguments, program excluded
    ///
    /// `--config <conf> --out <receipt> <item> [related...] [parity...]`
    pub fn build_upload_args(
        &self,
        item: &WorkItem,
        parity_files: &[PathBuf],
        related: &[PathBuf],
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--config".into(),
            self.config_path.as_os_str().to_owned(),
            "--out".into(),
            self.receipt_name(item).into(),
            item.path().as_os_str().to_owned(),
        ];
        args.extend(related.iter().map(|p| p.as_os_str().to_owned()));
        args.extend(parity_files.iter().map(|p| p.as_os_str().to_owned()));
        args
    }

    /// Repost arguments, program excluded
    pub fn build_repost_args(&self, article: &Path) -> Vec<OsString> {
        vec![
            "--config".into(),
            self.config_path.as_os_str().to_owned(),
            "--delete-raw-posts".into(),
            "--input-raw-posts".into(),
            article.as_os_str().to_owned(),
        ]
    }

    async fn execution_dir(&self, item: &WorkItem) -> Result<PathBuf> {
        match &self.work_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                Ok(dir.clone())
            }
            None => item
                .path()
                .parent()
                .map(PathBuf::from)
                .ok_or_else(|| Error::invalid_input(item.path(), "item has no parent directory")),
        }
    }

    /// Move the receipt out of `cwd` into the output tree
    async fn relocate_receipt(&self, item: &WorkItem, cwd: &Path) -> Result<PathBuf> {
        let source = cwd.join(self.receipt_name(item));
        let destination = self.receipt_destination(item);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let destination = get_unique_path(&destination, self.collision)?;

        move_file(&source, &destination).await?;
        debug!(?source, ?destination, "moved receipt");
        Ok(destination)
    }
}

#[async_trait]
impl Poster for NyuuPoster {
    async fn upload(
        &self,
        item: &WorkItem,
        parity_files: &[PathBuf],
        related: &[PathBuf],
    ) -> Result<UploadReceipt> {
        let cwd = self.execution_dir(item).await?;
        let args = self.build_upload_args(item, parity_files, related);

        let output = run_command(&self.binary_path, &args, Some(&cwd), self.capture_output).await?;
        let status = UploadStatus::from_exit_code(output.exit_code);

        if !status.is_success() {
            warn!(item = %item.name(), exit_code = ?output.exit_code, "upload failed");
            return Ok(UploadReceipt {
                nzb: None,
                status,
                output,
            });
        }

        if status == UploadStatus::Partial {
            warn!(
                item = %item.name(),
                "upload completed with skipped article errors"
            );
        }

        let nzb = self.relocate_receipt(item, &cwd).await?;
        let deleted = delete_files(parity_files).await;
        remove_empty_parents(parity_files).await;
        info!(item = %item.name(), nzb = ?nzb, parity_deleted = deleted, "upload complete");

        Ok(UploadReceipt {
            nzb: Some(nzb),
            status,
            output,
        })
    }

    async fn repost_raw(&self, article: &Path) -> Result<RawOutput> {
        let article = std::path::absolute(article)?;
        let args = self.build_repost_args(&article);

        let output = run_command(&self.binary_path, &args, None, self.capture_output).await?;
        let status = UploadStatus::from_exit_code(output.exit_code);

        if status.is_success() {
            info!(?article, "reposted raw article");
        } else {
            warn!(?article, exit_code = ?output.exit_code, "raw article repost failed");
        }

        Ok(RawOutput {
            article,
            status,
            output,
        })
    }

    fn name(&self) -> &'static str {
        "nyuu"
    }
}
