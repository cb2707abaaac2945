//! Resume ledger
//!
//! An append-only record of every item that has been uploaded, one line per
//! item:
//!
//! ```text
//! "ep1.mkv","500","1","private"
//! ```
//!
//! Fields are name, size in bytes, descendant file count and scope, always
//! quoted, with an embedded `"` written as `""`. Records are never rewritten;
//! the whole file is read on every check and removed only by [`ResumeLedger::clear`].
//!
//! The identity is the basename/size/count/scope tuple, not a content hash:
//! two different items that agree on all four are treated as the same upload.
//!
//! For a directory the count is the number of regular files below it
//! (symlinked files included), not every entry: subdirectories are not
//! counted. Ledgers written by tools that also counted directories will
//! therefore never match a directory record and those bundles are uploaded
//! again. File records are unaffected since their count is always 1.
//!
//! An append that finds the file ending mid-record starts a new line first,
//! so a record cut short by an interrupted write is the only one lost.

use crate::error::{Error, Result};
use crate::types::{Scope, WorkItem};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Number of fields in a ledger line
const FIELD_COUNT: usize = 4;

/// One completed upload
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResumeRecord {
    /// Basename of the uploaded item
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Number of descendant files (1 for a plain file)
    pub count: u64,
    /// Scope the item was uploaded under
    pub scope: Scope,
}

impl ResumeRecord {
    /// The record an upload of `item` under `scope` would write
    pub fn for_item(item: &WorkItem, scope: Scope) -> Self {
        Self {
            name: item.name(),
            size: item.size(),
            count: item.count(),
            scope,
        }
    }

    /// Encode as one ledger line, including the trailing `\r\n`
    pub fn to_line(&self) -> String {
        let fields = [
            self.name.clone(),
            self.size.to_string(),
            self.count.to_string(),
            self.scope.as_str().to_string(),
        ];
        let quoted: Vec<String> = fields
            .iter()
            .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
            .collect();
        format!("{}\r\n", quoted.join(","))
    }

    fn from_fields(fields: &[String]) -> Option<Self> {
        let [name, size, count, scope] = fields else {
            return None;
        };
        Some(Self {
            name: name.clone(),
            size: size.parse().ok()?,
            count: count.parse().ok()?,
            scope: scope.parse().ok()?,
        })
    }
}

/// Split ledger text into rows of fields
///
/// Quoted fields may contain commas, `""` escapes and line breaks. Returns
/// each row with the 1-based line it started on. Blank lines are skipped.
fn parse_rows(text: &str) -> Vec<(usize, Vec<String>)> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                if field_started || !row.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push((row_line, std::mem::take(&mut row)));
                }
                field_started = false;
                line += 1;
                row_line = line;
            }
            other => {
                if other == '\n' {
                    line += 1;
                }
                field.push(other);
                field_started = true;
            }
        }
    }

    if field_started || !row.is_empty() {
        row.push(field);
        rows.push((row_line, row));
    }

    rows
}

/// Durable record of completed uploads
#[derive(Clone, Debug)]
pub struct ResumeLedger {
    path: PathBuf,
    disabled: bool,
}

impl ResumeLedger {
    /// Ledger stored at `path`; the file is created on the first record
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disabled: false,
        }
    }

    /// A ledger that filters nothing and records nothing
    ///
    /// Existing history at `path` is left untouched.
    pub fn disabled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disabled: true,
        }
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether lookups and appends are bypassed
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// All records currently on disk
    ///
    /// A missing file is an empty ledger. Lines that do not decode (e.g. a
    /// record cut short by an interrupted write) are logged and skipped.
    pub async fn load(&self) -> Result<Vec<ResumeRecord>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (line, fields) in parse_rows(&text) {
            match self.decode(line, &fields) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "skipping unreadable resume record"),
            }
        }
        Ok(records)
    }

    fn decode(&self, line: usize, fields: &[String]) -> Result<ResumeRecord> {
        if fields.len() != FIELD_COUNT {
            return Err(Error::MalformedRecord {
                path: self.path.clone(),
                line,
            });
        }
        ResumeRecord::from_fields(fields).ok_or_else(|| Error::MalformedRecord {
            path: self.path.clone(),
            line,
        })
    }

    /// Append `record`
    ///
    /// Does nothing when the ledger is disabled.
    pub async fn record(&self, record: &ResumeRecord) -> Result<()> {
        if self.disabled {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await?;

        // A record cut short by an interrupted write must not swallow this one
        if ends_mid_line(&mut file).await? {
            warn!(path = ?self.path, "resume ledger ends mid-record, starting a new line");
            file.write_all(b"\r\n").await?;
        }
        file.write_all(record.to_line().as_bytes()).await?;
        file.flush().await?;

        debug!(name = %record.name, scope = %record.scope, "recorded upload in resume ledger");
        Ok(())
    }

    /// Whether an identical record exists
    ///
    /// Reads the whole ledger. Always false when disabled.
    pub async fn is_recorded(&self, record: &ResumeRecord) -> Result<bool> {
        if self.disabled {
            return Ok(false);
        }
        Ok(self.load().await?.iter().any(|r| r == record))
    }

    /// Drop the items that already have a record under `scope`
    ///
    /// Order is preserved. Every skipped item is logged.
    pub async fn filter_unrecorded(&self, items: Vec<WorkItem>, scope: Scope) -> Result<Vec<WorkItem>> {
        if self.disabled {
            return Ok(items);
        }

        let known: HashSet<ResumeRecord> = self.load().await?.into_iter().collect();
        let mut pending = Vec::with_capacity(items.len());
        for item in items {
            if known.contains(&ResumeRecord::for_item(&item, scope)) {
                info!(item = %item.name(), "skipping, already uploaded");
            } else {
                pending.push(item);
            }
        }
        Ok(pending)
    }

    /// Delete the ledger file
    ///
    /// A ledger that does not exist yet counts as cleared.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(path = ?self.path, "cleared resume ledger");
        Ok(())
    }
}

/// Whether the last byte of a non-empty `file` is something other than `\n`
async fn ends_mid_line(file: &mut tokio::fs::File) -> Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(std::io::SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}
