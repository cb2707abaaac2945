//! Posting to Usenet
//!
//! The [`Poster`] trait covers the two jobs of the posting tool: uploading an
//! item with its parity archives, and resubmitting raw articles left behind
//! by an earlier run. [`NyuuPoster`] implements it with the `nyuu` binary.
//!
//! A successful upload ends with the receipt at
//! `<output>/<scope>/<source root name>/<subdir>/<name>.nzb`
//! (see [`receipt_destination`]) and the consumed parity archives deleted.

mod cli;
mod naming;
mod raw;
mod traits;

pub use cli::NyuuPoster;
pub use naming::{receipt_destination, receipt_name, sanitize};
pub use raw::{clear_raw_articles, list_raw_articles};
pub use traits::{Poster, RawOutput, UploadReceipt, UploadStatus};

/// Extension of the receipts written by the posting tool
pub const RECEIPT_EXTENSION: &str = "nzb";

/// nyuu exit code for "finished, but some articles were skipped after errors"
pub const PARTIAL_SUCCESS_EXIT_CODE: i32 = 32;
