//! # usenet-ul
//!
//! Resumable Usenet upload orchestration on top of ParPar and Nyuu.
//!
//! A run takes a file or directory, works out which items to upload (files by
//! extension or glob, or whole Blu-ray/DVD disc folders), skips anything the
//! resume ledger already lists, and for each remaining item generates PAR2
//! recovery data, posts the item and its parity files, files the resulting
//! NZB under the output tree and records the item as uploaded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//! use usenet_ul::config::read_raw_dump_dir;
//! use usenet_ul::discovery::Selection;
//! use usenet_ul::parity::ParParGenerator;
//! use usenet_ul::pipeline::{PipelineOptions, RunMode};
//! use usenet_ul::upload::NyuuPoster;
//! use usenet_ul::{Config, ResumeLedger, Scope, UploadPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.yaml"))?;
//!     config.validate()?;
//!
//!     let root = Path::new("/data/show").to_path_buf();
//!     let scope = Scope::Private;
//!     let posting = config.posting_config(scope).to_path_buf();
//!
//!     let generator = ParParGenerator::new(config.tools.parpar_path()?, config.tools.parpar_args.clone())
//!         .with_work_dir(config.work_dir().map(Path::to_path_buf));
//!     let poster = NyuuPoster::new(
//!         config.tools.nyuu_path()?,
//!         posting.clone(),
//!         root.clone(),
//!         config.output.nzb_output_path.clone(),
//!         scope,
//!     );
//!
//!     let options = PipelineOptions {
//!         root,
//!         selection: Selection::Extensions(config.discovery.extensions.clone()),
//!         scope,
//!         mode: RunMode::Full,
//!         related_extensions: config.discovery.related_extensions.clone(),
//!         raw_dump_dir: read_raw_dump_dir(&posting)?,
//!     };
//!
//!     let (event_tx, _) = broadcast::channel(1000);
//!     let pipeline = UploadPipeline::new(
//!         event_tx,
//!         options,
//!         Arc::new(generator),
//!         Arc::new(poster),
//!         ResumeLedger::new(config.resume_file()),
//!     );
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = pipeline.run().await?;
//!     std::process::exit(report.exit_code());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

use tokio_util::sync::CancellationToken;

/// Configuration types
pub mod config;
/// Input discovery and classification
pub mod discovery;
/// Error types
pub mod error;
/// PAR2 parity generation
pub mod parity;
/// Upload pipeline
pub mod pipeline;
/// Resume ledger
pub mod resume;
/// Core types and events
pub mod types;
/// Posting and receipt handling
pub mod upload;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{CollisionAction, Config};
pub use discovery::Selection;
pub use error::{Error, Result};
pub use parity::{ParParGenerator, ParityArtifactSet, ParityGenerator};
pub use pipeline::{PipelineOptions, RunMode, RunReport, RunStatus, UploadPipeline};
pub use resume::{ResumeLedger, ResumeRecord};
pub use types::{Event, ItemKind, NamingMode, ProcessOutput, Scope, WorkItem};
pub use upload::{NyuuPoster, Poster, UploadReceipt, UploadStatus};

/// Cancel `token` on the first termination signal
///
/// The pipeline checks the token between items, so the upload in flight
/// finishes and is recorded before the run stops. On unix both SIGTERM and
/// SIGINT count; elsewhere only Ctrl+C does. Returns without cancelling if
/// the token is cancelled by someone else first.
///
/// # Example
///
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use usenet_ul::cancel_on_signal;
///
/// #[tokio::main]
/// async fn main() {
///     let token = CancellationToken::new();
///     tokio::spawn(cancel_on_signal(token.clone()));
///     // hand `token` to UploadPipeline::with_cancellation
/// }
/// ```
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        signal = termination() => {
            tracing::warn!(signal, "finishing the current item, then stopping");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Name of the first termination signal to arrive
#[cfg(unix)]
async fn termination() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted sandboxes; Ctrl+C still works then
    let mut sigterm = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::warn!(error = %e, "cannot listen for SIGTERM"))
        .ok();
    let terminated = async {
        match sigterm.as_mut() {
            Some(listener) => {
                listener.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = interrupted() => "SIGINT",
        _ = terminated => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn termination() -> &'static str {
    interrupted().await;
    "Ctrl+C"
}

/// Resolves on Ctrl+C; never resolves if the listener cannot be installed
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
