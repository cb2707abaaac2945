//! Parity archive generation
//!
//! Recovery data for every upload is produced by an external PAR2 tool. The
//! [`ParityGenerator`] trait is the seam the pipeline talks to:
//!
//! - [`ParParGenerator`]: runs the `parpar` binary, one invocation per item
//! - [`find_existing_parity`]: picks up archives generated by an earlier run,
//!   used when only the upload step is requested
//!
//! ## Usage
//!
//! ```no_run
//! use usenet_ul::parity::{ParParGenerator, ParityGenerator};
//! use usenet_ul::types::WorkItem;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let generator = ParParGenerator::from_path(vec!["-r10%".into()])
//!         .ok_or("parpar not found")?
//!         .with_work_dir(Some(PathBuf::from("/tmp/.usenet-ul")));
//!
//!     let item = WorkItem::from_path("/data/show/ep1.mkv")?;
//!     let parity = generator.generate(&item, &[]).await?;
//!     if parity.success {
//!         println!("{} parity files", parity.parity_files.len());
//!     }
//!     Ok(())
//! }
//! ```

mod cli;
mod traits;

pub use cli::{ParParGenerator, find_existing_parity};
pub use traits::{ParityArtifactSet, ParityGenerator};

/// Extension of the archives written by the parity tool
pub const PARITY_EXTENSION: &str = "par2";
