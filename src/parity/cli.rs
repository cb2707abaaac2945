//! CLI-based parity generator using the external parpar binary

use super::PARITY_EXTENSION;
use super::traits::{ParityArtifactSet, ParityGenerator};
use crate::error::{Error, Result};
use crate::types::{NamingMode, WorkItem};
use crate::utils::{has_extension, natural_sort, run_command};
use async_trait::async_trait;
use rand::Rng;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Length of the random scratch directory names
const SCRATCH_NAME_LEN: usize = 10;

/// Attempts at finding an unused scratch directory name
const MAX_SCRATCH_ATTEMPTS: u32 = 16;

/// Parity generator that runs `parpar`
///
/// With a work directory set, every item gets its own freshly created,
/// randomly named scratch directory below it, so items with the same name
/// from different source folders never overwrite each other's archives.
/// Without one, archives are written next to the item.
///
/// # Examples
///
/// ```no_run
/// use usenet_ul::parity::ParParGenerator;
/// use std::path::PathBuf;
///
/// let generator = ParParGenerator::new(PathBuf::from("/usr/bin/parpar"), vec!["-r10%".into()])
///     .with_work_dir(None)
///     .with_capture_output(false);
/// ```
#[derive(Debug, Clone)]
pub struct ParParGenerator {
    binary_path: PathBuf,
    args: Vec<String>,
    work_dir: Option<PathBuf>,
    capture_output: bool,
}

impl ParParGenerator {
    /// Create a generator with an explicit binary path
    ///
    /// `args` are passed ahead of the per-item arguments.
    pub fn new(binary_path: PathBuf, args: Vec<String>) -> Self {
        Self {
            binary_path,
            args,
            work_dir: None,
            capture_output: true,
        }
    }

    /// Attempt to find parpar in PATH
    pub fn from_path(args: Vec<String>) -> Option<Self> {
        which::which("parpar").ok().map(|path| Self::new(path, args))
    }

    /// Parent of the per-item scratch directories, or `None` to work next to the input
    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }

    /// Capture the tool's output (default) or let it write to the console
    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Full argument list for one item, program excluded
    ///
    /// `<args...> --filepath-base <parent> --filepath-format <mode> --out <name> <item> [related...]`
    pub fn build_args(&self, item: &WorkItem, related: &[PathBuf]) -> Vec<OsString> {
        let base = item.path().parent().unwrap_or(Path::new(""));
        let mode = NamingMode::for_kind(item.kind());

        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push("--filepath-base".into());
        args.push(base.as_os_str().to_owned());
        args.push("--filepath-format".into());
        args.push(mode.as_str().into());
        args.push("--out".into());
        args.push(item.name().into());
        args.push(item.path().as_os_str().to_owned());
        args.extend(related.iter().map(|p| p.as_os_str().to_owned()));
        args
    }

    /// Directory the tool runs in and writes its archives to
    async fn execution_dir(&self, item: &WorkItem) -> Result<PathBuf> {
        match &self.work_dir {
            Some(parent) => allocate_scratch_dir(parent).await,
            None => item
                .path()
                .parent()
                .map(PathBuf::from)
                .ok_or_else(|| Error::invalid_input(item.path(), "item has no parent directory")),
        }
    }
}

/// Create a new uniquely named directory below `parent`
///
/// The name is 10 random upper-case hex digits. An existing directory with
/// the same name is never reused.
async fn allocate_scratch_dir(parent: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(parent).await?;

    for _ in 0..MAX_SCRATCH_ATTEMPTS {
        let candidate = parent.join(random_scratch_name());
        match tokio::fs::create_dir(&candidate).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(?candidate, "scratch directory already exists, picking another name");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(Error::Other(format!(
        "could not allocate a scratch directory in {} after {MAX_SCRATCH_ATTEMPTS} attempts",
        parent.display()
    )))
}

fn random_scratch_name() -> String {
    let mut rng = rand::thread_rng();
    (0..SCRATCH_NAME_LEN)
        .map(|_| {
            let digit = rng.gen_range(0..16u32);
            std::char::from_digit(digit, 16)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect()
}

/// Archives in `dir` whose name starts with `name` and ends in `.par2`
fn collect_parity_files(dir: &Path, name: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        warn!(?dir, "cannot read parity output directory");
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(name))
        .map(|entry| entry.path())
        .filter(|path| has_extension(path, PARITY_EXTENSION))
        .collect();

    natural_sort(&mut files);
    files
}

/// Parity archives an earlier run left next to `item`
///
/// Picks up `<name>.par2` and every `<name>.vol*.par2` in the item's
/// directory. Returns an empty list if there are none.
pub fn find_existing_parity(item: &WorkItem) -> Vec<PathBuf> {
    let Some(parent) = item.path().parent() else {
        return Vec::new();
    };
    let name = item.name();
    let index = format!("{name}.{PARITY_EXTENSION}");
    let volume_prefix = format!("{name}.vol");

    collect_parity_files(parent, &name)
        .into_iter()
        .filter(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            file_name == index || file_name.starts_with(&volume_prefix)
        })
        .collect()
}

#[async_trait]
impl ParityGenerator for ParParGenerator {
    async fn generate(&self, item: &WorkItem, related: &[PathBuf]) -> Result<ParityArtifactSet> {
        let naming_mode = NamingMode::for_kind(item.kind());
        let base_path = item.path().parent().map(PathBuf::from).unwrap_or_default();
        let cwd = self.execution_dir(item).await?;
        let args = self.build_args(item, related);

        let output = run_command(&self.binary_path, &args, Some(&cwd), self.capture_output).await?;

        // Collected regardless of the exit code so failed runs stay inspectable
        let parity_files = collect_parity_files(&cwd, &item.name());
        let success = output.exited_cleanly();

        if success {
            info!(
                item = %item.name(),
                parity_files = parity_files.len(),
                "parity generation complete"
            );
        } else {
            warn!(
                item = %item.name(),
                exit_code = ?output.exit_code,
                parity_files = parity_files.len(),
                "parity generation failed"
            );
        }

        Ok(ParityArtifactSet {
            parity_files,
            naming_mode,
            base_path,
            success,
            output,
        })
    }

    fn name(&self) -> &'static str {
        "parpar"
    }
}
