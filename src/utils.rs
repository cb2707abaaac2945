//! Utility functions for file operations, path ordering, collision handling
//! and running external tools

use crate::config::CollisionAction;
use crate::error::{Error, Result};
use crate::types::ProcessOutput;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Compare two strings the way a human would order them
///
/// Runs of ASCII digits are compared by numeric value, everything else
/// character by character, so `ep2.mkv` sorts before `ep10.mkv`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let ord = compare_digit_runs(&l_run, &r_run);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.cmp(&r);
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        // "01" and "1" are numerically equal; keep the order deterministic
        .then_with(|| a.len().cmp(&b.len()))
}

/// Sort paths in natural order and drop duplicates
pub fn natural_sort(paths: &mut Vec<PathBuf>) {
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    paths.dedup();
}

/// Case-insensitive extension check, tolerant of a leading dot in `ext`
///
/// Compares against the end of the file name, so multi-part extensions such
/// as `tar.gz` match too. A name that is nothing but the extension does not.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    let wanted = ext.trim().trim_start_matches('.');
    if wanted.is_empty() {
        return false;
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let suffix = format!(".{wanted}");
    name.len() > suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(&suffix))
}

/// Delete files, ignoring ones that are already gone
///
/// Failures are logged and otherwise ignored. Returns how many files were
/// actually removed.
pub async fn delete_files(files: &[PathBuf]) -> usize {
    let mut deleted = 0;
    for file in files {
        match tokio::fs::remove_file(file).await {
            Ok(()) => {
                debug!(?file, "deleted file");
                deleted += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(?file, error = %e, "failed to delete file");
            }
        }
    }
    deleted
}

/// Remove the parent directories of `files` that are now empty
///
/// Used to tidy per-item scratch directories once their archives are gone.
pub async fn remove_empty_parents(files: &[PathBuf]) {
    for parent in files.iter().filter_map(|f| f.parent()) {
        // Only succeeds when the directory is empty
        if tokio::fs::remove_dir(parent).await.is_ok() {
            debug!(?parent, "removed empty directory");
        }
    }
}

/// Move a file, falling back to copy + delete across filesystems
pub async fn move_file(source: &Path, destination: &Path) -> Result<()> {
    use tokio::fs;

    if fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }

    let fail = |e: std::io::Error| Error::MoveFailed {
        source_path: source.to_path_buf(),
        dest_path: destination.to_path_buf(),
        reason: e.to_string(),
    };

    fs::copy(source, destination).await.map_err(fail)?;
    fs::remove_file(source).await.map_err(fail)?;
    Ok(())
}

/// Run an external tool to completion
///
/// With `capture` set, stdout and stderr are collected into the returned
/// [`ProcessOutput`]; otherwise they are inherited so the tool writes straight
/// to the console. A non-zero exit is not an error.
///
/// # Errors
///
/// Returns [`Error::ExternalTool`] if the process cannot be started.
pub async fn run_command(
    program: &Path,
    args: &[OsString],
    cwd: Option<&Path>,
    capture: bool,
) -> Result<ProcessOutput> {
    let rendered: Vec<String> = std::iter::once(program.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    debug!(command = %rendered.join(" "), ?cwd, "running external tool");

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let spawn_error = |e: std::io::Error| {
        Error::ExternalTool(format!("Failed to execute {}: {}", program.display(), e))
    };

    if capture {
        let output = command.output().await.map_err(spawn_error)?;
        Ok(ProcessOutput {
            args: rendered,
            exit_code: output.status.code(),
            stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        })
    } else {
        let status = command.status().await.map_err(spawn_error)?;
        Ok(ProcessOutput {
            args: rendered,
            exit_code: status.code(),
            stdout: None,
            stderr: None,
        })
    }
}

/// Get a usable destination path, handling collisions according to `action`
///
/// # Examples
///
/// ```
/// use usenet_ul::utils::get_unique_path;
/// use usenet_ul::config::CollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/usenet-ul-doc/movie.mkv.nzb");
/// let unique = get_unique_path(path, CollisionAction::Rename).unwrap();
/// // If movie.mkv.nzb exists, returns movie.mkv (1).nzb, then movie.mkv (2).nzb, ...
/// # let _ = unique;
/// ```
pub fn get_unique_path(path: &Path, action: CollisionAction) -> Result<PathBuf> {
    match action {
        CollisionAction::Overwrite => Ok(path.to_path_buf()),
        CollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::invalid_input(path, "cannot extract file stem"))?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path
                .parent()
                .ok_or_else(|| Error::invalid_input(path, "cannot extract parent directory"))?;

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::invalid_input(
                path,
                format!("could not find a free name after {MAX_RENAME_ATTEMPTS} attempts"),
            ))
        }
    }
}
