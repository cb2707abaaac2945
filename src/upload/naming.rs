//! Receipt names and locations

use super::RECEIPT_EXTENSION;
use crate::types::Scope;
use std::path::{Path, PathBuf};

/// Replace characters the posting tool's argument parser mangles
pub fn sanitize(name: &str) -> String {
    name.replace('`', "'")
}

/// File name of the receipt for the item at `item_path`
///
/// `<basename>.nzb`, sanitized. With `bundle_naming` and a directory item,
/// the name of the item's parent directory is prefixed with an underscore,
/// so `Title A/DISC_01` becomes `Title A_DISC_01.nzb`.
pub fn receipt_name(item_path: &Path, is_dir: bool, bundle_naming: bool) -> String {
    let basename = item_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let receipt = format!("{basename}.{RECEIPT_EXTENSION}");

    let parent = item_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    match parent {
        Some(parent) if bundle_naming && is_dir => sanitize(&format!("{parent}_{receipt}")),
        _ => sanitize(&receipt),
    }
}

/// Where a receipt ends up
///
/// `<output_root>/<scope>/<source root name>/<item dir relative to source root>/<receipt>`.
/// An item outside `source_root` lands directly in the source root's folder.
pub fn receipt_destination(
    output_root: &Path,
    scope: Scope,
    source_root: &Path,
    item_path: &Path,
    receipt: &str,
) -> PathBuf {
    let root_name = source_root.file_name().unwrap_or_default();
    let subdir = item_path
        .parent()
        .and_then(|parent| parent.strip_prefix(source_root).ok())
        .unwrap_or(Path::new(""));

    output_root
        .join(scope.as_str())
        .join(root_name)
        .join(subdir)
        .join(receipt)
}
