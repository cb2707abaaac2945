//! Raw article drop directory
//!
//! When nyuu cannot post an article it dumps it into the directory named by
//! `dump-failed-posts` in its config. Those articles are resubmitted one by
//! one with [`super::Poster::repost_raw`].

use crate::error::Result;
use crate::utils::{delete_files, natural_sort};
use std::path::{Path, PathBuf};
use tracing::info;

/// Raw articles waiting in `dump_dir`, in natural order
///
/// A drop directory that does not exist yet holds no articles.
pub fn list_raw_articles(dump_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dump_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut articles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .collect();

    natural_sort(&mut articles);
    Ok(articles)
}

/// Delete every raw article in `dump_dir`, returning how many were removed
pub async fn clear_raw_articles(dump_dir: &Path) -> Result<usize> {
    let articles = list_raw_articles(dump_dir)?;
    let deleted = delete_files(&articles).await;
    info!(?dump_dir, deleted, "deleted raw articles");
    Ok(deleted)
}
