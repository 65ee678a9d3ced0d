//! Folder scanning utilities for discovering image files.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Error;
use crate::events::PhotoInfo;

/// Extensions (lowercase, without dot) the slideshow displays.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Return `true` if `path` has a supported image extension (case-insensitive).
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.iter().any(|e| *e == ext)
        })
}

/// Check that `folder` exists, is a directory and can be listed.
///
/// # Errors
/// Returns [`Error::BadDir`] describing the first problem found.
pub fn ensure_folder(folder: &Path) -> Result<(), Error> {
    if !folder.is_dir() {
        return Err(Error::BadDir(format!(
            "{} is missing or not a directory",
            folder.display()
        )));
    }
    fs::read_dir(folder)
        .map(|_| ())
        .map_err(|err| Error::BadDir(format!("{}: {err}", folder.display())))
}

/// List the images directly inside `folder`, oldest first.
///
/// Unreadable folders and entries are skipped; the result is simply shorter.
pub fn scan_folder(folder: &Path) -> Vec<PhotoInfo> {
    let mut out: Vec<PhotoInfo> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(error = %err, "scan: skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(|e| photo_info(e.path()))
        .collect();
    sort_by_creation(&mut out);
    out
}

pub fn photo_info(path: &Path) -> PhotoInfo {
    PhotoInfo {
        path: path.to_path_buf(),
        created_at: photo_created_at(path),
    }
}

/// Filesystem creation time, falling back to mtime where birth time is unsupported.
pub fn photo_created_at(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Oldest first; equal timestamps fall back to path order so the sort is total.
pub fn sort_by_creation(photos: &mut [PhotoInfo]) {
    photos.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.path.cmp(&b.path))
    });
}
