//! Ordered, deduplicated list of the images currently in the folder.

use std::path::Path;

use crate::events::{InventoryEvent, PhotoInfo};
use crate::scan::{is_supported_image, sort_by_creation};

/// Result of applying an inventory event to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueChange {
    /// The photo now sits at this index.
    Inserted(usize),
    /// The photo previously at this index is gone.
    Removed(usize),
    Unchanged,
}

/// Image paths sorted by ascending creation time, each path at most once.
#[derive(Debug, Clone, Default)]
pub struct ImageQueue {
    entries: Vec<PhotoInfo>,
}

impl ImageQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a queue from scan results, dropping duplicates and non-images.
    pub fn from_photos(photos: impl IntoIterator<Item = PhotoInfo>) -> Self {
        let mut queue = Self::new();
        for info in photos {
            if is_supported_image(&info.path) && !queue.contains(&info.path) {
                queue.entries.push(info);
            }
        }
        sort_by_creation(&mut queue.entries);
        queue
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(|e| e.path.as_path())
    }

    #[must_use]
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e.path == path)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.position(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    /// Insert a newly created image and re-sort.
    ///
    /// Returns the index the photo ended up at, or `None` when the path is
    /// already queued or is not a supported image.
    pub fn insert(&mut self, info: PhotoInfo) -> Option<usize> {
        if !is_supported_image(&info.path) || self.contains(&info.path) {
            return None;
        }
        let path = info.path.clone();
        self.entries.push(info);
        sort_by_creation(&mut self.entries);
        self.position(&path)
    }

    /// Remove a deleted image. Returns the index it occupied.
    pub fn remove(&mut self, path: &Path) -> Option<usize> {
        let index = self.position(path)?;
        // Vec::remove keeps the remaining entries sorted.
        self.entries.remove(index);
        Some(index)
    }

    pub fn apply(&mut self, event: InventoryEvent) -> QueueChange {
        match event {
            InventoryEvent::PhotoAdded(info) => self
                .insert(info)
                .map_or(QueueChange::Unchanged, QueueChange::Inserted),
            InventoryEvent::PhotoRemoved(path) => self
                .remove(&path)
                .map_or(QueueChange::Unchanged, QueueChange::Removed),
        }
    }
}
