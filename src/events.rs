use std::path::PathBuf;
use std::time::SystemTime;

/// Folder inventory change, sent from the files task to the slideshow loop.
#[derive(Debug)]
pub enum InventoryEvent {
    PhotoAdded(PhotoInfo),
    PhotoRemoved(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoInfo {
    pub path: PathBuf,
    pub created_at: SystemTime,
}

/// Keyboard commands recognised by the slideshow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    TogglePause,
    Previous,
    Next,
    Quit,
}
