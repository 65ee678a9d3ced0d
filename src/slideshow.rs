//! Owns the image queue and playback state and turns ticks into frames.
//!
//! Inventory events arrive over a channel from the files task and are applied
//! here, on the loop's own thread, before every tick.

use std::path::PathBuf;

use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info};

use crate::events::{InventoryEvent, KeyCommand};
use crate::playback::{PlaybackState, Tick};
use crate::queue::{ImageQueue, QueueChange};

/// What the display should render for the current tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Queue empty; clear the screen.
    Blank,
    /// Load, caption and show this image.
    Show(PathBuf),
    /// Nothing changed.
    Hold,
    /// Draw the pause glyph over the last frame, loading `reload` first if set.
    Paused { reload: Option<PathBuf> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Slideshow {
    queue: ImageQueue,
    playback: PlaybackState,
    inventory: Receiver<InventoryEvent>,
    inventory_open: bool,
}

impl Slideshow {
    pub fn new(ticks_per_image: u64, inventory: Receiver<InventoryEvent>) -> Self {
        Self::with_queue(ImageQueue::new(), ticks_per_image, inventory)
    }

    pub fn with_queue(
        queue: ImageQueue,
        ticks_per_image: u64,
        inventory: Receiver<InventoryEvent>,
    ) -> Self {
        Self {
            queue,
            playback: PlaybackState::new(ticks_per_image),
            inventory,
            inventory_open: true,
        }
    }

    pub fn queue(&self) -> &ImageQueue {
        &self.queue
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    /// Path under the cursor, if any.
    pub fn current(&self) -> Option<PathBuf> {
        self.queue
            .get(self.playback.cursor())
            .map(|p| p.to_path_buf())
    }

    pub fn handle_key(&mut self, key: KeyCommand) -> Flow {
        let len = self.queue.len();
        match key {
            KeyCommand::Quit => return Flow::Quit,
            KeyCommand::TogglePause => {
                let paused = self.playback.toggle_pause();
                info!(paused, "playback toggled");
            }
            KeyCommand::Next => self.playback.next(len),
            KeyCommand::Previous => self.playback.previous(len),
        }
        debug!(
            ?key,
            cursor = self.playback.cursor(),
            len,
            "key handled"
        );
        Flow::Continue
    }

    /// Apply one inventory event, keeping the cursor on the displayed image.
    pub fn apply(&mut self, event: InventoryEvent) -> QueueChange {
        let change = self.queue.apply(event);
        let len = self.queue.len();
        match change {
            QueueChange::Inserted(index) => {
                self.playback.on_inserted(index, len);
                debug!(index, len, "queue: inserted");
            }
            QueueChange::Removed(index) => {
                self.playback.on_removed(index, len);
                debug!(index, len, "queue: removed");
            }
            QueueChange::Unchanged => {}
        }
        change
    }

    /// Apply every event that is already waiting. Never blocks.
    pub fn drain_inventory(&mut self) -> usize {
        let mut applied = 0;
        while self.inventory_open {
            match self.inventory.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("inventory channel closed; queue is now static");
                    self.inventory_open = false;
                }
            }
        }
        applied
    }

    /// One loop iteration: sync the queue, advance the clock, pick a frame.
    pub fn step(&mut self) -> Frame {
        self.drain_inventory();
        let tick = self.playback.tick(self.queue.len());
        match tick {
            Tick::Empty => Frame::Blank,
            Tick::Hold => Frame::Hold,
            Tick::Show { index } => match self.queue.get(index) {
                Some(path) => Frame::Show(path.to_path_buf()),
                None => Frame::Blank,
            },
            Tick::Paused { index, reload } => Frame::Paused {
                reload: reload
                    .then(|| self.queue.get(index).map(|p| p.to_path_buf()))
                    .flatten(),
            },
        }
    }
}
