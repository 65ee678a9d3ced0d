//! Playback cursor and the per-tick auto-advance state machine.

/// What the display should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to show; blank the screen.
    Empty,
    /// Load and show the image at `index`.
    Show { index: usize },
    /// Keep the current frame.
    Hold,
    /// Redraw the last frame with the pause glyph. When `reload` is set the
    /// cursor moved while paused and the image at `index` must be loaded first.
    Paused { index: usize, reload: bool },
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    cursor: usize,
    paused: bool,
    ticks_elapsed: u64,
    manual_override: bool,
    /// The image under the cursor changed since the last paused tick.
    reload_pending: bool,
    ticks_per_image: u64,
}

impl PlaybackState {
    #[must_use]
    pub fn new(ticks_per_image: u64) -> Self {
        Self {
            cursor: 0,
            paused: false,
            ticks_elapsed: 0,
            manual_override: false,
            reload_pending: false,
            ticks_per_image: ticks_per_image.max(1),
        }
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn ticks_elapsed(&self) -> u64 {
        self.ticks_elapsed
    }

    #[must_use]
    pub const fn manual_override(&self) -> bool {
        self.manual_override
    }

    #[must_use]
    pub const fn ticks_per_image(&self) -> u64 {
        self.ticks_per_image
    }

    /// Flip between playing and paused. Returns the new paused flag.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.ticks_elapsed = 0;
        self.paused
    }

    /// Move the cursor by `delta` positions, wrapping around `len`.
    pub fn navigate(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let len = len as isize;
        let cursor = (self.cursor as isize).rem_euclid(len);
        self.cursor = (cursor + delta.rem_euclid(len)).rem_euclid(len) as usize;
        self.ticks_elapsed = 0;
        self.manual_override = true;
        self.reload_pending = true;
    }

    pub fn next(&mut self, len: usize) {
        self.navigate(1, len);
    }

    pub fn previous(&mut self, len: usize) {
        self.navigate(-1, len);
    }

    /// Advance the clock by one tick against a queue of `len` images.
    pub fn tick(&mut self, len: usize) -> Tick {
        if len == 0 {
            self.cursor = 0;
            self.ticks_elapsed = 0;
            self.manual_override = false;
            self.reload_pending = false;
            return Tick::Empty;
        }
        if self.cursor >= len {
            self.cursor %= len;
        }

        if self.paused {
            let reload = std::mem::take(&mut self.reload_pending);
            return Tick::Paused {
                index: self.cursor,
                reload,
            };
        }

        let index = self.cursor;
        let show = self.ticks_elapsed == 0;
        self.reload_pending = false;

        self.ticks_elapsed += 1;
        if self.ticks_elapsed >= self.ticks_per_image {
            self.ticks_elapsed = 0;
            // A navigation this cycle replaces the scheduled advance.
            if !std::mem::take(&mut self.manual_override) {
                self.cursor = (self.cursor + 1) % len;
            }
        }

        if show { Tick::Show { index } } else { Tick::Hold }
    }

    /// Keep the cursor on the same image after an insertion at `index`.
    pub fn on_inserted(&mut self, index: usize, len: usize) {
        if len <= 1 {
            self.cursor = 0;
            self.ticks_elapsed = 0;
            self.reload_pending = true;
            return;
        }
        if index <= self.cursor {
            self.cursor += 1;
        }
        self.clamp(len);
    }

    /// Re-establish `cursor < len` after the image at `index` was removed.
    ///
    /// Removing an earlier image keeps the current one on screen; removing the
    /// current image makes its successor current and restarts its period.
    pub fn on_removed(&mut self, index: usize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            self.ticks_elapsed = 0;
            return;
        }
        if index < self.cursor {
            self.cursor -= 1;
        } else if index == self.cursor {
            self.ticks_elapsed = 0;
            self.reload_pending = true;
            if self.cursor >= len {
                self.cursor = 0;
            }
        }
        self.clamp(len);
    }

    fn clamp(&mut self, len: usize) {
        if len > 0 && self.cursor >= len {
            self.cursor = len - 1;
        }
    }
}
