use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::processing::caption::DEFAULT_WRAP_WIDTH;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Monitor to render on, in the order the display server enumerates them.
    pub screen_id: usize,
    /// Folder watched (non-recursively) for images.
    pub folder_path: PathBuf,
    /// Time an image stays on screen before the slideshow advances.
    #[serde(with = "humantime_serde")]
    pub display_duration: Duration,
    /// Maximum number of caption lines drawn below an image.
    pub prompt_lines: usize,
    /// Loop ticks per second; also the key/inventory polling rate.
    pub ticks_per_second: u32,
    /// Maximum characters per caption line.
    pub caption_wrap_width: usize,
    /// Caption glyph height in pixels.
    pub caption_font_size: f32,
    /// Preferred caption font family, tried before the built-in fallbacks.
    pub caption_font_family: Option<String>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.folder_path.as_os_str().is_empty(),
            "folder-path must be set"
        );
        ensure!(
            !self.display_duration.is_zero(),
            "display-duration must be greater than zero"
        );
        ensure!(
            (1..=1000).contains(&self.ticks_per_second),
            "ticks-per-second must be between 1 and 1000"
        );
        ensure!(
            self.caption_wrap_width > 0,
            "caption-wrap-width must be greater than zero"
        );
        ensure!(
            self.caption_font_size.is_finite() && self.caption_font_size > 0.0,
            "caption-font-size must be positive"
        );
        Ok(self)
    }

    /// Number of loop ticks an image stays on screen.
    pub fn ticks_per_image(&self) -> u64 {
        let ticks = self.display_duration.as_millis() * u128::from(self.ticks_per_second) / 1000;
        u64::try_from(ticks).unwrap_or(u64::MAX).max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.ticks_per_second.max(1)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            screen_id: 0,
            folder_path: PathBuf::new(),
            display_duration: Duration::from_secs(3),
            prompt_lines: 3,
            ticks_per_second: 20,
            caption_wrap_width: DEFAULT_WRAP_WIDTH,
            caption_font_size: 28.0,
            caption_font_family: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_per_image_multiplies_duration_by_rate() {
        let cfg = Configuration {
            display_duration: Duration::from_secs(3),
            ticks_per_second: 20,
            ..Default::default()
        };
        assert_eq!(cfg.ticks_per_image(), 60);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn sub_tick_duration_still_shows_one_tick() {
        let cfg = Configuration {
            display_duration: Duration::from_millis(10),
            ticks_per_second: 10,
            ..Default::default()
        };
        assert_eq!(cfg.ticks_per_image(), 1);
    }
}
