//! Sidecar captions: `photo.jpg` + `photo.txt` renders the text under the photo.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage, imageops};
use tracing::{debug, warn};

use super::text::{LineMetrics, draw_text, line_metrics};
use crate::error::Error;

/// Characters per caption line unless configured otherwise.
pub const DEFAULT_WRAP_WIDTH: usize = 63;
/// Space above every line and below the last one.
pub const LINE_PADDING: u32 = 10;
/// Left inset of caption text.
pub const TEXT_MARGIN: u32 = 10;

const CAPTION_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const CAPTION_COLOR: [u8; 4] = [255, 255, 255, 255];

#[derive(Clone)]
pub struct CaptionStyle {
    font: FontArc,
    scale: PxScale,
    wrap_width: usize,
    max_lines: usize,
}

impl CaptionStyle {
    pub fn new(font: FontArc, size_px: f32, wrap_width: usize, max_lines: usize) -> Self {
        Self {
            font,
            scale: PxScale::from(size_px),
            wrap_width: wrap_width.max(1),
            max_lines,
        }
    }

    pub fn metrics(&self) -> LineMetrics {
        line_metrics(&self.font, self.scale)
    }

    /// Height added below the image for `lines` caption lines.
    pub fn block_height(&self, lines: usize) -> u32 {
        if lines == 0 {
            return 0;
        }
        let per_line = self.metrics().height() + LINE_PADDING;
        per_line * lines as u32 + LINE_PADDING
    }

    /// Wrap `text` using this style's width and line cap.
    pub fn wrap(&self, text: &str) -> Vec<String> {
        wrap_words(text, self.wrap_width, self.max_lines)
    }
}

/// Sidecar files checked for `image_path`, in order.
pub fn sidecar_candidates(image_path: &Path) -> [PathBuf; 2] {
    let mut full = image_path.as_os_str().to_owned();
    full.push(".txt");
    [image_path.with_extension("txt"), PathBuf::from(full)]
}

/// Read the caption for `image_path`, if a sidecar exists.
///
/// # Errors
/// Returns [`Error::Io`] when a sidecar exists but cannot be read.
pub fn load_caption(image_path: &Path) -> Result<Option<String>, Error> {
    for candidate in sidecar_candidates(image_path) {
        match fs::read_to_string(&candidate) {
            Ok(text) => {
                debug!(path = %candidate.display(), "caption loaded");
                return Ok(Some(text));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(None)
}

/// Greedy word wrap into at most `max_lines` lines of `width` characters.
///
/// Words that no longer fit once the line cap is reached are dropped. A word
/// longer than `width` is broken into `width`-sized pieces.
pub fn wrap_words(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    if max_lines == 0 {
        return lines;
    }
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width) {
            if current.is_empty() {
                current.extend(piece);
                current_len = piece.len();
            } else if current_len + 1 + piece.len() <= width {
                current.push(' ');
                current.extend(piece);
                current_len += 1 + piece.len();
            } else {
                lines.push(std::mem::take(&mut current));
                if lines.len() == max_lines {
                    return lines;
                }
                current.extend(piece);
                current_len = piece.len();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Grow the canvas downward and draw `lines` left-aligned below the image.
pub fn compose(image: &RgbaImage, lines: &[String], style: &CaptionStyle) -> RgbaImage {
    if lines.is_empty() {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    let block = style.block_height(lines.len());
    let mut canvas = RgbaImage::from_pixel(width, height + block, CAPTION_BACKGROUND);
    imageops::replace(&mut canvas, image, 0, 0);

    let metrics = style.metrics();
    let line_height = metrics.height() + LINE_PADDING;
    let mut top = height + LINE_PADDING;
    for line in lines {
        let baseline = top as f32 + metrics.ascent;
        draw_text(
            &mut canvas,
            &style.font,
            style.scale,
            TEXT_MARGIN as i32,
            baseline.round() as i32,
            CAPTION_COLOR,
            line,
        );
        top += line_height;
    }
    canvas
}

/// Caption `image` from its sidecar file; unreadable sidecars leave it unchanged.
pub fn apply(image_path: &Path, image: RgbaImage, style: &CaptionStyle) -> RgbaImage {
    match load_caption(image_path) {
        Ok(Some(text)) => {
            let lines = style.wrap(&text);
            compose(&image, &lines, style)
        }
        Ok(None) => image,
        Err(err) => {
            warn!(path = %image_path.display(), error = %err, "caption unreadable; showing image without it");
            image
        }
    }
}
