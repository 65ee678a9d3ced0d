use std::fs;

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use fontdb::{Database, Family, Query, Source};
use image::RgbaImage;
use tracing::debug;

const FALLBACK_FAMILIES: &[&str] = &["DejaVu Sans", "Noto Sans", "Liberation Sans", "Arial"];

/// Locate a system font, trying `preferred` first, then common sans faces,
/// then anything the font database knows about.
pub fn load_font(preferred: Option<&str>) -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let mut families: Vec<Family<'_>> = preferred.into_iter().map(Family::Name).collect();
    families.extend(FALLBACK_FAMILIES.iter().copied().map(Family::Name));
    families.push(Family::SansSerif);

    for family in families {
        if let Some(id) = db.query(&Query {
            families: &[family],
            ..Default::default()
        }) && let Some(font) = load_face(&db, id)?
        {
            debug!(family = ?family, "caption font resolved");
            return Ok(font);
        }
    }

    for face in db.faces() {
        if let Some(font) = load_face(&db, face.id)? {
            return Ok(font);
        }
    }

    Err(anyhow!("no usable system font found"))
}

fn load_face(db: &Database, id: fontdb::ID) -> Result<Option<FontArc>> {
    let face = db.face(id).context("missing font face in database")?;
    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => fs::read(path)
            .with_context(|| format!("failed to read font at {}", path.display()))?,
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    // Collections (.ttc) carry several faces; a face that fails to parse is skipped.
    Ok(FontVec::try_from_vec_and_index(data, face.index)
        .ok()
        .map(FontArc::new))
}

#[derive(Debug, Clone, Copy)]
pub struct LineMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl LineMetrics {
    /// Vertical space a single line occupies, without extra padding.
    pub fn height(&self) -> u32 {
        (self.ascent - self.descent + self.line_gap).ceil().max(1.0) as u32
    }
}

pub fn line_metrics(font: &FontArc, scale: PxScale) -> LineMetrics {
    let scaled = font.as_scaled(scale);
    LineMetrics {
        ascent: scaled.ascent(),
        descent: scaled.descent(),
        line_gap: scaled.line_gap(),
    }
}

/// Draw `text` with its baseline at `baseline_y`, alpha-blending into `image`.
pub fn draw_text(
    image: &mut RgbaImage,
    font: &FontArc,
    scale: PxScale,
    x: i32,
    baseline_y: i32,
    color: [u8; 4],
    text: &str,
) {
    let (width, height) = image.dimensions();
    let mut caret = point(x as f32, baseline_y as f32);
    let scaled_font = font.as_scaled(scale);
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = previous {
            caret.x += scaled_font.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, caret);
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let origin_x = bounds.min.x.floor() as i32;
            let origin_y = bounds.min.y.floor() as i32;
            outlined.draw(|gx, gy, v| {
                let px = origin_x + gx as i32;
                let py = origin_y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let alpha = u16::from((v.clamp(0.0, 1.0) * 255.0).round() as u8);
                let inv = 255 - alpha;
                let dst = image.get_pixel_mut(px as u32, py as u32);
                for c in 0..3 {
                    dst[c] = ((u16::from(dst[c]) * inv + u16::from(color[c]) * alpha) / 255) as u8;
                }
                dst[3] = 255;
            });
        }
        caret.x += scaled_font.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
}
