use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const GLYPH_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Top-left corner of the pause glyph.
pub const PAUSE_GLYPH_ORIGIN: (u32, u32) = (40, 40);
/// Width and height of each pause bar.
pub const PAUSE_BAR_SIZE: (u32, u32) = (20, 60);
/// Horizontal gap between the two bars.
pub const PAUSE_BAR_GAP: u32 = 20;

/// Largest size with the source aspect ratio that fits the screen.
///
/// Fits to height when the screen is relatively wider than the image, else to
/// width. The derived side is truncated, never rounded.
pub fn fit_dimensions(src_w: u32, src_h: u32, screen_w: u32, screen_h: u32) -> (u32, u32) {
    let screen_aspect = f64::from(screen_w.max(1)) / f64::from(screen_h.max(1));
    let img_aspect = f64::from(src_w.max(1)) / f64::from(src_h.max(1));
    let (w, h) = if screen_aspect > img_aspect {
        let h = screen_h;
        ((f64::from(h) * img_aspect) as u32, h)
    } else {
        let w = screen_w;
        (w, (f64::from(w) / img_aspect) as u32)
    };
    (w.max(1), h.max(1))
}

pub fn fit_to_screen(image: &RgbaImage, screen_w: u32, screen_h: u32) -> RgbaImage {
    let (w, h) = fit_dimensions(image.width(), image.height(), screen_w, screen_h);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Triangle)
}

/// Offset that centres `inner` within `outer`; odd remainders go right/bottom.
pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

pub fn blank_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), BLACK)
}

/// Centre `image` on a black canvas of exactly the screen size.
pub fn pad_to_screen(image: &RgbaImage, screen_w: u32, screen_h: u32) -> RgbaImage {
    let mut canvas = blank_canvas(screen_w, screen_h);
    let (ox, oy) = center_offset(image.width(), image.height(), screen_w, screen_h);
    imageops::overlay(&mut canvas, image, i64::from(ox), i64::from(oy));
    canvas
}

/// Fit then pad: the full screen frame for a decoded image.
pub fn letterbox(image: &RgbaImage, screen_w: u32, screen_h: u32) -> RgbaImage {
    pad_to_screen(&fit_to_screen(image, screen_w, screen_h), screen_w, screen_h)
}

/// Draw the two-bar pause indicator in the top-left corner.
pub fn draw_pause_glyph(canvas: &mut RgbaImage) {
    let (x0, y0) = PAUSE_GLYPH_ORIGIN;
    let (bar_w, bar_h) = PAUSE_BAR_SIZE;
    for bar_x in [x0, x0 + bar_w + PAUSE_BAR_GAP] {
        fill_rect(canvas, bar_x, y0, bar_w, bar_h, GLYPH_COLOR);
    }
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = x.saturating_add(w).min(canvas.width());
    let y_end = y.saturating_add(h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Convert RGBA8 to the `0x00RRGGBB` words softbuffer presents.
pub fn pack_xrgb(image: &RgbaImage) -> Vec<u32> {
    image
        .as_raw()
        .chunks_exact(4)
        .map(|chunk| {
            let r = u32::from(chunk[0]);
            let g = u32::from(chunk[1]);
            let b = u32::from(chunk[2]);
            (r << 16) | (g << 8) | b
        })
        .collect()
}

/// Copy a packed frame into a surface buffer of possibly different size.
///
/// Rows/columns outside the frame are cleared to black; excess frame pixels
/// are clipped.
pub fn blit(frame: &[u32], frame_w: u32, dst: &mut [u32], dst_w: u32) {
    let frame_w = frame_w.max(1) as usize;
    let dst_w = dst_w.max(1) as usize;
    let copy_w = frame_w.min(dst_w);
    for (y, row) in dst.chunks_mut(dst_w).enumerate() {
        let start = y * frame_w;
        match frame.get(start..start + copy_w) {
            Some(src) => {
                row[..copy_w].copy_from_slice(src);
                row[copy_w..].fill(0);
            }
            None => row.fill(0),
        }
    }
}
