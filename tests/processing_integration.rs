use folder_slideshow::error::Error;
use folder_slideshow::processing::layout::{self, PAUSE_GLYPH_ORIGIN};
use folder_slideshow::processing::load_composed;
use image::{Rgba, RgbaImage};
use std::fs;
use tempfile::tempdir;

#[test]
fn decoded_image_is_letterboxed_to_screen() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("wide.png");
    RgbaImage::from_pixel(160, 90, Rgba([200, 10, 10, 255]))
        .save(&path)
        .unwrap();

    let decoded = load_composed(&path, None).unwrap();
    assert_eq!(decoded.dimensions(), (160, 90));

    let frame = layout::letterbox(&decoded, 80, 60);
    assert_eq!(frame.dimensions(), (80, 60));
    // 80x45 content centred vertically: 7 rows of bars above, 8 below.
    assert_eq!(frame.get_pixel(40, 0), &Rgba([0, 0, 0, 255]));
    assert_eq!(frame.get_pixel(40, 59), &Rgba([0, 0, 0, 255]));
    assert!(frame.get_pixel(40, 30)[0] > 150);
}

#[test]
fn undecodable_file_reports_decode_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("broken.jpg");
    fs::write(&path, b"definitely not a jpeg").unwrap();

    match load_composed(&path, None) {
        Err(Error::Decode { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn paused_frame_packs_glyph_pixels_white() {
    let mut canvas = layout::blank_canvas(200, 120);
    layout::draw_pause_glyph(&mut canvas);
    let packed = layout::pack_xrgb(&canvas);
    let (x, y) = PAUSE_GLYPH_ORIGIN;
    assert_eq!(packed[(y * 200 + x) as usize], 0x00FF_FFFF);
    assert_eq!(packed[0], 0);
}
