pub mod caption;
pub mod layout;
pub mod text;

use std::path::Path;

use image::RgbaImage;

use crate::error::Error;
use caption::CaptionStyle;

/// Decode `path` and attach its caption, ready to be letterboxed.
///
/// # Errors
/// Returns [`Error::Decode`] when the file cannot be read as an image.
pub fn load_composed(path: &Path, captions: Option<&CaptionStyle>) -> Result<RgbaImage, Error> {
    let image = image::open(path)
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Ok(match captions {
        Some(style) => caption::apply(path, image, style),
        None => image,
    })
}
