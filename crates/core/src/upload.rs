//! Image upload validation.

use bytes::Bytes;
use image::ImageFormat;

/// Message shown when an upload is not a usable image.
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

const SUPPORTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// An upload that decoded successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    /// Raw file content, unchanged.
    pub data: Bytes,
    /// Detected format.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ValidatedImage {
    /// File extension for the stored copy.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// MIME type for the stored copy.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

/// Check that `data` is a complete image in a supported format.
///
/// The format is sniffed from the content, never from the file name.
pub fn validate_image(data: Bytes) -> Result<ValidatedImage, &'static str> {
    let format = image::guess_format(&data).map_err(|_| INVALID_IMAGE)?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(INVALID_IMAGE);
    }

    let decoded = image::load_from_memory_with_format(&data, format).map_err(|e| {
        tracing::debug!(error = %e, ?format, "Rejected undecodable image");
        INVALID_IMAGE
    })?;

    Ok(ValidatedImage {
        width: decoded.width(),
        height: decoded.height(),
        data,
        format,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let img = image::RgbImage::new(3, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    #[test]
    fn test_valid_png() {
        let image = validate_image(png_bytes()).unwrap();

        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.extension(), "png");
        assert_eq!(image.content_type(), "image/png");
    }

    #[test]
    fn test_text_is_not_an_image() {
        let result = validate_image(Bytes::from_static(b"definitely not an image"));
        assert_eq!(result, Err(INVALID_IMAGE));
    }

    #[test]
    fn test_truncated_png_rejected() {
        let full = png_bytes();
        let truncated = full.slice(..full.len() / 2);

        assert_eq!(validate_image(truncated), Err(INVALID_IMAGE));
    }
}
