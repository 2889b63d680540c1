//! Image encoding: `DynamicImage` → PNG bytes, and PNG → base64 `ImageData`.
//!
//! PNG is lossless, which keeps rendered text crisp both in the preview
//! thumbnail and in the pages the vision model reads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} image → {} PNG bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a rendered page as a base64 PNG attachment for the vision model.
///
/// `detail: "high"` lets GPT-4-class models tile the image at full
/// resolution so small print on the resume stays legible.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let png = encode_png(img)?;
    let b64 = STANDARD.encode(&png);
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
