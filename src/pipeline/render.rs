//! PDF rasterisation: render leading pages of an in-memory PDF via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so every call goes
//! through `tokio::task::spawn_blocking`. Rendering is capped by the longest
//! edge in pixels rather than DPI, which keeps memory bounded no matter how
//! large the physical page is.

use crate::error::ConvertError;
use crate::pipeline::input::BinaryFile;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a libpdfium file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Render the first `max_pages` pages of `document`, each capped to
/// `max_pixels` on its longest edge.
///
/// # Returns
/// Page images in page order; at least one on success.
pub async fn render_leading_pages(
    document: &BinaryFile,
    max_pages: usize,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<Vec<DynamicImage>, ConvertError> {
    check_pdf_magic(document)?;

    let name = document.name.clone();
    let bytes = document.bytes.clone();
    let lib_path = lib_path.map(Path::to_path_buf);

    tokio::task::spawn_blocking(move || {
        render_blocking(&name, &bytes, max_pages, max_pixels, lib_path.as_deref())
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Reject anything that does not start with `%PDF` before pdfium sees it.
pub fn check_pdf_magic(document: &BinaryFile) -> Result<(), ConvertError> {
    if document.bytes.len() < 4 || &document.bytes[..4] != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            name: document.name.clone(),
            magic: document.bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Bind to libpdfium: explicit path, then `PDFIUM_LIB_PATH`, then system.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let configured: Option<PathBuf> = lib_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
///
/// pdfium opens documents from a file path, so the bytes are spilled to a
/// managed temp file that is removed when this function returns.
fn render_blocking(
    name: &str,
    bytes: &[u8],
    max_pages: usize,
    max_pixels: u32,
    lib_path: Option<&Path>,
) -> Result<Vec<DynamicImage>, ConvertError> {
    let pdfium = bind_pdfium(lib_path)?;

    let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile()?;
    tmp.write_all(bytes)?;
    tmp.flush()?;

    let document = pdfium
        .load_pdf_from_file(tmp.path(), None)
        .map_err(|e| ConvertError::CorruptPdf {
            name: name.to_string(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF '{}' loaded: {} pages", name, total_pages);
    if total_pages == 0 {
        return Err(ConvertError::EmptyDocument {
            name: name.to_string(),
        });
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let count = max_pages.min(total_pages);
    let mut images = Vec::with_capacity(count);

    for idx in 0..count {
        let page = pages
            .get(idx as u16)
            .map_err(|e| ConvertError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ConvertError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}
