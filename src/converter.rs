//! Format converter: first page of a resume → PNG preview image.

use crate::config::ReviewConfig;
use crate::error::ConvertError;
use crate::pipeline::{encode, input::BinaryFile, render};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Turns a source document into a single raster preview.
///
/// An `Err` means "no artifact"; the pipeline treats it as a terminal
/// conversion failure for that run.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    async fn convert(&self, document: &BinaryFile) -> Result<BinaryFile, ConvertError>;
}

/// pdfium-backed converter rendering only page 1.
#[derive(Debug, Clone)]
pub struct PdfiumConverter {
    max_pixels: u32,
    lib_path: Option<PathBuf>,
}

impl PdfiumConverter {
    pub fn new(max_pixels: u32, lib_path: Option<PathBuf>) -> Self {
        Self {
            max_pixels: max_pixels.max(100),
            lib_path,
        }
    }

    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.max_preview_pixels, config.pdfium_lib_path.clone())
    }
}

#[async_trait]
impl FormatConverter for PdfiumConverter {
    async fn convert(&self, document: &BinaryFile) -> Result<BinaryFile, ConvertError> {
        let mut pages =
            render::render_leading_pages(document, 1, self.max_pixels, self.lib_path.as_deref())
                .await?;
        let first = pages.pop().ok_or_else(|| ConvertError::EmptyDocument {
            name: document.name.clone(),
        })?;

        let png = encode::encode_png(&first)?;
        let name = format!("{}.png", document.stem());
        debug!("Preview '{}' ready ({} bytes)", name, png.len());
        Ok(BinaryFile::new(name, "image/png", png))
    }
}
