//! Error types for the resume-review library.
//!
//! Two tiers reflect two distinct failure modes:
//!
//! * [`ResumeReviewError`] — **Setup**: the run cannot even start (input file
//!   missing, provider not configured, invalid configuration). Returned as
//!   `Err` from loaders, builders and provider resolution.
//!
//! * [`PipelineFailure`] — **Stage**: one step of a submission run failed.
//!   Every variant is terminal for that run and is also reported to the
//!   status observer as [`crate::status::PipelineStatus::Failed`]. Artifacts
//!   uploaded and records persisted before the failing stage are left in
//!   place.
//!
//! Collaborators (storage, converter, record store, reviewer) each have their
//! own error type so the orchestrator can match on outcomes exhaustively.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before a pipeline run starts.
#[derive(Debug, Error)]
pub enum ResumeReviewError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Resume file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor a valid HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Provider errors ───────────────────────────────────────────────────
    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which of the two uploads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    /// The original resume document.
    Resume,
    /// The rendered preview image.
    Preview,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::Resume => f.write_str("resume"),
            UploadStage::Preview => f.write_str("preview"),
        }
    }
}

/// A terminal stage failure of one submission run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineFailure {
    /// The storage client did not accept an upload.
    #[error("Error: failed to upload the {stage}: {detail}")]
    UploadFailed { stage: UploadStage, detail: String },

    /// The converter produced no preview image.
    #[error("Error: failed to convert the resume to an image: {detail}")]
    ConversionFailed { detail: String },

    /// The record store did not acknowledge a write.
    #[error("Error: failed to save submission '{key}': {detail}")]
    PersistFailed { key: String, detail: String },

    /// The AI reviewer returned no feedback.
    #[error("Error: failed to analyze the resume: {detail}")]
    AnalysisFailed { detail: String },

    /// The reviewer's answer could not be parsed into structured feedback.
    #[error("Error: failed to read the analysis result: {detail}")]
    ExtractionFailed { detail: String },
}

impl PipelineFailure {
    /// The short name of the failure kind, used in logs and JSON output.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineFailure::UploadFailed { stage, .. } => FailureKind::Upload(*stage),
            PipelineFailure::ConversionFailed { .. } => FailureKind::Conversion,
            PipelineFailure::PersistFailed { .. } => FailureKind::Persist,
            PipelineFailure::AnalysisFailed { .. } => FailureKind::Analysis,
            PipelineFailure::ExtractionFailed { .. } => FailureKind::Extraction,
        }
    }
}

/// Detail-free classification of a [`PipelineFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Upload(UploadStage),
    Conversion,
    Persist,
    Analysis,
    Extraction,
}

// ── Collaborator errors ──────────────────────────────────────────────────

/// Errors returned by a [`crate::storage::StorageClient`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to upload an empty file '{name}'")]
    EmptyFile { name: String },

    #[error("invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("storage object not found: '{0}'")]
    NotFound(String),
}

/// Errors returned by a [`crate::converter::FormatConverter`].
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The document is not a PDF (first bytes shown).
    #[error("file '{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt, or the file needs a password.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// The document has no pages to render.
    #[error("PDF '{name}' has no pages")]
    EmptyDocument { name: String },

    /// pdfium-render returned an error for a specific page.
    #[error("rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered bitmap could not be encoded.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or the directory containing it),\n\
or install pdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    #[error("conversion I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversion task failed: {0}")]
    Internal(String),
}

/// Errors returned by a [`crate::store::RecordStore`].
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record store I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record key '{0}'")]
    InvalidKey(String),

    #[error("record serialisation failed: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Errors returned by a [`crate::reviewer::AiReviewer`].
#[derive(Debug, Error)]
pub enum ReviewerError {
    /// The referenced document could not be fetched for review.
    #[error("could not load document '{path}': {source}")]
    Document {
        path: String,
        #[source]
        source: StorageError,
    },

    /// The document could not be rendered into images for the model.
    #[error("could not prepare document for review: {0}")]
    Render(#[from] ConvertError),

    /// The LLM API returned an error.
    #[error("LLM API error: {0}")]
    Api(String),

    /// The call did not finish in time.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model answered with no content at all.
    #[error("LLM returned empty content")]
    EmptyResponse,
}

/// Why a reviewer response could not be turned into structured feedback.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Content was an empty sequence of parts.
    #[error("reviewer response has no content parts")]
    NoContent,

    /// The first content part carries no text.
    #[error("first reviewer content part has no text")]
    MissingText,

    /// The answer parsed to `null` or `""`, which a stored record cannot
    /// tell apart from feedback that has not arrived yet.
    #[error("reviewer response is empty feedback ({0})")]
    EmptyFeedback(&'static str),

    /// The text left after stripping fences is not valid JSON.
    #[error("reviewer response is not valid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}
