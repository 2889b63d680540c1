//! # resume-review
//!
//! Submit a resume against a job description and get structured ATS
//! feedback from a vision language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resume (PDF)
//!  │
//!  ├─ 1. Upload   store the original via the StorageClient
//!  ├─ 2. Convert  render page 1 to a PNG preview (pdfium, spawn_blocking)
//!  ├─ 3. Upload   store the preview
//!  ├─ 4. Record   persist `resume:<id>` with feedback still pending
//!  ├─ 5. Analyze  vision LLM reviews the stored resume against the job
//!  ├─ 6. Extract  strip ```json fences, parse the answer as JSON
//!  └─ 7. Record   persist `resume:<id>` again with the parsed feedback
//! ```
//!
//! Each stage is reported to a [`StatusObserver`]. The first failing stage
//! ends the run; earlier uploads and the pending record are kept.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_review::{
//!     analyze_resume, FileRecordStore, JobContext, LocalStorage, NoopStatusObserver,
//!     ReviewConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReviewConfig::default();
//!     let job = JobContext {
//!         company_name: "Acme".into(),
//!         job_title: "Engineer".into(),
//!         job_description: "Build things".into(),
//!     };
//!     let record = analyze_resume(
//!         "resume.pdf",
//!         job,
//!         &config,
//!         Arc::new(LocalStorage::new("data/files")),
//!         Arc::new(FileRecordStore::new("data/records")),
//!         &NoopStatusObserver,
//!     )
//!     .await??;
//!     println!("{}", record.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-review` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod converter;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod record;
pub mod reviewer;
pub mod status;
pub mod storage;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_resume, ReviewPipeline, SubmissionInput};
pub use config::{ReviewConfig, ReviewConfigBuilder};
pub use converter::{FormatConverter, PdfiumConverter};
pub use error::{
    ConvertError, ExtractionError, FailureKind, PipelineFailure, RecordStoreError,
    ResumeReviewError, ReviewerError, StorageError, UploadStage,
};
pub use pipeline::extract::{extract_feedback, strip_json_fences};
pub use pipeline::input::{load_resume, BinaryFile};
pub use pipeline::llm::LlmReviewer;
pub use record::{FeedbackState, JobContext, SubmissionId, SubmissionRecord};
pub use reviewer::{AiReviewer, ContentPart, MessageContent, ReviewerResponse};
pub use status::{NoopStatusObserver, PipelineStatus, StatusCallback, StatusObserver};
pub use storage::{LocalStorage, StorageClient, UploadedFile};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore};
