//! Pipeline status: the per-stage state machine and the observer trait.
//!
//! A submission run moves through [`PipelineStatus`] strictly in order:
//!
//! ```text
//! Idle → UploadingResume → Converting → UploadingPreview → PreparingRecord
//!      → Analyzing → Extracting → Completed
//! ```
//!
//! Any stage may instead end in `Failed(kind)`, after which nothing else
//! runs. Inject an [`Arc<dyn StatusObserver>`] (or any `&dyn StatusObserver`)
//! into [`crate::analyze::ReviewPipeline::run`] to receive each transition,
//! together with the human-readable status line a UI would show verbatim.
//!
//! # Example
//!
//! ```rust
//! use resume_review::{PipelineStatus, StatusObserver};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StatusLine(Mutex<String>);
//!
//! impl StatusObserver for StatusLine {
//!     fn on_status(&self, _status: &PipelineStatus, message: &str) {
//!         *self.0.lock().unwrap() = message.to_string();
//!     }
//! }
//!
//! let line = StatusLine::default();
//! line.on_status(&PipelineStatus::Analyzing, PipelineStatus::Analyzing.message().as_ref());
//! assert_eq!(*line.0.lock().unwrap(), "Analyzing...");
//! ```

use crate::error::FailureKind;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// One state per pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    UploadingResume,
    Converting,
    UploadingPreview,
    PreparingRecord,
    Analyzing,
    Extracting,
    Completed,
    /// Terminal failure; carries the final message shown to the user.
    Failed { kind: FailureKind, message: String },
}

impl PipelineStatus {
    /// The status line for this state.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            PipelineStatus::Idle => Cow::Borrowed(""),
            PipelineStatus::UploadingResume => Cow::Borrowed("Uploading the file..."),
            PipelineStatus::Converting => Cow::Borrowed("Converting to image..."),
            PipelineStatus::UploadingPreview => Cow::Borrowed("Uploading the image..."),
            PipelineStatus::PreparingRecord => Cow::Borrowed("Preparing data..."),
            PipelineStatus::Analyzing => Cow::Borrowed("Analyzing..."),
            PipelineStatus::Extracting => Cow::Borrowed("Reading the analysis..."),
            PipelineStatus::Completed => Cow::Borrowed("Analysis complete"),
            PipelineStatus::Failed { message, .. } => Cow::Borrowed(message.as_str()),
        }
    }

    /// `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Completed | PipelineStatus::Failed { .. }
        )
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receives every status transition of a pipeline run.
///
/// Implementations must be `Send + Sync` so the same observer can be shared
/// across runs on different tasks. The default implementation does nothing.
pub trait StatusObserver: Send + Sync {
    /// Called on entry to each stage, and once with the terminal state.
    ///
    /// # Arguments
    /// * `status`  — the state just entered
    /// * `message` — the human-readable status line for that state
    fn on_status(&self, status: &PipelineStatus, message: &str) {
        let _ = (status, message);
    }
}

/// An observer for callers that don't display status.
pub struct NoopStatusObserver;

impl StatusObserver for NoopStatusObserver {}

/// Shared observer handle.
pub type StatusCallback = Arc<dyn StatusObserver>;

impl<T: StatusObserver + ?Sized> StatusObserver for Arc<T> {
    fn on_status(&self, status: &PipelineStatus, message: &str) {
        (**self).on_status(status, message)
    }
}
