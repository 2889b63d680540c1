//! The submission pipeline: upload → preview → record → review → feedback.
//!
//! [`ReviewPipeline::run`] drives one resume through every stage in order,
//! reporting each transition to a [`StatusObserver`]. Each stage starts only
//! after the previous one has succeeded. The first failure is reported as
//! [`PipelineStatus::Failed`] and returned as a [`PipelineFailure`]; nothing
//! after it runs and nothing before it is undone. The pending record written
//! before analysis therefore remains as the durable trace of a failed run.

use crate::config::ReviewConfig;
use crate::converter::{FormatConverter, PdfiumConverter};
use crate::error::{PipelineFailure, ResumeReviewError, UploadStage};
use crate::pipeline::extract;
use crate::pipeline::input::{self, BinaryFile};
use crate::pipeline::llm::LlmReviewer;
use crate::prompts::prepare_instructions;
use crate::record::{JobContext, SubmissionId, SubmissionRecord};
use crate::reviewer::AiReviewer;
use crate::status::{PipelineStatus, StatusObserver};
use crate::storage::StorageClient;
use crate::store::{self, RecordStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the caller submits: the job context plus exactly one resume file.
#[derive(Debug, Clone)]
pub struct SubmissionInput {
    pub job: JobContext,
    pub file: BinaryFile,
}

impl SubmissionInput {
    pub fn new(
        company_name: impl Into<String>,
        job_title: impl Into<String>,
        job_description: impl Into<String>,
        file: BinaryFile,
    ) -> Self {
        Self {
            job: JobContext {
                company_name: company_name.into(),
                job_title: job_title.into(),
                job_description: job_description.into(),
            },
            file,
        }
    }
}

/// The orchestrator and its four collaborators.
#[derive(Clone)]
pub struct ReviewPipeline {
    storage: Arc<dyn StorageClient>,
    converter: Arc<dyn FormatConverter>,
    records: Arc<dyn RecordStore>,
    reviewer: Arc<dyn AiReviewer>,
}

impl ReviewPipeline {
    pub fn new(
        storage: Arc<dyn StorageClient>,
        converter: Arc<dyn FormatConverter>,
        records: Arc<dyn RecordStore>,
        reviewer: Arc<dyn AiReviewer>,
    ) -> Self {
        Self {
            storage,
            converter,
            records,
            reviewer,
        }
    }

    /// Wire the default collaborators: pdfium preview, vision-LLM reviewer
    /// reading through `storage`.
    pub fn from_config(
        config: &ReviewConfig,
        storage: Arc<dyn StorageClient>,
        records: Arc<dyn RecordStore>,
    ) -> Result<Self, ResumeReviewError> {
        let reviewer = LlmReviewer::from_config(config, Arc::clone(&storage))?;
        Ok(Self::new(
            storage,
            Arc::new(PdfiumConverter::from_config(config)),
            records,
            Arc::new(reviewer),
        ))
    }

    /// Run one submission with a freshly generated identifier.
    pub async fn run(
        &self,
        input: &SubmissionInput,
        observer: &dyn StatusObserver,
    ) -> Result<SubmissionRecord, PipelineFailure> {
        self.run_with_id(SubmissionId::generate(), input, observer)
            .await
    }

    /// Run one submission under `id`.
    ///
    /// The id is fixed before any side effect and used for both record
    /// writes. Callers must not reuse an id across runs.
    pub async fn run_with_id(
        &self,
        id: SubmissionId,
        input: &SubmissionInput,
        observer: &dyn StatusObserver,
    ) -> Result<SubmissionRecord, PipelineFailure> {
        let start = Instant::now();
        info!("Submission {}: starting ({})", id, input.file.name);

        match self.stages(id, input, observer).await {
            Ok(record) => {
                report(observer, PipelineStatus::Completed);
                info!(
                    "Submission {}: completed in {}ms",
                    id,
                    start.elapsed().as_millis()
                );
                Ok(record)
            }
            Err(failure) => {
                warn!("Submission {}: {}", id, failure);
                report(
                    observer,
                    PipelineStatus::Failed {
                        kind: failure.kind(),
                        message: failure.to_string(),
                    },
                );
                Err(failure)
            }
        }
    }

    async fn stages(
        &self,
        id: SubmissionId,
        input: &SubmissionInput,
        observer: &dyn StatusObserver,
    ) -> Result<SubmissionRecord, PipelineFailure> {
        // ── Stage 1: Upload the resume ───────────────────────────────────
        report(observer, PipelineStatus::UploadingResume);
        let resume = self
            .storage
            .upload(&input.file)
            .await
            .map_err(|e| PipelineFailure::UploadFailed {
                stage: UploadStage::Resume,
                detail: e.to_string(),
            })?;
        debug!("Submission {}: resume stored at {}", id, resume.path);

        // ── Stage 2: Render the preview ──────────────────────────────────
        report(observer, PipelineStatus::Converting);
        let preview = self
            .converter
            .convert(&input.file)
            .await
            .map_err(|e| PipelineFailure::ConversionFailed {
                detail: e.to_string(),
            })?;

        // ── Stage 3: Upload the preview ──────────────────────────────────
        report(observer, PipelineStatus::UploadingPreview);
        let image = self
            .storage
            .upload(&preview)
            .await
            .map_err(|e| PipelineFailure::UploadFailed {
                stage: UploadStage::Preview,
                detail: e.to_string(),
            })?;
        debug!("Submission {}: preview stored at {}", id, image.path);

        // ── Stage 4: Persist the pending record ──────────────────────────
        report(observer, PipelineStatus::PreparingRecord);
        let record = SubmissionRecord::new(
            id,
            resume.path,
            image.path,
            image.parent_id,
            input.job.clone(),
        );
        self.persist(&record).await?;

        // ── Stage 5: Ask the reviewer ────────────────────────────────────
        report(observer, PipelineStatus::Analyzing);
        let instructions = prepare_instructions(&input.job.job_title, &input.job.job_description);
        let response = self
            .reviewer
            .feedback(record.resume_path(), &instructions)
            .await
            .map_err(|e| PipelineFailure::AnalysisFailed {
                detail: e.to_string(),
            })?;

        // ── Stage 6: Extract structured feedback ─────────────────────────
        report(observer, PipelineStatus::Extracting);
        let feedback = extract::extract_feedback(&response.message.content).map_err(|e| {
            PipelineFailure::ExtractionFailed {
                detail: e.to_string(),
            }
        })?;

        // ── Stage 7: Persist the final record ────────────────────────────
        let record = record.with_feedback(feedback);
        self.persist(&record).await?;
        Ok(record)
    }

    async fn persist(&self, record: &SubmissionRecord) -> Result<(), PipelineFailure> {
        store::put_record(self.records.as_ref(), record)
            .await
            .map_err(|e| PipelineFailure::PersistFailed {
                key: record.key(),
                detail: e.to_string(),
            })
    }
}

fn report(observer: &dyn StatusObserver, status: PipelineStatus) {
    let message = status.message();
    observer.on_status(&status, &message);
}

/// Load a resume from a path or URL and run it through a pipeline built
/// from `config`.
///
/// Setup problems (unreadable input, no LLM provider) are returned as the
/// outer `Err`; once the pipeline starts, its outcome is the inner result.
pub async fn analyze_resume(
    resume: &str,
    job: JobContext,
    config: &ReviewConfig,
    storage: Arc<dyn StorageClient>,
    records: Arc<dyn RecordStore>,
    observer: &dyn StatusObserver,
) -> Result<Result<SubmissionRecord, PipelineFailure>, ResumeReviewError> {
    let file = input::load_resume(resume, config.download_timeout_secs).await?;
    let pipeline = ReviewPipeline::from_config(config, storage, records)?;
    let submission = SubmissionInput { job, file };
    Ok(pipeline.run(&submission, observer).await)
}
