//! Pipeline integration tests with in-process collaborators.
//!
//! No pdfium, no network: storage, converter, record store and reviewer are
//! recording stand-ins so every stage outcome can be forced and every side
//! effect counted.

use async_trait::async_trait;
use resume_review::store::get_record;
use resume_review::{
    AiReviewer, BinaryFile, ContentPart, ConvertError, FailureKind, FeedbackState, FormatConverter,
    LocalStorage, MemoryRecordStore, PipelineFailure, PipelineStatus, RecordStore,
    RecordStoreError, ReviewPipeline, ReviewerError, ReviewerResponse, StatusObserver,
    StorageClient, StorageError, SubmissionId, SubmissionInput, SubmissionRecord, UploadStage,
    UploadedFile,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test collaborators ───────────────────────────────────────────────────────

/// Storage that hands out sequential paths and can fail the n-th upload.
#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<String>>,
    fail_on_upload: Option<usize>,
}

impl RecordingStorage {
    fn failing_on(n: usize) -> Self {
        Self {
            fail_on_upload: Some(n),
            ..Default::default()
        }
    }

    fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for RecordingStorage {
    async fn upload(&self, file: &BinaryFile) -> Result<UploadedFile, StorageError> {
        let mut uploads = self.uploads.lock().unwrap();
        let n = uploads.len();
        uploads.push(file.name.clone());
        if self.fail_on_upload == Some(n) {
            return Err(StorageError::NotFound("bucket".into()));
        }
        Ok(UploadedFile {
            path: format!("dir{n}/{}", file.name),
            parent_id: format!("dir{n}"),
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(path.to_string()))
    }
}

struct StubConverter {
    calls: AtomicUsize,
    succeed: bool,
}

impl StubConverter {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed: true,
        }
    }

    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed: false,
        }
    }
}

#[async_trait]
impl FormatConverter for StubConverter {
    async fn convert(&self, document: &BinaryFile) -> Result<BinaryFile, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(BinaryFile::new(
                format!("{}.png", document.stem()),
                "image/png",
                b"\x89PNG".to_vec(),
            ))
        } else {
            Err(ConvertError::EmptyDocument {
                name: document.name.clone(),
            })
        }
    }
}

/// Record store that remembers every write in order and can fail the n-th.
#[derive(Default)]
struct RecordingStore {
    writes: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    fail_on_write: Option<usize>,
}

impl RecordingStore {
    fn failing_on(n: usize) -> Self {
        Self {
            fail_on_write: Some(n),
            ..Default::default()
        }
    }

    fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn set(&self, key: &str, value: String) -> Result<(), RecordStoreError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_write == Some(n) {
            return Err(RecordStoreError::InvalidKey(key.to_string()));
        }
        self.writes.lock().unwrap().push((key.to_string(), value));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RecordStoreError> {
        Ok(self
            .writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }
}

/// Reviewer returning a canned answer and recording what it was asked.
struct StubReviewer {
    response: Option<ReviewerResponse>,
    requests: Mutex<Vec<(String, String)>>,
}

impl StubReviewer {
    fn answering(response: ReviewerResponse) -> Self {
        Self {
            response: Some(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl AiReviewer for StubReviewer {
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<ReviewerResponse, ReviewerError> {
        self.requests
            .lock()
            .unwrap()
            .push((document_ref.to_string(), instructions.to_string()));
        self.response
            .clone()
            .ok_or_else(|| ReviewerError::Api("503 Service Unavailable".into()))
    }
}

#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<(PipelineStatus, String)>>,
}

impl RecordingObserver {
    fn statuses(&self) -> Vec<PipelineStatus> {
        self.seen.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    fn last_message(&self) -> String {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|(_, m)| m.clone())
            .unwrap_or_default()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status(&self, status: &PipelineStatus, message: &str) {
        self.seen
            .lock()
            .unwrap()
            .push((status.clone(), message.to_string()));
    }
}

// ── Fixture ──────────────────────────────────────────────────────────────────

struct Harness {
    storage: Arc<RecordingStorage>,
    converter: Arc<StubConverter>,
    store: Arc<RecordingStore>,
    reviewer: Arc<StubReviewer>,
}

impl Harness {
    fn new(
        storage: RecordingStorage,
        converter: StubConverter,
        store: RecordingStore,
        reviewer: StubReviewer,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            converter: Arc::new(converter),
            store: Arc::new(store),
            reviewer: Arc::new(reviewer),
        }
    }

    fn happy(answer: &str) -> Self {
        Self::new(
            RecordingStorage::default(),
            StubConverter::ok(),
            RecordingStore::default(),
            StubReviewer::answering(ReviewerResponse::text(answer)),
        )
    }

    fn pipeline(&self) -> ReviewPipeline {
        ReviewPipeline::new(
            self.storage.clone(),
            self.converter.clone(),
            self.store.clone(),
            self.reviewer.clone(),
        )
    }
}

fn acme_input() -> SubmissionInput {
    SubmissionInput::new(
        "Acme",
        "Engineer",
        "Build things",
        BinaryFile::new("cv.pdf", "application/pdf", b"%PDF-1.7\n...".to_vec()),
    )
}

fn running_stages() -> Vec<PipelineStatus> {
    vec![
        PipelineStatus::UploadingResume,
        PipelineStatus::Converting,
        PipelineStatus::UploadingPreview,
        PipelineStatus::PreparingRecord,
        PipelineStatus::Analyzing,
        PipelineStatus::Extracting,
    ]
}

fn failure_kind(status: &PipelineStatus) -> Option<FailureKind> {
    match status {
        PipelineStatus::Failed { kind, .. } => Some(*kind),
        _ => None,
    }
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn acme_scenario_completes_with_parsed_feedback() {
    let h = Harness::happy("```json\n{\"score\":80}\n```");
    let observer = RecordingObserver::default();

    let record = h.pipeline().run(&acme_input(), &observer).await.unwrap();

    assert_eq!(record.feedback(), &FeedbackState::Ready(json!({"score": 80})));
    assert_eq!(record.job().company_name, "Acme");
    assert_eq!(record.job().job_title, "Engineer");
    assert_eq!(record.job().job_description, "Build things");

    let mut expected = running_stages();
    expected.push(PipelineStatus::Completed);
    assert_eq!(observer.statuses(), expected);
    assert!(observer
        .statuses()
        .iter()
        .all(|s| !matches!(s, PipelineStatus::Failed { .. })));
}

#[tokio::test]
async fn success_writes_pending_then_final_under_one_key() {
    let h = Harness::happy("```json\n{\"score\":80}\n```");
    let record = h
        .pipeline()
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();

    let writes = h.store.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].0, writes[1].0);
    assert_eq!(writes[0].0, format!("resume:{}", record.id()));

    let pending = SubmissionRecord::from_json(&writes[0].1).unwrap();
    let done = SubmissionRecord::from_json(&writes[1].1).unwrap();
    assert!(pending.feedback().is_pending());
    assert_eq!(done.feedback().as_value(), Some(&json!({"score": 80})));
    assert_eq!(pending.id(), done.id());
    assert_eq!(pending.resume_path(), done.resume_path());
    assert_eq!(done, record);

    let raw: serde_json::Value = serde_json::from_str(&writes[0].1).unwrap();
    assert_eq!(raw["feedback"], json!(""));
}

#[tokio::test]
async fn record_references_come_from_upload_results() {
    let h = Harness::happy("{\"score\":1}");
    let record = h
        .pipeline()
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();

    assert_eq!(h.storage.uploaded(), vec!["cv.pdf", "cv.png"]);
    assert_eq!(record.resume_path(), "dir0/cv.pdf");
    assert_eq!(record.image_path(), "dir1/cv.png");
    assert_eq!(record.image_parent_id(), "dir1");
}

#[tokio::test]
async fn reviewer_gets_resume_ref_and_job_instructions() {
    let h = Harness::happy("{\"score\":1}");
    h.pipeline()
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();

    let requests = h.reviewer.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "dir0/cv.pdf");
    assert!(requests[0].1.contains("The job title is: Engineer"));
    assert!(requests[0].1.contains("The job description is: Build things"));
}

#[tokio::test]
async fn multipart_response_uses_first_part() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::ok(),
        RecordingStore::default(),
        StubReviewer::answering(ReviewerResponse::parts(vec![
            ContentPart::text("```JSON\n{\"overallScore\": 64}\n```"),
            ContentPart::text("ignored"),
        ])),
    );
    let record = h
        .pipeline()
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();
    assert_eq!(record.feedback().as_value(), Some(&json!({"overallScore": 64})));
}

#[tokio::test]
async fn empty_job_fields_are_accepted() {
    let h = Harness::happy("{}");
    let input = SubmissionInput::new(
        "",
        "",
        "",
        BinaryFile::new("cv.pdf", "application/pdf", b"%PDF".to_vec()),
    );
    let record = h
        .pipeline()
        .run(&input, &RecordingObserver::default())
        .await
        .unwrap();
    assert_eq!(record.job().company_name, "");
    assert_eq!(record.feedback().as_value(), Some(&json!({})));
}

// ── Identifiers ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn each_run_gets_a_fresh_id() {
    let h = Harness::happy("{}");
    let pipeline = h.pipeline();
    let a = pipeline
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();
    let b = pipeline
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();
    assert_ne!(a.id(), b.id());
    assert_ne!(a.key(), b.key());
}

#[tokio::test]
async fn run_with_id_keys_every_write_by_that_id() {
    let h = Harness::happy("{}");
    let id = SubmissionId::generate();
    let record = h
        .pipeline()
        .run_with_id(id, &acme_input(), &RecordingObserver::default())
        .await
        .unwrap();
    assert_eq!(record.id(), id);
    assert!(h
        .store
        .writes()
        .iter()
        .all(|(k, _)| *k == id.record_key()));
}

// ── Stage failures ───────────────────────────────────────────────────────────

#[tokio::test]
async fn resume_upload_failure_short_circuits_everything() {
    let h = Harness::new(
        RecordingStorage::failing_on(0),
        StubConverter::ok(),
        RecordingStore::default(),
        StubReviewer::answering(ReviewerResponse::text("{}")),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineFailure::UploadFailed {
            stage: UploadStage::Resume,
            ..
        }
    ));
    assert_eq!(h.storage.uploaded().len(), 1, "no second upload");
    assert_eq!(h.converter.calls.load(Ordering::SeqCst), 0, "no conversion");
    assert!(h.store.writes().is_empty(), "no record write");
    assert_eq!(h.reviewer.calls(), 0, "no reviewer call");

    let statuses = observer.statuses();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0], PipelineStatus::UploadingResume);
    assert_eq!(
        failure_kind(&statuses[1]),
        Some(FailureKind::Upload(UploadStage::Resume))
    );
    assert_eq!(observer.last_message(), err.to_string());
}

#[tokio::test]
async fn conversion_failure_never_touches_record_store() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::failing(),
        RecordingStore::default(),
        StubReviewer::answering(ReviewerResponse::text("{}")),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert!(matches!(err, PipelineFailure::ConversionFailed { .. }));
    assert!(h.store.writes().is_empty());
    assert_eq!(h.storage.uploaded(), vec!["cv.pdf"]);
    assert_eq!(h.reviewer.calls(), 0);
    assert_eq!(
        observer.statuses().last().and_then(failure_kind),
        Some(FailureKind::Conversion)
    );
    assert!(observer.last_message().contains("convert"));
}

#[tokio::test]
async fn preview_upload_failure_is_reported_as_preview() {
    let h = Harness::new(
        RecordingStorage::failing_on(1),
        StubConverter::ok(),
        RecordingStore::default(),
        StubReviewer::answering(ReviewerResponse::text("{}")),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Upload(UploadStage::Preview));
    assert!(h.store.writes().is_empty());
    assert_eq!(h.reviewer.calls(), 0);
    assert!(observer.last_message().contains("preview"));
}

#[tokio::test]
async fn analysis_failure_leaves_pending_record() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::ok(),
        RecordingStore::default(),
        StubReviewer::failing(),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert!(matches!(err, PipelineFailure::AnalysisFailed { .. }));
    let writes = h.store.writes();
    assert_eq!(writes.len(), 1);
    let pending = SubmissionRecord::from_json(&writes[0].1).unwrap();
    assert!(pending.feedback().is_pending());

    let statuses = observer.statuses();
    assert_eq!(statuses[statuses.len() - 2], PipelineStatus::Analyzing);
    assert_eq!(
        failure_kind(&statuses[statuses.len() - 1]),
        Some(FailureKind::Analysis)
    );
}

#[tokio::test]
async fn unparseable_feedback_is_extraction_failure_without_rewrite() {
    let h = Harness::happy("not json");
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert!(matches!(err, PipelineFailure::ExtractionFailed { .. }));
    let writes = h.store.writes();
    assert_eq!(writes.len(), 1, "final record must not be written");
    assert!(SubmissionRecord::from_json(&writes[0].1)
        .unwrap()
        .feedback()
        .is_pending());
    assert_eq!(
        observer.statuses().last().and_then(failure_kind),
        Some(FailureKind::Extraction)
    );
}

#[tokio::test]
async fn empty_part_list_is_extraction_failure() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::ok(),
        RecordingStore::default(),
        StubReviewer::answering(ReviewerResponse::parts(vec![])),
    );
    let err = h
        .pipeline()
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineFailure::ExtractionFailed { .. }));
}

#[tokio::test]
async fn record_store_failure_stops_before_analysis() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::ok(),
        RecordingStore::failing_on(0),
        StubReviewer::answering(ReviewerResponse::text("{}")),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    match err {
        PipelineFailure::PersistFailed { key, .. } => assert!(key.starts_with("resume:")),
        other => panic!("expected PersistFailed, got {other:?}"),
    }
    assert_eq!(h.reviewer.calls(), 0);
    assert_eq!(
        observer.statuses().last().and_then(failure_kind),
        Some(FailureKind::Persist)
    );
}

#[tokio::test]
async fn final_write_failure_keeps_pending_record() {
    let h = Harness::new(
        RecordingStorage::default(),
        StubConverter::ok(),
        RecordingStore::failing_on(1),
        StubReviewer::answering(ReviewerResponse::text("{\"score\":80}")),
    );
    let observer = RecordingObserver::default();

    let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Persist);
    assert_eq!(h.reviewer.calls(), 1);
    let writes = h.store.writes();
    assert_eq!(writes.len(), 1);
    assert!(SubmissionRecord::from_json(&writes[0].1)
        .unwrap()
        .feedback()
        .is_pending());

    let statuses = observer.statuses();
    let mut expected = running_stages();
    expected.push(PipelineStatus::Failed {
        kind: FailureKind::Persist,
        message: err.to_string(),
    });
    assert_eq!(statuses, expected);
    assert_eq!(statuses.iter().filter(|s| s.is_terminal()).count(), 1);
}

#[tokio::test]
async fn null_or_empty_feedback_is_extraction_failure() {
    for answer in ["```json\nnull\n```", "```json\n\"\"\n```"] {
        let h = Harness::happy(answer);
        let observer = RecordingObserver::default();

        let err = h.pipeline().run(&acme_input(), &observer).await.unwrap_err();

        assert!(matches!(err, PipelineFailure::ExtractionFailed { .. }), "{answer}");
        let writes = h.store.writes();
        assert_eq!(writes.len(), 1, "{answer}");
        assert!(SubmissionRecord::from_json(&writes[0].1)
            .unwrap()
            .feedback()
            .is_pending());
        assert!(!observer.statuses().contains(&PipelineStatus::Completed));
    }
}

#[tokio::test]
async fn every_failure_is_the_single_terminal_status() {
    let h = Harness::happy("not json");
    let observer = RecordingObserver::default();
    let _ = h.pipeline().run(&acme_input(), &observer).await;

    let statuses = observer.statuses();
    let terminal: Vec<_> = statuses.iter().filter(|s| s.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(statuses.last().map(|s| s.is_terminal()).unwrap_or(false));
    assert!(!statuses.contains(&PipelineStatus::Completed));
}

// ── Real storage + memory store ──────────────────────────────────────────────

#[tokio::test]
async fn local_storage_and_memory_store_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn StorageClient> = Arc::new(LocalStorage::new(dir.path()));
    let records = Arc::new(MemoryRecordStore::new());
    let reviewer = Arc::new(StubReviewer::answering(ReviewerResponse::text(
        "```json\n{\"overallScore\": 77, \"ATS\": {\"score\": 70, \"tips\": []}}\n```",
    )));

    let pipeline = ReviewPipeline::new(
        Arc::clone(&storage),
        Arc::new(StubConverter::ok()),
        records.clone(),
        reviewer,
    );
    let record = pipeline
        .run(&acme_input(), &RecordingObserver::default())
        .await
        .unwrap();

    let stored = get_record(records.as_ref(), &record.key())
        .await
        .unwrap()
        .expect("record persisted");
    assert_eq!(stored, record);
    assert_eq!(records.len().await, 1);

    assert_eq!(
        storage.read(record.resume_path()).await.unwrap(),
        b"%PDF-1.7\n...".to_vec()
    );
    assert_eq!(storage.read(record.image_path()).await.unwrap(), b"\x89PNG".to_vec());
    assert!(record.image_path().starts_with(record.image_parent_id()));
}
