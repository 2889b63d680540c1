//! The persisted submission record and its identifier.
//!
//! A [`SubmissionRecord`] is written to the record store twice under
//! `resume:<id>`: first with [`FeedbackState::Pending`] so a partial
//! submission is visible, then with the parsed feedback once the reviewer's
//! answer has been extracted. Every field except `feedback` is fixed at
//! construction; `feedback` only moves forward via
//! [`SubmissionRecord::with_feedback`].

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Key prefix under which submission records are stored.
pub const RECORD_KEY_PREFIX: &str = "resume:";

/// Globally unique submission identifier (random UUID v4, 122 random bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Draw a fresh identifier from the OS entropy source.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The record-store key for this submission: `resume:<id>`.
    pub fn record_key(&self) -> String {
        format!("{RECORD_KEY_PREFIX}{}", self.0)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl std::str::FromStr for SubmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix(RECORD_KEY_PREFIX).unwrap_or(s);
        Uuid::parse_str(s).map(Self)
    }
}

/// The caller-supplied job context for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

/// Feedback slot of a record: not yet available, or the parsed reviewer JSON.
///
/// On the wire `Pending` is the empty string `""`; anything else is the
/// parsed feedback value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FeedbackState {
    #[default]
    Pending,
    Ready(Value),
}

impl FeedbackState {
    pub fn is_pending(&self) -> bool {
        matches!(self, FeedbackState::Pending)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FeedbackState::Pending => None,
            FeedbackState::Ready(v) => Some(v),
        }
    }
}

impl Serialize for FeedbackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackState::Pending => serializer.serialize_str(""),
            FeedbackState::Ready(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => FeedbackState::Pending,
            Value::String(ref s) if s.is_empty() => FeedbackState::Pending,
            other => FeedbackState::Ready(other),
        })
    }
}

/// The persisted unit of one resume submission.
///
/// `image_path` is the preview file's own storage path; `image_parent_id` is
/// the storage container the upload landed in. Both come from the same
/// upload result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    id: SubmissionId,
    resume_path: String,
    image_path: String,
    image_parent_id: String,
    #[serde(flatten)]
    job: JobContext,
    #[serde(default)]
    feedback: FeedbackState,
}

impl SubmissionRecord {
    /// Build the preliminary record once both uploads have succeeded.
    pub fn new(
        id: SubmissionId,
        resume_path: impl Into<String>,
        image_path: impl Into<String>,
        image_parent_id: impl Into<String>,
        job: JobContext,
    ) -> Self {
        Self {
            id,
            resume_path: resume_path.into(),
            image_path: image_path.into(),
            image_parent_id: image_parent_id.into(),
            job,
            feedback: FeedbackState::Pending,
        }
    }

    /// Attach the parsed feedback. Consumes the record so the pending copy
    /// cannot be written again after this point.
    pub fn with_feedback(mut self, feedback: Value) -> Self {
        self.feedback = FeedbackState::Ready(feedback);
        self
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn key(&self) -> String {
        self.id.record_key()
    }

    pub fn resume_path(&self) -> &str {
        &self.resume_path
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn image_parent_id(&self) -> &str {
        &self.image_parent_id
    }

    pub fn job(&self) -> &JobContext {
        &self.job
    }

    pub fn feedback(&self) -> &FeedbackState {
        &self.feedback
    }

    /// Serialise to the JSON string stored under [`Self::key`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn sample(id: SubmissionId) -> SubmissionRecord {
        SubmissionRecord::new(
            id,
            "a1/cv.pdf",
            "b2/cv.png",
            "b2",
            JobContext {
                company_name: "Acme".into(),
                job_title: "Engineer".into(),
                job_description: "Build things".into(),
            },
        )
    }

    #[test]
    fn identifiers_do_not_collide() {
        let n = 10_000;
        let ids: HashSet<SubmissionId> = (0..n).map(|_| SubmissionId::generate()).collect();
        assert_eq!(ids.len(), n);
    }

    #[test]
    fn identifiers_are_v4() {
        let id = SubmissionId::generate();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn record_key_format() {
        let id: SubmissionId = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(id.record_key(), "resume:67e55044-10b1-426f-9247-bb680e5fe0c8");
        let from_key: SubmissionId = "resume:67e55044-10b1-426f-9247-bb680e5fe0c8"
            .parse()
            .unwrap();
        assert_eq!(from_key, id);
    }

    #[test]
    fn pending_record_serialises_empty_feedback() {
        let rec = sample(SubmissionId::generate());
        let v: Value = serde_json::from_str(&rec.to_json().unwrap()).unwrap();
        assert_eq!(v["feedback"], json!(""));
        assert_eq!(v["companyName"], json!("Acme"));
        assert_eq!(v["jobTitle"], json!("Engineer"));
        assert_eq!(v["resumePath"], json!("a1/cv.pdf"));
        assert_eq!(v["imagePath"], json!("b2/cv.png"));
        assert_eq!(v["imageParentId"], json!("b2"));
    }

    #[test]
    fn completed_record_reads_back() {
        let rec = sample(SubmissionId::generate()).with_feedback(json!({"score": 80}));
        let back = SubmissionRecord::from_json(&rec.to_json().unwrap()).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.feedback().as_value(), Some(&json!({"score": 80})));
    }

    #[test]
    fn missing_feedback_field_is_pending() {
        let raw = r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","resumePath":"p","imagePath":"i",
            "imageParentId":"d","companyName":"","jobTitle":"","jobDescription":""}"#;
        let rec = SubmissionRecord::from_json(raw).unwrap();
        assert!(rec.feedback().is_pending());
    }
}
