//! Feedback extraction: reviewer response → parsed JSON feedback.
//!
//! Models asked for "JSON only" still like to wrap their answer in a
//! ```` ```json ```` fence. Normalisation is deliberately narrow:
//!
//! 1. remove the first ```` ```json ```` marker (case-insensitive)
//! 2. remove every remaining ```` ``` ```` fence delimiter
//! 3. trim surrounding whitespace
//!
//! The result must then parse as JSON in full. There is no partial or
//! best-effort recovery: either a complete value comes out, or
//! [`ExtractionError`] does. `null` and `""` are rejected as well, since a
//! stored record reads those back as pending feedback.

use crate::error::ExtractionError;
use crate::reviewer::MessageContent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```json").unwrap());

/// Pick the text the reviewer answered with.
///
/// Plain string content is used as-is; for multi-part content the first
/// part's text is used.
pub fn feedback_text(content: &MessageContent) -> Result<&str, ExtractionError> {
    match content {
        MessageContent::Text(s) => Ok(s.as_str()),
        MessageContent::Parts(parts) => {
            let first = parts.first().ok_or(ExtractionError::NoContent)?;
            first.text.as_deref().ok_or(ExtractionError::MissingText)
        }
    }
}

/// Strip a leading ```` ```json ```` marker and all ```` ``` ```` fences, then trim.
pub fn strip_json_fences(text: &str) -> String {
    let without_marker = RE_JSON_FENCE.replace(text, "");
    without_marker.replace("```", "").trim().to_string()
}

/// Extract the structured feedback from a reviewer response.
pub fn extract_feedback(content: &MessageContent) -> Result<Value, ExtractionError> {
    let text = feedback_text(content)?;
    let cleaned = strip_json_fences(text);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|source| ExtractionError::InvalidJson { source })?;
    match value {
        Value::Null => Err(ExtractionError::EmptyFeedback("null")),
        Value::String(ref s) if s.is_empty() => Err(ExtractionError::EmptyFeedback("empty string")),
        other => Ok(other),
    }
}
