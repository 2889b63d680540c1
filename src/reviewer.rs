//! AI reviewer contract and the shape of its responses.
//!
//! Reviewers answer with either a plain string or a list of typed content
//! parts (the multi-part shape most chat APIs use):
//!
//! ```json
//! {"message": {"content": "```json\n{\"overallScore\": 80}\n```"}}
//! {"message": {"content": [{"type": "text", "text": "{\"overallScore\": 80}"}]}}
//! ```

use crate::error::ReviewerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reviews the stored document at `document_ref` against `instructions`.
#[async_trait]
pub trait AiReviewer: Send + Sync {
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<ReviewerResponse, ReviewerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerResponse {
    pub message: ReviewerMessage,
}

impl ReviewerResponse {
    /// Wrap a plain-text answer.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: ReviewerMessage {
                content: MessageContent::Text(content.into()),
            },
        }
    }

    /// Wrap a multi-part answer.
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self {
            message: ReviewerMessage {
                content: MessageContent::Parts(parts),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One typed content part; only `text` matters to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".into()),
            text: Some(text.into()),
        }
    }
}
