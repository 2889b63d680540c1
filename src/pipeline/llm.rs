//! Vision-LLM reviewer: stored resume → page images → model feedback.
//!
//! [`LlmReviewer`] fetches the document behind a storage reference,
//! rasterises its leading pages, and sends them with the instruction
//! payload to any [`LLMProvider`]. Prompt text lives in
//! [`crate::prompts`]; this module only builds messages and makes the call.
//!
//! There is no retry loop here. A failed or timed-out call is returned as a
//! [`ReviewerError`] and the pipeline stops; a retry is a new submission.

use crate::config::{ReviewConfig, DEFAULT_MODEL};
use crate::error::{ResumeReviewError, ReviewerError};
use crate::pipeline::input::{mime_for, BinaryFile};
use crate::pipeline::{encode, render};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::reviewer::{AiReviewer, ReviewerResponse};
use crate::storage::StorageClient;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

/// Reviewer backed by a vision-capable chat model.
pub struct LlmReviewer {
    provider: Arc<dyn LLMProvider>,
    storage: Arc<dyn StorageClient>,
    config: ReviewConfig,
}

impl LlmReviewer {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        storage: Arc<dyn StorageClient>,
        config: &ReviewConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            config: config.clone(),
        }
    }

    /// Resolve a provider from `config` and build the reviewer.
    pub fn from_config(
        config: &ReviewConfig,
        storage: Arc<dyn StorageClient>,
    ) -> Result<Self, ResumeReviewError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, storage, config))
    }
}

#[async_trait]
impl AiReviewer for LlmReviewer {
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<ReviewerResponse, ReviewerError> {
        let start = Instant::now();
        let config = &self.config;

        let bytes = self
            .storage
            .read(document_ref)
            .await
            .map_err(|source| ReviewerError::Document {
                path: document_ref.to_string(),
                source,
            })?;
        let document = BinaryFile::new(document_ref, mime_for(document_ref), bytes);

        let pages = render::render_leading_pages(
            &document,
            config.review_pages.max(1),
            config.review_pixels,
            config.pdfium_lib_path.as_deref(),
        )
        .await?;

        let images = pages
            .iter()
            .map(encode::encode_page)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReviewerError::Render(e.into()))?;
        debug!("Sending {} page image(s) for review", images.len());

        let system_prompt = config
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user_with_images(instructions, images),
        ];
        let options = build_options(config);

        let response = timeout(
            Duration::from_secs(config.api_timeout_secs),
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        .map_err(|_| ReviewerError::Timeout {
            secs: config.api_timeout_secs,
        })?
        .map_err(|e| ReviewerError::Api(e.to_string()))?;

        info!(
            "Review received: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ReviewerError::EmptyResponse);
        }
        Ok(ReviewerResponse::text(response.content))
    }
}

/// Build `CompletionOptions` from the review config.
fn build_options(config: &ReviewConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ResumeReviewError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ResumeReviewError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`]; the API key comes from that provider's env var.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via [`ProviderFactory::from_env`].
pub fn resolve_provider(config: &ReviewConfig) -> Result<Arc<dyn LLMProvider>, ResumeReviewError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ResumeReviewError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
