//! Configuration for a resume review run.
//!
//! All tunable behaviour lives in [`ReviewConfig`], built through its
//! [`ReviewConfigBuilder`]. Setters clamp out-of-range values; `build()`
//! rejects combinations that can never work.

use crate::error::ResumeReviewError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Configuration for the converter, reviewer and input loader.
///
/// # Example
/// ```rust
/// use resume_review::ReviewConfig;
///
/// let config = ReviewConfig::builder()
///     .max_preview_pixels(800)
///     .review_pages(1)
///     .model("gpt-4.1")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_preview_pixels, 800);
/// ```
#[derive(Clone)]
pub struct ReviewConfig {
    /// Longest edge of the preview thumbnail in pixels. Default: 1200.
    pub max_preview_pixels: u32,

    /// Number of leading pages shown to the reviewer. Default: 2.
    ///
    /// Resumes rarely run past two pages; anything beyond that costs tokens
    /// without changing the verdict much.
    pub review_pages: usize,

    /// Longest edge of each page image sent to the reviewer. Default: 2000.
    pub review_pixels: u32,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the reviewer may generate. Default: 4096.
    pub max_tokens: usize,

    /// Custom reviewer system prompt. If None, uses the built-in one.
    pub system_prompt: Option<String>,

    /// Reviewer call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Path to libpdfium (file or containing directory). Falls back to
    /// `PDFIUM_LIB_PATH`, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_preview_pixels: 1200,
            review_pages: 2,
            review_pixels: 2000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            system_prompt: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ReviewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewConfig")
            .field("max_preview_pixels", &self.max_preview_pixels)
            .field("review_pages", &self.review_pages)
            .field("review_pixels", &self.review_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ReviewConfig {
    /// Create a new builder for `ReviewConfig`.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReviewConfig`].
#[derive(Debug)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    pub fn max_preview_pixels(mut self, px: u32) -> Self {
        self.config.max_preview_pixels = px.max(100);
        self
    }

    pub fn review_pages(mut self, n: usize) -> Self {
        self.config.review_pages = n;
        self
    }

    pub fn review_pixels(mut self, px: u32) -> Self {
        self.config.review_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReviewConfig, ResumeReviewError> {
        let c = &self.config;
        if c.review_pages == 0 {
            return Err(ResumeReviewError::InvalidConfig(
                "review_pages must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ResumeReviewError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ResumeReviewError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
