//! Input loading: turn a user-supplied path or URL into an in-memory file.
//!
//! The pipeline moves whole documents between collaborators (storage,
//! converter, reviewer), so the resume is read once into a [`BinaryFile`]
//! and passed around by reference. No format check happens here; the
//! converter is the stage that decides whether the bytes are a usable PDF.

use crate::error::ResumeReviewError;
use std::path::Path;
use tracing::{debug, info};

/// A named binary payload: the uploaded resume or a rendered preview.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl BinaryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without its extension, for naming derived artifacts.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("resume")
    }
}

impl std::fmt::Debug for BinaryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Guess a MIME type from the file extension.
pub fn mime_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Load the resume from a local path or an HTTP/HTTPS URL.
pub async fn load_resume(input: &str, timeout_secs: u64) -> Result<BinaryFile, ResumeReviewError> {
    if input.trim().is_empty() {
        return Err(ResumeReviewError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

async fn load_local(path: &Path) -> Result<BinaryFile, ResumeReviewError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ResumeReviewError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ResumeReviewError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume.pdf")
        .to_string();

    debug!("Loaded local resume: {} ({} bytes)", path.display(), bytes.len());
    Ok(BinaryFile::new(name.clone(), mime_for(&name), bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<BinaryFile, ResumeReviewError> {
    info!("Downloading resume from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ResumeReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ResumeReviewError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ResumeReviewError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ResumeReviewError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ResumeReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(BinaryFile::new(name.clone(), mime_for(&name), bytes.to_vec()))
}

/// Last URL path segment if it looks like a file name, else `resume.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "resume.pdf".to_string()
}
