//! Building blocks used by the collaborators and the orchestrator.
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ extract
//! (path/URL) (pdfium)  (PNG/b64)  (VLM)   (JSON)
//! ```
//!
//! 1. [`input`]   — load a resume from disk or HTTP into a [`input::BinaryFile`]
//! 2. [`render`]  — rasterise leading pages; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]  — PNG bytes for previews, base64 `ImageData` for the model
//! 4. [`llm`]     — the vision-LLM reviewer and provider resolution
//! 5. [`extract`] — fence stripping and JSON parsing of the reviewer's answer

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
