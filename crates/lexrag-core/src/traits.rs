//! Seams to the external collaborators: the embedding model, the language
//! model and the page-text extractor.

use std::path::Path;

use crate::error::Result;

/// Converts text to fixed-dimension vectors.
///
/// Implementations must be deterministic, and with `normalize` set every row
/// must have unit L2 norm so that inner product equals cosine similarity.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>>;
}

/// Turns a system prompt and a user prompt into prose.
pub trait Generator: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

/// Yields the raw text of every page of a document, in page order.
pub trait PageExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}
