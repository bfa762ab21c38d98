//! Domain types shared by the index, the ingestion pipeline and the query engine.

use serde::{Deserialize, Serialize};

/// Position of a chunk in the metadata collection, equal to its row in the
/// vector index.
pub type ChunkId = u64;

/// 1-based page range a chunk was cut from.
///
/// The chunker works page by page, so `start == end` today; the range is kept
/// so cross-page chunking does not need a format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan {
    pub page_start: u32,
    pub page_end: u32,
}

impl PageSpan {
    pub fn single(page: u32) -> Self {
        Self { page_start: page, page_end: page }
    }
}

/// A chunk produced by ingestion that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub text: String,
    pub document_name: String,
    pub document_hash: String,
    pub chunk_index: usize,
    pub pages: Option<PageSpan>,
}

/// The persisted unit: one chunk plus where it came from.
///
/// `chunk_id` is assigned at insertion as the current size of the metadata
/// collection. Records are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: ChunkId,
    pub text: String,
    pub document_name: String,
    pub document_hash: String,
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_end: Option<u32>,
}

impl ChunkRecord {
    pub fn from_new(chunk_id: ChunkId, chunk: NewChunk) -> Self {
        Self {
            chunk_id,
            text: chunk.text,
            document_name: chunk.document_name,
            document_hash: chunk.document_hash,
            chunk_index: chunk.chunk_index,
            page_start: chunk.pages.map(|p| p.page_start),
            page_end: chunk.pages.map(|p| p.page_end),
        }
    }

    /// Human-readable page reference: `"7"` or `"7–9"` (en dash).
    pub fn pages(&self) -> Option<String> {
        match (self.page_start, self.page_end) {
            (Some(start), Some(end)) if start != end => Some(format!("{start}–{end}")),
            (Some(start), _) => Some(start.to_string()),
            _ => None,
        }
    }
}

/// A record returned by a search, with its inner-product score and its rank
/// within one particular result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: ChunkRecord,
    pub similarity_score: f32,
    pub rank: usize,
}

impl SearchResult {
    pub fn chunk_id(&self) -> ChunkId {
        self.record.chunk_id
    }
}

/// User-facing projection of a selected chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceView {
    pub document: String,
    pub relevance: String,
    pub preview: String,
    pub pages: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

impl QueryResponse {
    /// An answer with no sources: used for every early exit and failure.
    pub fn message(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), sources: Vec::new() }
    }
}

/// Audit record written next to each ingested document's chunk list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub file_name: String,
    pub total_pages: usize,
    pub file_size: u64,
    pub file_hash: String,
    pub chunk_pages: Vec<PageSpan>,
}

/// One step of an ingestion batch.
///
/// `total == 0` with an error means no input files were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub current: usize,
    pub total: usize,
    pub filename: Option<String>,
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of an incremental addition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReport {
    pub success: Vec<String>,
    pub errors: Vec<(String, String)>,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub status: String,
    pub document_list: Vec<String>,
}
