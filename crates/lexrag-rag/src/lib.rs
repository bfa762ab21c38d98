//! lexrag-rag
//!
//! Retrieval-augmented answering over an indexed PDF collection: the
//! ingestion pipeline that feeds the [`lexrag_vector::ChunkStore`], the query
//! engine (expansion, search, fusion, MMR, context assembly) and the
//! [`RagSystem`] facade tying them together.

pub mod context;
pub mod engine;
pub mod fusion;
pub mod ingest;
pub mod mmr;
pub mod sources;
pub mod system;

pub use engine::QueryEngine;
pub use ingest::{list_pdfs, DocumentPipeline, IngestProgress};
pub use system::RagSystem;
