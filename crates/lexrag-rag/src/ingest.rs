//! Document ingestion: extract, chunk, embed, append, write side files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard};
use std::time::Instant;

use lexrag_core::chunker::Chunker;
use lexrag_core::traits::{Embedder, PageExtractor};
use lexrag_core::types::{DocumentMetadata, NewChunk, PageSpan, ProgressEvent};
use lexrag_core::{Error, Result};
use lexrag_vector::ChunkStore;
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// PDF files directly inside `dir`, sorted by path.
pub fn list_pdfs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")))
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

/// Turns one file into indexed chunks.
pub struct DocumentPipeline {
    extractor: Box<dyn PageExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<ChunkStore>,
    chunker: Chunker,
    chunks_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl DocumentPipeline {
    pub fn new(
        extractor: Box<dyn PageExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<ChunkStore>,
        chunker: Chunker,
        chunks_dir: PathBuf,
        metadata_dir: PathBuf,
    ) -> Self {
        Self { extractor, embedder, store, chunker, chunks_dir, metadata_dir }
    }

    /// Index one document and return how many chunks it contributed.
    pub fn process_file(&self, path: &Path) -> Result<usize> {
        let start = Instant::now();
        let name = file_name(path);
        let pages = self.extractor.extract_pages(path)?;
        let chunks = self.chunker.chunk_pages(&pages);
        if chunks.is_empty() {
            return Err(Error::Extraction(format!("{name}: no extractable text")));
        }

        let bytes = fs::read(path)?;
        let file_hash = blake3::hash(&bytes).to_hex().to_string();
        let texts: Vec<String> = chunks.iter().map(|(text, _)| text.clone()).collect();
        let vectors = self.embedder.encode(&texts, true)?;

        let chunk_pages: Vec<PageSpan> = chunks.iter().map(|(_, span)| *span).collect();
        let new_chunks: Vec<NewChunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, (text, span))| NewChunk {
                text,
                document_name: name.clone(),
                document_hash: file_hash.clone(),
                chunk_index: i,
                pages: Some(span),
            })
            .collect();
        let count = new_chunks.len();
        self.store.append(new_chunks, vectors)?;

        let metadata = DocumentMetadata {
            file_path: path.display().to_string(),
            file_name: name.clone(),
            total_pages: pages.len(),
            file_size: bytes.len() as u64,
            file_hash,
            chunk_pages,
        };
        if let Err(e) = self.write_side_files(path, &texts, &metadata) {
            warn!(file = %name, error = %e, "could not write side files");
        }
        info!(file = %name, chunks = count, pages = pages.len(), elapsed_ms = start.elapsed().as_millis() as u64, "document indexed");
        Ok(count)
    }

    fn write_side_files(&self, path: &Path, texts: &[String], metadata: &DocumentMetadata) -> Result<()> {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| metadata.file_name.clone());
        fs::create_dir_all(&self.chunks_dir)?;
        fs::create_dir_all(&self.metadata_dir)?;
        fs::write(self.chunks_dir.join(format!("{stem}_chunks.json")), serde_json::to_string_pretty(texts)?)?;
        fs::write(self.metadata_dir.join(format!("{stem}_metadata.json")), serde_json::to_string_pretty(metadata)?)?;
        Ok(())
    }
}

/// Lazy ingestion of a batch of files: each `next()` processes one file.
///
/// Holds the ingestion lock until dropped. Once the batch ends (or the
/// iterator is dropped early) the index is persisted and the loaded flag set,
/// provided at least one file succeeded.
pub struct IngestProgress<'a> {
    _guard: MutexGuard<'a, ()>,
    pipeline: &'a DocumentPipeline,
    loaded: &'a AtomicBool,
    files: Vec<PathBuf>,
    next: usize,
    empty_message: Option<String>,
    succeeded: usize,
    chunks_added: usize,
    finalized: bool,
}

impl<'a> IngestProgress<'a> {
    pub(crate) fn new(
        guard: MutexGuard<'a, ()>,
        pipeline: &'a DocumentPipeline,
        loaded: &'a AtomicBool,
        files: Vec<PathBuf>,
        empty_message: String,
    ) -> Self {
        let empty_message = files.is_empty().then_some(empty_message);
        if !files.is_empty() {
            info!(files = files.len(), "ingestion started");
        }
        Self {
            _guard: guard,
            pipeline,
            loaded,
            files,
            next: 0,
            empty_message,
            succeeded: 0,
            chunks_added: 0,
            finalized: false,
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn chunks_added(&self) -> usize {
        self.chunks_added
    }

    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if self.succeeded == 0 {
            if !self.files.is_empty() {
                error!("no document could be processed; index not saved");
            }
            return;
        }
        if !self.pipeline.store.persist() {
            warn!("index could not be saved; documents stay available until exit");
        }
        self.loaded.store(true, Ordering::SeqCst);
        info!(succeeded = self.succeeded, total = self.files.len(), chunks = self.chunks_added, "ingestion finished");
    }
}

impl Iterator for IngestProgress<'_> {
    type Item = ProgressEvent;

    fn next(&mut self) -> Option<ProgressEvent> {
        if let Some(msg) = self.empty_message.take() {
            self.finalized = true;
            return Some(ProgressEvent { current: 0, total: 0, filename: None, error: Some(msg) });
        }
        let Some(path) = self.files.get(self.next).cloned() else {
            self.finalize();
            return None;
        };
        self.next += 1;
        let name = file_name(&path);
        let error = match self.pipeline.process_file(&path) {
            Ok(n) => {
                self.succeeded += 1;
                self.chunks_added += n;
                None
            }
            Err(e) => {
                error!(file = %name, error = %e, "document failed");
                Some(e.to_string())
            }
        };
        if self.next == self.files.len() {
            self.finalize();
        }
        Some(ProgressEvent { current: self.next, total: self.files.len(), filename: Some(name), error })
    }
}

impl Drop for IngestProgress<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}
