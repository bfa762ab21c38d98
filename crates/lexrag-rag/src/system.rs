use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lexrag_core::chunker::Chunker;
use lexrag_core::config::Settings;
use lexrag_core::traits::{Embedder, Generator, PageExtractor};
use lexrag_core::types::{AddReport, IndexStats, QueryResponse};
use lexrag_core::Result;
use lexrag_vector::ChunkStore;
use tracing::{info, warn};

use crate::engine::QueryEngine;
use crate::ingest::{list_pdfs, DocumentPipeline, IngestProgress};

pub const NO_DOCUMENTS: &str = "❌ Nincsenek betöltött dokumentumok. Kérlek, helyezz PDF fájlokat a 'documents/uploaded' mappába, majd indítsd újra az alkalmazást!";
pub const STATUS_EMPTY: &str = "Nincsenek betöltött dokumentumok";
pub const STATUS_READY: &str = "Rendszer kész";

/// Document store plus query engine over one shared index.
pub struct RagSystem {
    settings: Settings,
    store: Arc<ChunkStore>,
    pipeline: DocumentPipeline,
    engine: QueryEngine,
    documents_loaded: AtomicBool,
    ingest_lock: Mutex<()>,
}

impl RagSystem {
    /// Wire the collaborators together and create the working directories.
    /// Nothing is loaded or ingested yet; see [`RagSystem::initialize`].
    pub fn new(
        settings: Settings,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
        extractor: Box<dyn PageExtractor>,
    ) -> Result<Self> {
        settings.validate()?;
        settings.ensure_directories()?;
        let embedder: Arc<dyn Embedder> = Arc::from(embedder);
        let generator: Arc<dyn Generator> = Arc::from(generator);
        let store = Arc::new(ChunkStore::new(settings.paths.embeddings(), &settings.index, Some(embedder.dim()))?);
        let pipeline = DocumentPipeline::new(
            extractor,
            embedder.clone(),
            store.clone(),
            Chunker::from_settings(&settings.chunking),
            settings.paths.chunks(),
            settings.paths.metadata(),
        );
        let engine = QueryEngine::new(
            store.clone(),
            embedder,
            generator,
            settings.retrieval.clone(),
            settings.llm.clone(),
        );
        Ok(Self {
            settings,
            store,
            pipeline,
            engine,
            documents_loaded: AtomicBool::new(false),
            ingest_lock: Mutex::new(()),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn documents_loaded(&self) -> bool {
        self.documents_loaded.load(Ordering::SeqCst)
    }

    /// Restore the saved index. Returns `false` when there is none or it is
    /// unreadable.
    pub fn load_index(&self) -> bool {
        let _guard = self.ingest_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let loaded = self.store.load();
        if loaded {
            self.documents_loaded.store(true, Ordering::SeqCst);
        }
        loaded
    }

    /// Load the saved index, or when there is none, start ingesting the
    /// documents folder. `None` means the saved index was loaded.
    pub fn initialize(&self) -> Option<IngestProgress<'_>> {
        if self.load_index() {
            info!(chunks = self.store.len(), "existing index loaded");
            return None;
        }
        info!(dir = %self.settings.paths.documents().display(), "no saved index; processing the documents folder");
        Some(self.ingest_folder())
    }

    /// Ingest every PDF directly inside the documents folder.
    pub fn ingest_folder(&self) -> IngestProgress<'_> {
        let dir = self.settings.paths.documents();
        self.ingest_files(list_pdfs(&dir))
    }

    /// Ingest `files` one by one. Blocks while another ingestion is running.
    pub fn ingest_files(&self, files: Vec<PathBuf>) -> IngestProgress<'_> {
        let guard = self.ingest_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let empty_message = format!(
            "⚠️ Nem található PDF fájl a '{}' mappában.",
            self.settings.paths.documents_dir
        );
        IngestProgress::new(guard, &self.pipeline, &self.documents_loaded, files, empty_message)
    }

    /// Copy `paths` into the documents folder and ingest them.
    pub fn add_documents(&self, paths: &[PathBuf]) -> AddReport {
        let mut report = AddReport::default();
        let mut staged = Vec::with_capacity(paths.len());
        for path in paths {
            match self.stage(path) {
                Ok(target) => staged.push(target),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "could not copy document");
                    report.errors.push((display_name(path), e.to_string()));
                }
            }
        }
        if staged.is_empty() {
            return report;
        }

        let mut progress = self.ingest_files(staged);
        for event in progress.by_ref() {
            let name = event.filename.unwrap_or_default();
            match event.error {
                Some(e) => report.errors.push((name, e)),
                None => report.success.push(name),
            }
        }
        report.total_chunks = progress.chunks_added();
        report
    }

    fn stage(&self, path: &Path) -> Result<PathBuf> {
        let docs = self.settings.paths.documents();
        let target = docs.join(path.file_name().unwrap_or(path.as_os_str()));
        let same = match (fs::canonicalize(path), fs::canonicalize(&target)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same {
            fs::create_dir_all(&docs)?;
            fs::copy(path, &target)?;
        }
        Ok(target)
    }

    /// Answer a question; the top `k` defaults to `retrieval.top_k`.
    pub fn query(&self, question: &str, top_k: Option<usize>) -> QueryResponse {
        if !self.documents_loaded() {
            return QueryResponse::message(NO_DOCUMENTS);
        }
        self.engine.answer(question, top_k)
    }

    pub fn stats(&self) -> IndexStats {
        if !self.documents_loaded() || self.store.is_empty() {
            return IndexStats {
                documents: 0,
                chunks: 0,
                status: STATUS_EMPTY.to_string(),
                document_list: Vec::new(),
            };
        }
        let document_list = self.store.document_names();
        IndexStats {
            documents: document_list.len(),
            chunks: self.store.len(),
            status: STATUS_READY.to_string(),
            document_list,
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
