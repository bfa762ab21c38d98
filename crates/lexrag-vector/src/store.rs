use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lexrag_core::config::{IndexBackendKind, IndexSettings};
use lexrag_core::types::{ChunkId, ChunkRecord, NewChunk, SearchResult};
use lexrag_core::{Error, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::backend::{select_backend, VectorBackend};

struct Inner {
    backend: Box<dyn VectorBackend>,
    records: Vec<ChunkRecord>,
}

/// Vectors and chunk records kept in lockstep: row `i` of the backend is
/// the embedding of `records[i]`, and `records[i].chunk_id == i`.
pub struct ChunkStore {
    dir: PathBuf,
    name: String,
    kind: IndexBackendKind,
    dim: Option<usize>,
    inner: RwLock<Inner>,
}

impl ChunkStore {
    /// An empty store saving into `dir` under `settings.name`. `dim` pins the
    /// vector dimension; `None` lets the first append establish it.
    pub fn new(dir: impl Into<PathBuf>, settings: &IndexSettings, dim: Option<usize>) -> Result<Self> {
        let backend = select_backend(settings.backend, dim)?;
        info!(backend = backend.name(), ?dim, "vector index ready");
        Ok(Self {
            dir: dir.into(),
            name: settings.name.clone(),
            kind: settings.backend,
            dim,
            inner: RwLock::new(Inner { backend, records: Vec::new() }),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend_name(&self) -> &'static str {
        self.read().backend.name()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> Option<usize> {
        self.read().backend.dim()
    }

    /// Append chunks with their embeddings, assigning consecutive chunk ids.
    /// Nothing is stored when any vector is rejected.
    pub fn append(&self, chunks: Vec<NewChunk>, vectors: Vec<Vec<f32>>) -> Result<Vec<ChunkId>> {
        if chunks.len() != vectors.len() {
            return Err(Error::Index(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        let mut inner = self.write();
        inner.backend.add(&vectors)?;
        let first = inner.records.len() as ChunkId;
        let ids: Vec<ChunkId> = (first..first + chunks.len() as ChunkId).collect();
        for (id, chunk) in ids.iter().zip(chunks) {
            inner.records.push(ChunkRecord::from_new(*id, chunk));
        }
        debug!(added = ids.len(), total = inner.records.len(), "appended chunks");
        Ok(ids)
    }

    /// Top-`k` records by inner product with `query`, ranked from 1.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let inner = self.read();
        let hits = inner.backend.search(query, k)?;
        hits.into_iter()
            .enumerate()
            .map(|(i, (pos, score))| {
                let record = inner
                    .records
                    .get(pos)
                    .cloned()
                    .ok_or_else(|| Error::Index(format!("no record at position {pos}")))?;
                Ok(SearchResult { record, similarity_score: score, rank: i + 1 })
            })
            .collect()
    }

    pub fn records(&self) -> Vec<ChunkRecord> {
        self.read().records.clone()
    }

    /// Sorted, de-duplicated names of every indexed document.
    pub fn document_names(&self) -> Vec<String> {
        let inner = self.read();
        let names: BTreeSet<&str> = inner.records.iter().map(|r| r.document_name.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    pub fn vectors_path(&self) -> PathBuf {
        self.dir.join(self.read().backend.file_name(&self.name))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(format!("{}_metadata.json", self.name))
    }

    /// Write vectors and records. Each file is replaced atomically.
    pub fn persist(&self) -> bool {
        match self.try_persist() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist index");
                false
            }
        }
    }

    fn try_persist(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let inner = self.read();
        let vectors_path = self.dir.join(inner.backend.file_name(&self.name));
        let tmp = NamedTempFile::new_in(&self.dir)?;
        inner.backend.save(tmp.path())?;
        tmp.persist(&vectors_path).map_err(|e| Error::Io(e.error))?;

        let tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, &inner.records)?;
            writer.flush()?;
        }
        tmp.persist(self.metadata_path()).map_err(|e| Error::Io(e.error))?;
        info!(chunks = inner.records.len(), path = %vectors_path.display(), "index saved");
        Ok(())
    }

    /// Replace the in-memory state with the saved index. Returns `false` and
    /// leaves the store untouched when either file is missing or they
    /// disagree.
    pub fn load(&self) -> bool {
        match self.try_load() {
            Ok(n) => {
                info!(chunks = n, "index loaded");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not load index");
                false
            }
        }
    }

    fn try_load(&self) -> Result<usize> {
        let mut backend = select_backend(self.kind, self.dim)?;
        let vectors_path = self.dir.join(backend.file_name(&self.name));
        let metadata_path = self.metadata_path();
        for path in [&vectors_path, &metadata_path] {
            if !path.exists() {
                return Err(Error::NotFound(path.display().to_string()));
            }
        }
        backend.load(&vectors_path)?;
        let records: Vec<ChunkRecord> = read_json(&metadata_path)?;
        if records.len() != backend.len() {
            return Err(Error::Index(format!(
                "{} vectors but {} metadata records",
                backend.len(),
                records.len()
            )));
        }
        if let Some((pos, _)) = records.iter().enumerate().find(|(i, r)| r.chunk_id != *i as ChunkId) {
            return Err(Error::Index(format!("chunk id out of sequence at position {pos}")));
        }
        let n = records.len();
        *self.write() = Inner { backend, records };
        Ok(n)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}
