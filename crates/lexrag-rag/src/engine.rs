//! Per-question retrieval and answer synthesis.

use std::sync::Arc;

use lexrag_core::config::{LlmSettings, RetrievalSettings};
use lexrag_core::traits::{Embedder, Generator};
use lexrag_core::types::{QueryResponse, SearchResult};
use lexrag_core::{Error, Result};
use lexrag_vector::ChunkStore;
use tracing::{debug, warn};

use crate::context::{assemble_context, user_prompt, SYSTEM_PROMPT, TRANSLATE_MAX_TOKENS, TRANSLATE_PROMPT};
use crate::fusion::{fuse, top_by_score};
use crate::mmr::mmr_select;
use crate::sources::format_sources;

pub const NO_RESULTS: &str = "❌ Nem találtam releváns információt a kérdésedre a dokumentumokban.";

pub struct QueryEngine {
    store: Arc<ChunkStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    retrieval: RetrievalSettings,
    llm: LlmSettings,
}

impl QueryEngine {
    pub fn new(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        retrieval: RetrievalSettings,
        llm: LlmSettings,
    ) -> Self {
        Self { store, embedder, generator, retrieval, llm }
    }

    /// Answer `question` from the indexed chunks. Never fails: errors become
    /// an answer text with no sources.
    pub fn answer(&self, question: &str, top_k: Option<usize>) -> QueryResponse {
        let k = top_k.unwrap_or(self.retrieval.top_k).max(1);
        let selected = match self.retrieve(question, k) {
            Ok(selected) => selected,
            Err(e) => {
                warn!(error = %e, "query failed");
                return QueryResponse::message(format!("❌ Hiba történt a lekérdezés során: {e}"));
            }
        };
        if selected.is_empty() {
            return QueryResponse::message(NO_RESULTS);
        }

        let context = assemble_context(&selected, self.retrieval.context_token_budget);
        let prompt = user_prompt(question, &context);
        match self.generator.complete(SYSTEM_PROMPT, &prompt, self.llm.max_tokens, self.llm.temperature) {
            Ok(answer) => QueryResponse { answer, sources: format_sources(&selected) },
            Err(e) => {
                warn!(error = %e, "answer generation failed");
                QueryResponse::message(format!("❌ Hiba történt a válasz generálása során: {e}"))
            }
        }
    }

    /// Expand, search, fuse and select; ranks of the result run from 1.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let k = k.max(1);
        let retrieve_n = k.max(self.retrieval.retrieve_n);
        let queries = self.expand_queries(question);

        let mut lists = Vec::with_capacity(queries.len());
        for query in &queries {
            let vector = self
                .embedder
                .encode(std::slice::from_ref(query), true)?
                .pop()
                .ok_or_else(|| Error::Embedding("embedder returned no vector".into()))?;
            lists.push(self.store.search(&vector, retrieve_n)?);
        }
        let candidates = fuse(lists);
        debug!(queries = queries.len(), candidates = candidates.len(), k, "fused candidates");

        let mut selected = if self.retrieval.enable_diversify && candidates.len() > k {
            self.diversify(candidates, k)?
        } else {
            top_by_score(candidates, k)
        };
        for (i, result) in selected.iter_mut().enumerate() {
            result.rank = i + 1;
        }
        Ok(selected)
    }

    /// The question itself, plus its Romanian translation when multi-query
    /// expansion is on and the translation succeeds.
    pub fn expand_queries(&self, question: &str) -> Vec<String> {
        let mut queries = vec![question.to_string()];
        if self.retrieval.enable_multiquery {
            if let Some(translated) = self.translate(question) {
                queries.push(translated);
            }
        }
        queries
    }

    fn translate(&self, question: &str) -> Option<String> {
        match self.generator.complete(TRANSLATE_PROMPT, question, TRANSLATE_MAX_TOKENS, 0.0) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    debug!("translation came back empty");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                warn!(error = %e, "query translation failed; using the original question only");
                None
            }
        }
    }

    fn diversify(&self, candidates: Vec<SearchResult>, k: usize) -> Result<Vec<SearchResult>> {
        let texts: Vec<String> = candidates.iter().map(|c| c.record.text.clone()).collect();
        let embeddings = self.embedder.encode(&texts, true)?;
        let sims: Vec<f32> = candidates.iter().map(|c| c.similarity_score).collect();
        let order = mmr_select(&sims, &embeddings, k, self.retrieval.diversify_lambda);

        let mut slots: Vec<Option<SearchResult>> = candidates.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }
}
