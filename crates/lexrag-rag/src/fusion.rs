use std::collections::HashMap;

use lexrag_core::types::{ChunkId, SearchResult};

/// Merge result lists by chunk id. A chunk keeps the position where it was
/// first seen and the highest score any list gave it.
pub fn fuse<I>(lists: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    let mut fused: Vec<SearchResult> = Vec::new();
    let mut slot: HashMap<ChunkId, usize> = HashMap::new();
    for hit in lists.into_iter().flatten() {
        match slot.get(&hit.chunk_id()) {
            Some(&i) => {
                if hit.similarity_score > fused[i].similarity_score {
                    fused[i] = hit;
                }
            }
            None => {
                slot.insert(hit.chunk_id(), fused.len());
                fused.push(hit);
            }
        }
    }
    fused
}

/// The `k` best results by descending score; equal scores keep their order.
pub fn top_by_score(mut results: Vec<SearchResult>, k: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    results.truncate(k);
    results
}
