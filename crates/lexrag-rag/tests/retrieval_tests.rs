use std::collections::HashSet;

use lexrag_core::types::{ChunkRecord, SearchResult};
use lexrag_rag::context::{assemble_context, BLOCK_SEPARATOR, NO_CONTEXT};
use lexrag_rag::fusion::{fuse, top_by_score};
use lexrag_rag::mmr::mmr_select;
use lexrag_rag::sources::format_sources;

fn hit(id: u64, score: f32, text: &str) -> SearchResult {
    SearchResult {
        record: ChunkRecord {
            chunk_id: id,
            text: text.to_string(),
            document_name: format!("doc{}.pdf", id % 3),
            document_hash: "h".into(),
            chunk_index: id as usize,
            page_start: Some(1),
            page_end: Some(1),
        },
        similarity_score: score,
        rank: 0,
    }
}

#[test]
fn fusion_keeps_the_higher_score_once() {
    let fused = fuse(vec![
        vec![hit(3, 0.7, "a"), hit(1, 0.5, "b")],
        vec![hit(3, 0.9, "a"), hit(2, 0.4, "c")],
    ]);
    let ids: Vec<u64> = fused.iter().map(|r| r.chunk_id()).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(fused[0].similarity_score, 0.9);
}

#[test]
fn fusion_does_not_lower_a_score() {
    let fused = fuse(vec![vec![hit(5, 0.9, "a")], vec![hit(5, 0.2, "a")]]);
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].similarity_score, 0.9);
}

#[test]
fn plain_selection_is_sorted_and_stable() {
    let picked = top_by_score(vec![hit(0, 0.3, "a"), hit(1, 0.8, "b"), hit(2, 0.3, "c"), hit(3, 0.9, "d")], 3);
    let ids: Vec<u64> = picked.iter().map(|r| r.chunk_id()).collect();
    assert_eq!(ids, vec![3, 1, 0]);
    assert_eq!(top_by_score(vec![hit(0, 0.3, "a")], 5).len(), 1);
}

fn unit(v: &[f32]) -> Vec<f32> {
    let n = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / n).collect()
}

#[test]
fn mmr_with_lambda_one_is_top_k() {
    let sims = [0.2, 0.9, 0.5, 0.9];
    let embs = vec![unit(&[1.0, 0.0]), unit(&[1.0, 1.0]), unit(&[0.0, 1.0]), unit(&[1.0, 1.0])];
    assert_eq!(mmr_select(&sims, &embs, 3, 1.0), vec![1, 3, 2]);
}

#[test]
fn mmr_prefers_a_distinct_candidate() {
    let sims = [0.9, 0.89, 0.5];
    let embs = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
    assert_eq!(mmr_select(&sims, &embs, 2, 0.5), vec![0, 2]);
}

#[test]
fn mmr_returns_min_k_n_distinct_items() {
    let sims: Vec<f32> = (0..10).map(|i| ((i * 7) % 10) as f32 / 10.0).collect();
    let embs: Vec<Vec<f32>> = (0..10).map(|i| unit(&[1.0 + i as f32, (10 - i) as f32, (i % 3) as f32])).collect();
    for k in [1, 4, 10, 25] {
        let picked = mmr_select(&sims, &embs, k, 0.6);
        assert_eq!(picked.len(), k.min(10));
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(unique.len(), picked.len());
    }
}

#[test]
fn context_respects_the_character_budget() {
    let long = "x".repeat(1000);
    let chunks = vec![hit(0, 0.9, &long), hit(1, 0.8, &long), hit(2, 0.7, "harmadik")];
    let context = assemble_context(&chunks, 300);
    assert_eq!(context.chars().count(), 1200);
    assert_eq!(context.matches("[Forrás:").count(), 2);
    assert!(!context.contains("harmadik"));
    assert!(context.starts_with("[Forrás: doc0.pdf; oldal: 1]\n"));
    assert!(context.contains(BLOCK_SEPARATOR));
}

#[test]
fn context_labels_page_ranges_and_handles_empty_input() {
    let mut ranged = hit(4, 0.5, "szöveg");
    ranged.record.page_start = Some(3);
    ranged.record.page_end = Some(5);
    let mut unpaged = hit(5, 0.4, "más");
    unpaged.record.page_start = None;
    unpaged.record.page_end = None;
    let context = assemble_context(&[ranged, unpaged], 1800);
    assert_eq!(
        context,
        format!("[Forrás: doc1.pdf; oldalak: 3–5]\nszöveg\n{BLOCK_SEPARATOR}[Forrás: doc2.pdf]\nmás\n")
    );
    assert_eq!(assemble_context(&[], 1800), NO_CONTEXT);
}

#[test]
fn sources_show_percentages_and_previews() {
    let text = "é".repeat(300);
    let sources = format_sources(&[hit(1, 0.8734, &text), hit(2, 0.05, "rövid")]);
    assert_eq!(sources[0].relevance, "87.3%");
    assert_eq!(sources[0].preview.chars().count(), 253);
    assert!(sources[0].preview.ends_with("é..."));
    assert_eq!(sources[0].pages.as_deref(), Some("1"));
    assert_eq!(sources[1].relevance, "5.0%");
    assert_eq!(sources[1].preview, "rövid...");
}

#[test]
fn relevance_is_rounded_from_the_widened_score() {
    // 0.0125f32 is slightly above 0.0125, which f32 arithmetic loses.
    let sources = format_sources(&[hit(1, 0.0125, "rövid")]);
    assert_eq!(sources[0].relevance, "1.3%");
}
