use lexrag_core::types::{SearchResult, SourceView};

pub const PREVIEW_CHARS: usize = 250;

/// User-facing view of each selected chunk: relevance as a percentage with
/// one decimal and the first 250 characters of text followed by `...`.
pub fn format_sources(results: &[SearchResult]) -> Vec<SourceView> {
    results
        .iter()
        .map(|r| {
            let mut preview: String = r.record.text.chars().take(PREVIEW_CHARS).collect();
            preview.push_str("...");
            SourceView {
                document: r.record.document_name.clone(),
                relevance: format!("{:.1}%", f64::from(r.similarity_score) * 100.0),
                preview,
                pages: r.record.pages(),
            }
        })
        .collect()
}
