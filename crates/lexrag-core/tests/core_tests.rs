use std::fs;

use lexrag_core::chunker::{chunk, Chunker, MIN_CHUNK_CHARS};
use lexrag_core::config::{Config, IndexBackendKind, PathSettings, Settings};
use lexrag_core::types::{ChunkRecord, NewChunk, PageSpan};
use tempfile::TempDir;

fn sample_law() -> String {
    let mut text = String::new();
    for article in 1..=12 {
        text.push_str(&format!("Art. {article} Dispoziții generale privind aplicarea legii.\n"));
        for line in 0..4 {
            text.push_str(&format!(
                "({line}) Prezenta lege reglementează raporturile juridice din domeniul {article}.\n"
            ));
        }
        text.push('\n');
    }
    text
}

#[test]
fn every_chunk_is_longer_than_the_minimum() {
    for (size, overlap) in [(200, 0), (300, 50), (1000, 200), (50, 500)] {
        for c in chunk(&sample_law(), size, overlap) {
            assert!(c.trim().chars().count() > MIN_CHUNK_CHARS, "short chunk: {c:?}");
        }
    }
}

#[test]
fn chunks_respect_size_limit() {
    let chunker = Chunker::new(300, 60);
    let chunks = chunker.chunk(&sample_law());
    assert!(chunks.len() > 3);
    for c in &chunks {
        assert!(c.chars().count() <= 300, "oversized chunk of {} chars", c.chars().count());
    }
}

#[test]
fn overflow_flush_seeds_the_next_chunk_with_the_tail() {
    let lines: Vec<String> = (0..40).map(|i| format!("line {i:02} with some filler words here")).collect();
    let text = lines.join("\n");
    let chunks = chunk(&text, 200, 30);
    assert!(chunks.len() >= 2);
    let first = &chunks[0];
    let second = &chunks[1];
    let tail: String = first.chars().skip(first.chars().count() - 20).collect();
    assert!(second.contains(&tail), "second chunk should start with the overlap tail");
}

#[test]
fn heading_closes_a_mostly_full_buffer() {
    let filler = "x".repeat(150);
    let text = format!("{filler}\nArt. 2 Al doilea articol are conținut suficient de lung pentru a fi păstrat.");
    let chunks = chunk(&text, 200, 0);
    assert_eq!(chunks.len(), 2);
    assert!(chunks[1].starts_with("Art. 2"));
}

#[test]
fn heading_does_not_close_a_small_buffer() {
    let text = "Bevezető rendelkezések, amelyek rövidek.\nArt. 1 Ez egy teszt törvény, amely néhány szót tartalmaz.";
    let chunks = chunk(text, 1000, 200);
    assert_eq!(chunks.len(), 1);
}

#[test]
fn empty_page_yields_no_chunks() {
    assert!(chunk("", 1000, 200).is_empty());
    assert!(chunk("   \n\n  ", 1000, 200).is_empty());
}

#[test]
fn sizes_are_clamped() {
    let chunker = Chunker::new(10, 400);
    assert_eq!(chunker.chunk_size(), 200);
    assert_eq!(chunker.overlap(), 100);
}

#[test]
fn pages_are_tagged_one_based() {
    let pages = vec![
        "Art. 1 Ez egy teszt törvény első oldala, elég hosszú szöveggel.".to_string(),
        String::new(),
        "Art. 3 A harmadik oldal szövege is elég hosszú ahhoz, hogy megmaradjon.".to_string(),
    ];
    let tagged = Chunker::default().chunk_pages(&pages);
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].1, PageSpan::single(1));
    assert_eq!(tagged[1].1, PageSpan::single(3));
    for (_, span) in &tagged {
        assert_eq!(span.page_start, span.page_end);
    }
}

#[test]
fn record_page_label_uses_en_dash_for_ranges() {
    let base = NewChunk {
        text: "t".into(),
        document_name: "a.pdf".into(),
        document_hash: "h".into(),
        chunk_index: 0,
        pages: Some(PageSpan::single(4)),
    };
    let single = ChunkRecord::from_new(0, base.clone());
    assert_eq!(single.pages().as_deref(), Some("4"));

    let range = ChunkRecord::from_new(1, NewChunk { pages: Some(PageSpan { page_start: 4, page_end: 6 }), ..base.clone() });
    assert_eq!(range.pages().as_deref(), Some("4–6"));

    let none = ChunkRecord::from_new(2, NewChunk { pages: None, ..base });
    assert_eq!(none.pages(), None);
    let json = serde_json::to_string(&none).expect("json");
    assert!(!json.contains("page_start"));
}

#[test]
fn config_defaults_and_file_override() {
    let tmp = TempDir::new().expect("tmp");
    let config = Config::load_from(tmp.path(), "test").expect("defaults load");
    let settings = config.settings().expect("settings");
    assert_eq!(
        settings,
        Settings { llm: settings.llm.clone(), embedding: settings.embedding.clone(), ..Settings::default() }
    );
    assert_eq!(settings.retrieval.top_k, 6);
    assert_eq!(settings.index.backend, IndexBackendKind::Auto);

    fs::write(
        tmp.path().join("config.toml"),
        "[retrieval]\ntop_k = 3\nenable_multiquery = true\n\n[index]\nbackend = \"dense\"\n",
    )
    .expect("write");
    let settings = Config::load_from(tmp.path(), "test").expect("load").settings().expect("settings");
    assert_eq!(settings.retrieval.top_k, 3);
    assert!(settings.retrieval.enable_multiquery);
    assert_eq!(settings.retrieval.retrieve_n, 40);
    assert_eq!(settings.index.backend, IndexBackendKind::Dense);
    let k: usize = Config::load_from(tmp.path(), "test").expect("load").get("retrieval.top_k").expect("key");
    assert_eq!(k, 3);
}

#[test]
fn invalid_lambda_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    fs::write(tmp.path().join("config.toml"), "[retrieval]\ndiversify_lambda = 1.5\n").expect("write");
    assert!(Config::load_from(tmp.path(), "test").is_err());
}

#[test]
fn env_vars_override_nested_keys() {
    let tmp = TempDir::new().expect("tmp");
    std::env::set_var("APP_EMBEDDING__HASH_DIM", "128");
    let settings = Config::load_from(tmp.path(), "test").expect("load").settings().expect("settings");
    std::env::remove_var("APP_EMBEDDING__HASH_DIM");
    assert_eq!(settings.embedding.hash_dim, 128);
    assert_eq!(settings.embedding.max_len, 128);
}

#[test]
fn relative_paths_follow_the_config_dir() {
    let tmp = TempDir::new().expect("tmp");
    let paths = PathSettings {
        documents_dir: "docs".into(),
        embeddings_dir: tmp.path().join("abs").to_string_lossy().into_owned(),
        ..PathSettings::default()
    };
    let resolved = paths.resolved_against(tmp.path());
    assert_eq!(resolved.documents(), tmp.path().join("docs"));
    assert_eq!(resolved.embeddings(), tmp.path().join("abs"));
    assert_eq!(resolved.metadata(), tmp.path().join("data/metadata"));
}
