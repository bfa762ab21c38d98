use lexrag_core::config::EmbeddingSettings;
use lexrag_core::traits::Embedder;
use lexrag_embed::{get_default_embedder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_hash_embedder: true, hash_dim: 256, ..Default::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 256);

    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.encode(&texts, true).expect("encode");
    let v1 = &embs[0];
    let v2 = &embs[1];
    assert_eq!(v1.len(), 256);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_give_positive_similarity() {
    let embedder = HashEmbedder::new(384);
    let embs = embedder
        .encode(&["Art. 1 Ez egy teszt törvény.".to_string(), "teszt törvény".to_string()], true)
        .expect("encode");
    assert!(dot(&embs[0], &embs[1]) > 0.0);
}

#[test]
fn normalized_output_is_scaled_raw_output() {
    let embedder = HashEmbedder::new(64);
    let text = vec!["alpha beta gamma delta epsilon".to_string()];
    let raw = embedder.encode(&text, false).expect("raw");
    let unit = embedder.encode(&text, true).expect("unit");
    let raw_norm: f32 = raw[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!(raw_norm > 0.0);
    for (r, u) in raw[0].iter().zip(unit[0].iter()) {
        assert!((r / raw_norm - u).abs() < 1e-5);
    }
}

#[test]
fn empty_text_encodes_to_zero_vector() {
    let embedder = HashEmbedder::new(16);
    let out = embedder.encode(&["  ...  ".to_string()], true).expect("encode");
    assert!(out[0].iter().all(|x| *x == 0.0));
}
