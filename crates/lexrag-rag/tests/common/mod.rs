#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lexrag_core::config::{IndexBackendKind, PathSettings, Settings};
use lexrag_core::traits::{Embedder, Generator, PageExtractor};
use lexrag_core::{Error, Result};
use lexrag_embed::HashEmbedder;
use lexrag_rag::context::TRANSLATE_PROMPT;
use lexrag_rag::RagSystem;

pub const ANSWER: &str = "Az 1. cikk szerint ez egy teszt törvény.";

pub struct StubExtractor {
    pages: HashMap<String, std::result::Result<Vec<String>, String>>,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self { pages: HashMap::new() }
    }

    pub fn with_pages(mut self, file: &str, pages: &[&str]) -> Self {
        self.pages.insert(file.to_string(), Ok(pages.iter().map(|p| p.to_string()).collect()));
        self
    }

    pub fn with_failure(mut self, file: &str, msg: &str) -> Self {
        self.pages.insert(file.to_string(), Err(msg.to_string()));
        self
    }
}

impl PageExtractor for StubExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        match self.pages.get(&name) {
            Some(Ok(pages)) => Ok(pages.clone()),
            Some(Err(msg)) => Err(Error::Extraction(msg.clone())),
            None => Err(Error::Extraction(format!("unknown file {name}"))),
        }
    }
}

/// Hashing embedder that counts calls.
pub struct CountingEmbedder {
    inner: HashEmbedder,
    pub calls: Arc<AtomicUsize>,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self { inner: HashEmbedder::new(384), calls: Arc::new(AtomicUsize::new(0)) }
    }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn encode(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.encode(texts, normalize)
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum Translation {
    Returns(&'static str),
    Fails,
}

/// Records every (system, user) prompt pair it receives.
pub struct StubGenerator {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    translation: Translation,
    fail_answer: bool,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self { calls: Arc::new(Mutex::new(Vec::new())), translation: Translation::Fails, fail_answer: false }
    }

    pub fn translating(mut self, t: Translation) -> Self {
        self.translation = t;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_answer = true;
        self
    }
}

impl Generator for StubGenerator {
    fn complete(&self, system_prompt: &str, user_prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push((system_prompt.to_string(), user_prompt.to_string()));
        if system_prompt == TRANSLATE_PROMPT {
            return match self.translation {
                Translation::Returns(t) => Ok(t.to_string()),
                Translation::Fails => Err(Error::Generation("rate limited".into())),
            };
        }
        if self.fail_answer {
            return Err(Error::Generation("401 Unauthorized".into()));
        }
        Ok(ANSWER.to_string())
    }
}

pub fn settings(root: &Path) -> Settings {
    let mut s = Settings::default();
    s.paths = PathSettings::rooted_at(root);
    s.index.backend = IndexBackendKind::Dense;
    s
}

pub fn docs_dir(settings: &Settings) -> PathBuf {
    settings.paths.documents()
}

/// Create placeholder files; the stub extractor supplies their text.
pub fn touch_pdfs(settings: &Settings, names: &[&str]) {
    let dir = docs_dir(settings);
    std::fs::create_dir_all(&dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), format!("%PDF-1.4 {name}")).unwrap();
    }
}

pub struct Harness {
    pub system: RagSystem,
    pub embed_calls: Arc<AtomicUsize>,
    pub gen_calls: Arc<Mutex<Vec<(String, String)>>>,
}

pub fn build(settings: Settings, extractor: StubExtractor, generator: StubGenerator) -> Harness {
    let embedder = CountingEmbedder::new();
    let embed_calls = embedder.calls.clone();
    let gen_calls = generator.calls.clone();
    let system = RagSystem::new(settings, Box::new(embedder), Box::new(generator), Box::new(extractor)).unwrap();
    Harness { system, embed_calls, gen_calls }
}
