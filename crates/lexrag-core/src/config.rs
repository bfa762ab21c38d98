//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates nesting, e.g.
//! `APP_RETRIEVAL__TOP_K=8`). `GROQ_API_KEY` is honoured as `llm.api_key`.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load with `config.toml` and `config.<env>.toml` looked up in `dir`.
    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment
            .merge(Env::raw().only(&["GROQ_API_KEY"]).map(|_| "llm.api_key".into()))
            .merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let lambda = self.retrieval.diversify_lambda;
        if !(0.0..=1.0).contains(&lambda) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.diversify_lambda must be within [0, 1], got {lambda}"
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Create every working directory named in `paths`.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in self.paths.all() {
            std::fs::create_dir_all(expand_path(dir))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub documents_dir: String,
    pub embeddings_dir: String,
    pub chunks_dir: String,
    pub metadata_dir: String,
}

impl PathSettings {
    fn all(&self) -> [&str; 4] {
        [&self.documents_dir, &self.embeddings_dir, &self.chunks_dir, &self.metadata_dir]
    }

    pub fn documents(&self) -> PathBuf { expand_path(&self.documents_dir) }
    pub fn embeddings(&self) -> PathBuf { expand_path(&self.embeddings_dir) }
    pub fn chunks(&self) -> PathBuf { expand_path(&self.chunks_dir) }
    pub fn metadata(&self) -> PathBuf { expand_path(&self.metadata_dir) }

    /// Relative directories re-anchored at `base` (absolute ones are kept).
    pub fn resolved_against(&self, base: &Path) -> Self {
        let r = |p: &str| resolve_with_base(base, p).to_string_lossy().into_owned();
        Self {
            documents_dir: r(&self.documents_dir),
            embeddings_dir: r(&self.embeddings_dir),
            chunks_dir: r(&self.chunks_dir),
            metadata_dir: r(&self.metadata_dir),
        }
    }

    /// All four directories placed under `root`; handy for tests and sandboxes.
    pub fn rooted_at(root: &Path) -> Self {
        let s = |p: &str| root.join(p).to_string_lossy().to_string();
        Self {
            documents_dir: s("documents/uploaded"),
            embeddings_dir: s("data/embeddings"),
            chunks_dir: s("data/chunks"),
            metadata_dir: s("data/metadata"),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            documents_dir: "documents/uploaded".into(),
            embeddings_dir: "data/embeddings".into(),
            chunks_dir: "data/chunks".into(),
            metadata_dir: "data/metadata".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub retrieve_n: usize,
    pub enable_multiquery: bool,
    pub enable_diversify: bool,
    pub diversify_lambda: f32,
    pub context_token_budget: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            retrieve_n: 40,
            enable_multiquery: false,
            enable_diversify: true,
            diversify_lambda: 0.6,
            context_token_budget: 1800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "openai/gpt-oss-120b".into(),
            base_url: "https://api.groq.com/openai/v1".into(),
            api_key: None,
            max_tokens: 2048,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    pub use_hash_embedder: bool,
    pub hash_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".into(),
            model_dir: None,
            max_len: 128,
            batch_size: 32,
            use_hash_embedder: false,
            hash_dim: 384,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackendKind {
    /// Tensor index when it is compiled in and a device is available, else dense.
    #[default]
    Auto,
    Flat,
    Dense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub name: String,
    pub backend: IndexBackendKind,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { name: "legal_docs_index".into(), backend: IndexBackendKind::Auto }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Expand `p` and, when it is still relative, join it onto `base`.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
