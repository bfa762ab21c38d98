//! Shared start-up for the command-line binaries.

use std::path::Path;

use anyhow::Context;
use lexrag_core::config::{Config, Settings};
use lexrag_embed::get_default_embedder;
use lexrag_llm::GroqClient;
use lexrag_pdf::PdfExtractor;
use lexrag_rag::RagSystem;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Load settings from `config_dir` (or the working directory).
///
/// With an explicit `config_dir`, relative data paths are taken relative to it.
pub fn load_settings(config_dir: Option<&Path>) -> anyhow::Result<Settings> {
    let Some(dir) = config_dir else {
        let config = Config::load().context("loading configuration")?;
        return Ok(config.settings()?);
    };
    let env_name = std::env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = Config::load_from(dir, &env_name).context("loading configuration")?;
    let mut settings = config.settings()?;
    settings.paths = settings.paths.resolved_against(dir);
    Ok(settings)
}

pub fn build_system(settings: Settings) -> anyhow::Result<RagSystem> {
    let embedder = get_default_embedder(&settings.embedding).context("loading the embedding model")?;
    let generator = GroqClient::new(&settings.llm)?;
    let system = RagSystem::new(settings, embedder, Box::new(generator), Box::new(PdfExtractor::new()))?;
    Ok(system)
}
