use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lexrag_cli::{build_system, init_tracing, load_settings};
use lexrag_llm::GroqClient;
use lexrag_core::types::ProgressEvent;

/// Question answering over a folder of legal PDFs.
#[derive(Parser)]
#[command(name = "lexrag", version, about)]
struct Cli {
    /// Directory holding config.toml (default: working directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every PDF in the documents folder
    Ingest,
    /// Copy PDFs into the documents folder and index them
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a question
    Query {
        question: String,
        /// Number of source chunks handed to the model
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show what is indexed
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Check the language model API key and endpoint
    Ping,
}

/// Print one ingestion event; returns `false` for a failed file.
fn report(event: &ProgressEvent) -> bool {
    match (&event.filename, &event.error) {
        (Some(name), None) => println!("📄 [{}/{}] {}", event.current, event.total, name),
        (Some(name), Some(err)) => {
            eprintln!("❌ [{}/{}] {}: {}", event.current, event.total, name, err);
            return false;
        }
        (None, Some(err)) => eprintln!("{err}"),
        (None, None) => {}
    }
    true
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = load_settings(cli.config_dir.as_deref())?;

    match cli.command {
        Command::Ping => {
            let client = GroqClient::new(&settings.llm)?;
            if client.ping() {
                println!("✅ Groq API reachable (model: {})", client.model());
            } else {
                eprintln!("❌ Groq API connection failed");
                std::process::exit(1);
            }
        }
        Command::Ingest => {
            let system = build_system(settings)?;
            // Rebuilds from the folder; the saved index is replaced on success.
            let failed = system.ingest_folder().filter(|e| !report(e)).count();
            let stats = system.stats();
            println!("✅ {} documents, {} chunks indexed ({} failed)", stats.documents, stats.chunks, failed);
        }
        Command::Add { files } => {
            let system = build_system(settings)?;
            system.load_index();
            let added = system.add_documents(&files);
            for name in &added.success {
                println!("✅ {name}");
            }
            for (name, err) in &added.errors {
                eprintln!("❌ {name}: {err}");
            }
            println!("📊 {} new chunks", added.total_chunks);
        }
        Command::Query { question, top_k, json } => {
            let system = build_system(settings)?;
            if let Some(progress) = system.initialize() {
                progress.for_each(|e| {
                    report(&e);
                });
            }
            let response = system.query(&question, top_k);
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}\n", response.answer);
                for (i, source) in response.sources.iter().enumerate() {
                    let pages = source.pages.as_deref().map(|p| format!(", oldal: {p}")).unwrap_or_default();
                    println!("[{}] {} ({}{})\n    {}", i + 1, source.document, source.relevance, pages, source.preview);
                }
            }
        }
        Command::Stats { json } => {
            let system = build_system(settings)?;
            system.load_index();
            let stats = system.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("{}", stats.status);
                println!("📚 {} documents, {} chunks", stats.documents, stats.chunks);
                for name in &stats.document_list {
                    println!("  - {name}");
                }
            }
        }
    }
    Ok(())
}
