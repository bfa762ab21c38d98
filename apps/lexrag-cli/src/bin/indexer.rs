use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lexrag_cli::{build_system, init_tracing, load_settings};
use lexrag_rag::list_pdfs;

/// Build the index from every PDF in the documents folder.
#[derive(Parser)]
#[command(name = "lexrag-indexer", version, about)]
struct Cli {
    /// Documents folder (default: paths.documents_dir from config)
    data_dir: Option<PathBuf>,

    #[arg(long)]
    config_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut settings = load_settings(cli.config_dir.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        settings.paths.documents_dir = dir.to_string_lossy().into_owned();
    }
    let data_dir = settings.paths.documents();
    println!("Legal document indexer\n======================");
    println!("Data directory: {}", data_dir.display());

    let system = build_system(settings)?;
    let files = list_pdfs(&data_dir);
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    println!("Vector backend: {}", system.store().backend_name());
    let mut errors = Vec::new();
    let mut progress = system.ingest_files(files);
    for event in progress.by_ref() {
        match (event.filename, event.error) {
            (Some(name), None) => pb.set_message(name),
            (Some(name), Some(err)) => {
                pb.println(format!("❌ {name}: {err}"));
                errors.push(name);
            }
            (None, Some(err)) => pb.println(err),
            (None, None) => {}
        }
        pb.set_position(event.current as u64);
    }
    pb.finish_and_clear();
    let (succeeded, total, added) = (progress.succeeded(), progress.total(), progress.chunks_added());
    drop(progress);

    let stats = system.stats();
    println!("\n✅ Indexing completed: {succeeded}/{total} files, {added} new chunks");
    println!("   Index now holds {} documents, {} chunks", stats.documents, stats.chunks);
    if !errors.is_empty() {
        println!("⚠️  {} files failed: {}", errors.len(), errors.join(", "));
    }
    println!("\n💡 To ask a question, use: cargo run --bin lexrag -- query '<question>'");
    Ok(())
}
