use std::fs;

use lexrag_cli::load_settings;
use tempfile::TempDir;

#[test]
fn data_paths_are_anchored_at_the_config_dir() {
    let tmp = TempDir::new().expect("tmp");
    let elsewhere = tmp.path().join("elsewhere");
    fs::write(
        tmp.path().join("config.toml"),
        format!(
            "[paths]\ndocuments_dir = \"pdfs\"\nchunks_dir = {:?}\n",
            elsewhere.to_string_lossy()
        ),
    )
    .expect("write config");

    let settings = load_settings(Some(tmp.path())).expect("settings");
    assert_eq!(settings.paths.documents(), tmp.path().join("pdfs"));
    assert_eq!(settings.paths.chunks(), elsewhere);
    assert_eq!(settings.paths.embeddings(), tmp.path().join("data/embeddings"));
}
