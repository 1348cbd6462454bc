mod cli;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use salonsim_core::{Catalog, RunConfig};

fn main() -> Result<()> {
    let config = load_run_config()?;
    let catalog = load_catalog()?;
    cli::run(&catalog, config)
}

fn load_run_config() -> Result<RunConfig> {
    let Some(path) = find_config_file("simulation.json") else {
        return Ok(RunConfig::default());
    };
    let file = File::open(&path)
        .with_context(|| format!("実行設定ファイルを開けません: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("実行設定ファイルの解析に失敗しました: {}", path.display()))
}

fn load_catalog() -> Result<Catalog> {
    for dir in candidate_paths("catalog") {
        if dir.is_dir() {
            return Catalog::load_from_dir(&dir)
                .with_context(|| format!("カタログの読み込みに失敗しました: {}", dir.display()));
        }
    }
    Catalog::from_embedded()
}

fn find_config_file(name: &str) -> Option<PathBuf> {
    candidate_paths(name).into_iter().find(|path| path.is_file())
}

fn candidate_paths(name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config").join(name));
    }
    candidates.push(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("config")
            .join(name),
    );
    candidates
}
