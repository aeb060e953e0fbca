//! Check command - analyzes JavaScript/TypeScript files for dead functions

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use walkdir::WalkDir;

use shaker_core::analysis::AnalysisEngine;
use shaker_core::config::{self, Config};
use shaker_core::diagnostic::Diagnostic;
use shaker_core::parser::ParsedFile;

use crate::output::{json::JsonFormatter, pretty::PrettyFormatter};

const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format for diagnostics (text or json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Reachability root binding names (overrides shaker.toml)
    #[arg(long = "root", value_name = "NAME")]
    pub root: Vec<String>,

    /// Exit with code 1 when dead functions are found
    #[arg(long)]
    pub fail_on_dead: bool,
}

impl CheckArgs {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;
        if !self.root.is_empty() {
            config.roots.entries = self.root.clone();
        }

        let engine = AnalysisEngine::with_config(config);
        let files = collect_source_files(&self.path, engine.config())?;
        tracing::debug!(count = files.len(), "collected source files");

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        for path in &files {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file = ParsedFile::from_source(&path.to_string_lossy(), &source);
            diagnostics.extend(engine.analyze(&file));
        }

        match self.format.as_str() {
            "json" => {
                let formatter = JsonFormatter::new(files.len());
                println!("{}", formatter.format(&diagnostics)?);
            }
            _ => {
                let formatter = PrettyFormatter::new();
                print!("{}", formatter.format(&diagnostics, files.len()));
            }
        }

        if self.fail_on_dead && !diagnostics.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let start = if self.path.is_dir() {
            self.path.clone()
        } else {
            self.path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };

        let Some(config_path) = config::find_config_file(&start) else {
            return Ok(Config::default());
        };

        let result = config::load_config(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        for warning in &result.warnings {
            tracing::warn!("{warning}");
        }
        Ok(result.config)
    }
}

fn collect_source_files(path: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let entry_path = entry.path();
        if !has_source_extension(entry_path) {
            continue;
        }
        if is_excluded(entry_path, config) {
            continue;
        }
        files.push(entry_path.to_path_buf());
    }
    Ok(files)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, config: &Config) -> bool {
    let path_str = path.to_string_lossy();
    if config
        .exclude
        .iter()
        .any(|pattern| path_str.contains(pattern.as_str()))
    {
        return true;
    }
    if !config.include.is_empty() {
        return !config
            .include
            .iter()
            .any(|pattern| path_str.contains(pattern.as_str()));
    }
    false
}
