//! Init command - initializes Shaker configuration in a project

use std::fs;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use shaker_core::config::CONFIG_FILENAME;

const DEFAULT_CONFIG: &str = r#"# Shaker configuration file

# Path fragments to include in analysis (everything when empty)
# include = ["src"]

# Path fragments to exclude from analysis
# exclude = ["node_modules", "dist"]

[roots]
# Binding names treated as reachability roots. When empty, exported names
# are used, and failing that every top-level binding.
# entries = ["main"]

[analysis]
# Connect `var x = init` initializer values into the variable node.
var_init_flow = true
"#;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<()> {
        self.run_in(Path::new("."))
    }

    fn run_in(&self, dir: &Path) -> Result<()> {
        let config_path = dir.join(CONFIG_FILENAME);

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Config file '{}' already exists. Use --force to overwrite.",
                CONFIG_FILENAME
            );
        }

        fs::write(&config_path, DEFAULT_CONFIG)?;
        println!(
            "{} Created {} configuration file",
            "✓".green().bold(),
            CONFIG_FILENAME.cyan()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_config_file() {
        let dir = tempdir().unwrap();

        let args = InitArgs { force: false };
        let result = args.run_in(dir.path());

        assert!(result.is_ok());
        assert!(dir.path().join(CONFIG_FILENAME).exists());
    }

    #[test]
    fn init_fails_if_config_exists_without_force() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "existing").unwrap();

        let args = InitArgs { force: false };
        let result = args.run_in(dir.path());

        assert!(result.is_err());
        let content = fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(content, "existing");
    }

    #[test]
    fn init_with_force_overwrites_existing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "existing").unwrap();

        let args = InitArgs { force: true };
        let result = args.run_in(dir.path());

        assert!(result.is_ok());
        let content = fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(content.contains("[analysis]"));
    }

    #[test]
    fn default_config_is_valid_toml() {
        let config: Result<toml::Table, _> = DEFAULT_CONFIG.parse();
        assert!(config.is_ok());
    }
}
