//! Init command - initializes Heron configuration in a project

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use heron_core::config::CONFIG_FILENAME;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Heron configuration file
# See https://github.com/heron-a11y/heron for documentation

# File patterns to include in analysis
# include = ["site/", "src/"]

# File patterns to exclude from analysis
# exclude = ["dist/", "vendor/"]

# Rule configuration
[rules]
# Disable specific rules
# disabled = ["A004"]

# Drop issues below a confidence level (high, medium, low)
# min_confidence = "medium"

# Override rule severity
# [rules.severity]
# A005 = "warning"

[project]
# File-count ceiling for discovery
# max_files = 2000
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
