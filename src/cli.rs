use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::DiscoveryConfig;
use crate::model::ToolType;

#[derive(Parser, Debug)]
#[command(name = "ufto-discovery")]
#[command(about = "Discover UFT One tests in a git working tree and report what changed since the last sync", long_about = None)]
pub struct Args {
    /// Path to the git working tree to scan
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Discovery config file (JSON or YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tool type; overrides the config file (mbt enables action discovery)
    #[arg(short, long, value_enum)]
    pub tool_type: Option<ToolType>,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'O', long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Do not update the synced commit marker after a successful run
    #[arg(long)]
    pub no_record: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.path)?;
        if !self.path.is_dir() {
            anyhow::bail!("Path is not a directory: {}", self.path.display());
        }
        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                anyhow::bail!("Config file does not exist: {}", config_path.display());
            }
        }
        Ok(())
    }

    /// Config from `--config` (or defaults) with command line overrides applied.
    pub fn discovery_config(&self) -> Result<DiscoveryConfig> {
        let config = match &self.config {
            Some(path) => DiscoveryConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => DiscoveryConfig::default(),
        };
        Ok(match self.tool_type {
            Some(tool_type) => config.with_tool_type(tool_type),
            None => config,
        })
    }
}

pub fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        std::fs::metadata(path).with_context(|| format!("Cannot read file: {}", path.display()))?;
    } else if path.is_dir() {
        std::fs::read_dir(path)
            .with_context(|| format!("Cannot read directory: {}", path.display()))?;
    } else {
        anyhow::bail!("Path is neither a file nor a directory: {}", path.display());
    }

    Ok(())
}
