use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use std::fs;
use ufto_discovery::changeset::GitCli;
use ufto_discovery::cli;
use ufto_discovery::discovery::{self, Discovery};
use ufto_discovery::logging::{self, Verbosity};
use ufto_discovery::sync_marker::FileSyncMarker;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    let config = args.discovery_config()?;
    let marker = FileSyncMarker::new(args.path.join(&config.marker_file));
    let store = GitCli::new(&args.path);

    let result = Discovery::new(config)
        .run(&args.path, &store, &marker)
        .with_context(|| format!("Discovery failed for {}", args.path.display()))?;

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    match &args.output_file {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write output: {}", path.display()))?,
        None => println!("{json}"),
    }

    if !args.no_record {
        discovery::record_synced(&result, &marker).with_context(|| {
            format!("Failed to record synced commit to {}", marker.path().display())
        })?;
    }

    Ok(())
}
