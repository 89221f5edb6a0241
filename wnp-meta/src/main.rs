//! wnp-meta - run the enrichment pipeline on one file
//!
//! Prints the resulting record as JSON. Cover bytes are replaced by a size note.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use wnp_common::config::{resolve_config_path, CONFIG_ENV_VAR};
use wnp_common::logging::init_tracing;
use wnp_common::Settings;
use wnp_meta::{fields, Metadata, MetadataProcessors, MetadataValue};

/// Command-line arguments for wnp-meta
#[derive(Parser, Debug)]
#[command(name = "wnp-meta")]
#[command(about = "Enrich an audio file's metadata")]
#[command(version)]
struct Args {
    /// Audio file to process
    file: PathBuf,

    /// Settings file (TOML)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let settings = Settings::load_or_default(config_path.as_deref());
    init_tracing(&settings.logging()).context("Failed to initialize logging")?;

    info!(file = %args.file.display(), "Processing");

    let processors = MetadataProcessors::from_settings(Arc::new(settings));
    let mut metadata = processors.process(Metadata::for_file(&args.file)).await;

    if let Some(MetadataValue::Bytes(cover)) = metadata.remove(fields::COVERIMAGERAW) {
        metadata.insert(
            fields::COVERIMAGERAW,
            format!("<{} bytes of image data>", cover.len()),
        );
    }

    let json = serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    println!("{}", json);
    Ok(())
}
