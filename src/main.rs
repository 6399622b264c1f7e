//! Main entry point for the artifact-unpack CLI application.
//!
//! `serve` runs the HTTP artifact endpoint; `list` and `extract` run the
//! same extraction pipeline against a local container file.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use artifact_unpack::cli::Command;
use artifact_unpack::server;
use artifact_unpack::tar::TarExtractor;
use artifact_unpack::{ArtifactService, Cli, ServerConfig, recover};

/// Application entry point.
///
/// Installs the log subscriber, then dispatches on the subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig::from_args(&args)?;
            let service = ArtifactService::new(config.build_store()?);
            server::serve(&config, service).await
        }
        Command::List { file, verbose } => list_entries(&file, verbose).await,
        Command::Extract {
            file,
            entry,
            output,
            json,
        } => extract_entry(&file, &entry, output.as_deref(), json).await,
    }
}

/// Read a local file and return its container bytes, decompressing gzip.
async fn load_container(path: &Path) -> Result<bytes::Bytes> {
    let data = tokio::fs::read(path).await?;
    Ok(artifact_unpack::artifact::open_container(data.into()).await?)
}

/// Print the entries of a local container.
///
/// Verbose output adds the type flag, declared size and header offset.
async fn list_entries(path: &Path, verbose: bool) -> Result<()> {
    let container = load_container(path).await?;
    let extractor = TarExtractor::new(&container);

    if !verbose {
        for name in extractor.list_names() {
            println!("{name}");
        }
        return Ok(());
    }

    println!("{:>4}  {:>10}  {:>10}  Name", "Type", "Size", "Offset");
    println!("{}", "-".repeat(50));
    for entry in extractor.list_entries() {
        println!(
            "{:>4}  {:>10}  {:>10}  {}",
            char::from(entry.header.kind.as_u8()),
            entry.header.size,
            entry.header_offset,
            entry.header.name
        );
    }
    Ok(())
}

/// Extract one entry to stdout or a file, optionally as recovered JSON.
async fn extract_entry(path: &Path, entry: &str, output: Option<&Path>, json: bool) -> Result<()> {
    let container = load_container(path).await?;

    let Some(extracted) = TarExtractor::new(&container).extract(entry) else {
        bail!("Entry not found: {entry}");
    };

    let data = if json {
        let value = recover(extracted.bytes())?;
        let mut text = serde_json::to_vec_pretty(&value)?;
        text.push(b'\n');
        text
    } else {
        extracted.bytes().to_vec()
    };

    match output {
        Some(out) => {
            if let Some(parent) = out.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(out, &data).await?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
