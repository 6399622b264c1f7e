use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "artifact-unpack")]
#[command(version)]
#[command(about = "Serve build artifacts and pull named entries out of them", long_about = None)]
#[command(after_help = "Examples:\n  \
  artifact-unpack serve --store-dir ./data/artifacts     serve artifacts from a directory\n  \
  artifact-unpack list build.tar.gz                      list entries of a local artifact\n  \
  artifact-unpack extract build.tar.gz manifest.json --json   print a recovered JSON entry")]
pub struct Cli {
    /// Log filter, e.g. `info` or `artifact_unpack=debug` (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP artifact endpoint
    Serve(ServeArgs),

    /// List entry names of a local container (gzip or plain tar)
    List {
        /// Container file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Show type flag, size and offset for each entry
        #[arg(short = 'v')]
        verbose: bool,
    },

    /// Extract one entry from a local container
    Extract {
        /// Container file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Entry name, or a trailing path of it
        #[arg(value_name = "ENTRY")]
        entry: String,

        /// Write to this file instead of stdout
        #[arg(short = 'd', value_name = "OUT")]
        output: Option<PathBuf>,

        /// Recover the entry as JSON and pretty-print it
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "ARTIFACT_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Directory holding stored objects
    #[arg(long, env = "ARTIFACT_STORE_DIR", conflicts_with = "store_url")]
    pub store_dir: Option<PathBuf>,

    /// Base URL of an HTTP object store
    #[arg(long, env = "ARTIFACT_STORE_URL")]
    pub store_url: Option<String>,

    /// Extension appended to download names that lack it
    #[arg(long, env = "ARTIFACT_DEFAULT_EXTENSION", default_value = "tar.gz")]
    pub default_extension: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from(["artifact-unpack", "extract", "a.tgz", "x.json", "--json"]).unwrap();
        match cli.command {
            Command::Extract { entry, json, output, .. } => {
                assert_eq!(entry, "x.json");
                assert!(json);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_store_flags_conflict() {
        let res = Cli::try_parse_from([
            "artifact-unpack",
            "serve",
            "--store-dir",
            "/tmp",
            "--store-url",
            "http://localhost",
        ]);
        assert!(res.is_err());
    }
}
