//! # artifact-unpack
//!
//! Pulls named entries out of compressed build artifacts and recovers
//! structured data from them.
//!
//! A stored artifact is a gzip-compressed tar container. This library
//! fetches it from an object store, decompresses it, walks its 512-byte
//! header blocks to find one entry by name, and, when that entry should be
//! a JSON document, recovers the document even if archive metadata has
//! leaked into the bytes.
//!
//! ## Features
//!
//! - Lazy, allocation-free scanning of tar headers over a borrowed buffer
//! - Entry lookup by exact name or trailing path, with best-effort
//!   extraction from clipped containers
//! - JSON recovery as an ordered chain of strategies
//! - An axum endpoint serving stored objects and their entries
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use artifact_unpack::{ArtifactService, EntryLookup, LocalDirStore, recover};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = ArtifactService::new(Arc::new(LocalDirStore::new("./data/artifacts")));
//!
//!     if let EntryLookup::Found { data, .. } = service.read_entry("u1-site.tar.gz", "manifest.json").await? {
//!         let manifest = recover(&data)?;
//!         println!("{manifest}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod cli;
pub mod config;
pub mod decompress;
pub mod error;
pub mod io;
pub mod recovery;
pub mod server;
pub mod tar;

pub use artifact::{ArtifactService, EntryLookup};
pub use cli::Cli;
pub use config::ServerConfig;
pub use decompress::{decompress, is_compressed};
pub use error::{ArtifactError, DecompressionError, RecoveryError, StorageError};
pub use io::{HttpObjectStore, LocalDirStore, MemoryStore, ObjectStore, StoredObject, object_key};
pub use recovery::{Strategy, recover};
pub use crate::tar::{EntryHeader, EntryKind, Extracted, TarExtractor, TarScanner, extract, list_names};
