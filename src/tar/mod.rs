//! Tar container scanning and entry extraction.
//!
//! Works on a fully decompressed container held in memory. Nothing here
//! allocates a copy of the container or mutates it: extraction hands back
//! slices of the caller's buffer.
//!
//! ## Architecture
//!
//! - [`structures`]: header block layout and field decoding
//! - [`parser`]: the block scanner, a lazy iterator over headers
//! - [`extractor`]: name lookup, truncation policy and listing
//!
//! ## Container Format
//!
//! A container is a sequence of 512-byte blocks:
//! 1. A header block per entry (name, size, type flag at fixed offsets)
//! 2. The entry's content, padded with zeros to a block boundary
//! 3. One or more all-zero blocks marking the end of the archive
//!
//! ## Limitations
//!
//! - Only the classic name field, GNU long names and PAX `path` records are
//!   used for naming; the ustar prefix field is ignored
//! - No directory tree reconstruction; links are listed but never followed

pub mod extractor;
pub mod parser;
pub mod structures;

pub use extractor::{Extracted, TarExtractor, extract, list_names, name_matches};
pub use parser::{ScanStop, ScannedEntry, TarScanner, scan};
pub use structures::*;
