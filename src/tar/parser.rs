//! Block-level tar scanner.
//!
//! Walks a decompressed container one 512-byte header block at a time and
//! yields an [`ScannedEntry`] per header, in container order.
//!
//! ## Scanning Strategy
//!
//! 1. Read the block at the cursor; stop if fewer than 512 bytes remain
//! 2. Stop at the first all-zero block (end-of-archive marker)
//! 3. Parse name, type flag and size from their fixed offsets
//! 4. Advance past the header and the entry's padded content
//!
//! The scanner only borrows the container and keeps its position in a plain
//! cursor, so any number of scans can run over the same buffer at once.

use tracing::debug;

use super::structures::*;

/// One header found by the scanner, with the location of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub header: EntryHeader,
    /// Offset of the header block
    pub header_offset: usize,
    /// Offset of the first content byte (header block + 512)
    pub content_start: usize,
}

impl ScannedEntry {
    /// Content range as declared by the header, which may run past the
    /// end of a clipped container.
    pub fn declared_end(&self) -> u64 {
        (self.content_start as u64).saturating_add(self.header.size)
    }
}

/// Why a scan stopped producing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Still scanning
    Running,
    /// Hit an all-zero block
    EndOfArchive,
    /// Ran out of whole blocks without seeing an end marker
    BufferExhausted,
}

/// Lazy iterator over the headers of a container.
///
/// ## Example
///
/// ```ignore
/// for entry in TarScanner::new(&container) {
///     println!("{} ({} bytes)", entry.header.name, entry.header.size);
/// }
/// ```
pub struct TarScanner<'a> {
    /// The container being walked
    data: &'a [u8],
    /// Offset of the next header block
    pos: usize,
    /// Name carried over from a GNU long-name or PAX record
    pending_name: Option<String>,
    stop: ScanStop,
}

impl<'a> TarScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            pending_name: None,
            stop: ScanStop::Running,
        }
    }

    /// Reason the scan finished, or [`ScanStop::Running`] if it has not.
    pub fn stop_reason(&self) -> ScanStop {
        self.stop
    }

    /// Content of an entry clamped to the container, used for the small
    /// metadata records that rename the next entry.
    fn record_body(&self, content_start: usize, size: u64) -> &'a [u8] {
        let end = usize::try_from((content_start as u64).saturating_add(size))
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        &self.data[content_start.min(end)..end]
    }

    fn advance(&mut self, by: u64) {
        self.pos = usize::try_from((self.pos as u64).saturating_add(by)).unwrap_or(usize::MAX);
    }
}

impl Iterator for TarScanner<'_> {
    type Item = ScannedEntry;

    fn next(&mut self) -> Option<ScannedEntry> {
        loop {
            if self.stop != ScanStop::Running {
                return None;
            }

            let block_end = match self.pos.checked_add(BLOCK_SIZE) {
                Some(end) if end <= self.data.len() => end,
                _ => {
                    self.stop = ScanStop::BufferExhausted;
                    return None;
                }
            };
            let block = &self.data[self.pos..block_end];

            let mut header = match EntryHeader::from_block(block) {
                Ok(header) => header,
                Err(HeaderStatus::EndOfArchive) => {
                    self.stop = ScanStop::EndOfArchive;
                    return None;
                }
                Err(HeaderStatus::BadSize) => {
                    debug!(offset = self.pos, "skipping header with unparsable size");
                    // A carried-over name belonged to the skipped header
                    self.pending_name = None;
                    self.pos = block_end;
                    continue;
                }
            };

            let entry_offset = self.pos;
            let content_start = block_end;
            self.advance((BLOCK_SIZE as u64).saturating_add(header.padded_size()));

            // Long-name and PAX records rename the header that follows them
            match header.kind.as_u8() {
                GNU_LONG_NAME => {
                    let body = self.record_body(content_start, header.size);
                    self.pending_name = Some(parse_name(body));
                }
                PAX_EXTENDED => {
                    let body = self.record_body(content_start, header.size);
                    if let Some(path) = pax_path(body) {
                        self.pending_name = Some(path);
                    }
                }
                _ => {
                    if let Some(name) = self.pending_name.take() {
                        header.name = name.strip_prefix("./").map(str::to_string).unwrap_or(name);
                    }
                }
            }

            return Some(ScannedEntry {
                header,
                header_offset: entry_offset,
                content_start,
            });
        }
    }
}

/// Scan a container from offset 0.
pub fn scan(data: &[u8]) -> TarScanner<'_> {
    TarScanner::new(data)
}
