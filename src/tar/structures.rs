use byteorder::{BigEndian, ByteOrder};

/// Size of every header and content block in a tar container.
pub const BLOCK_SIZE: usize = 512;

/// Header field layout (byte ranges within a header block)
pub const NAME_RANGE: std::ops::Range<usize> = 0..100;
pub const SIZE_RANGE: std::ops::Range<usize> = 124..136;
pub const TYPE_FLAG_OFFSET: usize = 156;

/// GNU long-name record: the content is the name of the following entry
pub const GNU_LONG_NAME: u8 = b'L';
/// PAX extended header for the following entry
pub const PAX_EXTENDED: u8 = b'x';

/// Logical kind of an entry, derived from the type flag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    NonRegular(u8),
}

impl EntryKind {
    pub fn from_u8(flag: u8) -> Self {
        match flag {
            b'0' | 0 => EntryKind::Regular,
            other => EntryKind::NonRegular(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            EntryKind::Regular => b'0',
            EntryKind::NonRegular(v) => *v,
        }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, EntryKind::Regular)
    }
}

/// Parsed view over one 512-byte header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Why a header block could not be turned into an [`EntryHeader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStatus {
    /// All-zero block: end-of-archive marker
    EndOfArchive,
    /// Size field is neither octal nor base-256
    BadSize,
}

impl EntryHeader {
    /// Parse a header block.
    ///
    /// `block` must be exactly [`BLOCK_SIZE`] bytes.
    pub fn from_block(block: &[u8]) -> Result<Self, HeaderStatus> {
        debug_assert_eq!(block.len(), BLOCK_SIZE);

        if is_zero_block(block) {
            return Err(HeaderStatus::EndOfArchive);
        }

        let size = parse_size(&block[SIZE_RANGE]).ok_or(HeaderStatus::BadSize)?;

        Ok(Self {
            name: parse_name(&block[NAME_RANGE]),
            kind: EntryKind::from_u8(block[TYPE_FLAG_OFFSET]),
            size,
        })
    }

    /// Number of content bytes the entry occupies on disk, including padding
    pub fn padded_size(&self) -> u64 {
        self.size
            .div_ceil(BLOCK_SIZE as u64)
            .saturating_mul(BLOCK_SIZE as u64)
    }
}

pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Decode a NUL-terminated name field, stripping a leading `./`
pub fn parse_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let name = String::from_utf8_lossy(&field[..end]);
    match name.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => name.into_owned(),
    }
}

/// Decode the size field.
///
/// The common form is ASCII octal padded with NUL or space; an empty field
/// means zero. GNU writes sizes that do not fit in 11 octal digits as
/// big-endian binary with the high bit of the first byte set.
pub fn parse_size(field: &[u8]) -> Option<u64> {
    if field.first().is_some_and(|b| b & 0x80 != 0) {
        return parse_base256(field);
    }

    let text = std::str::from_utf8(field).ok()?;
    let trimmed = text.trim_matches(|c| c == '\0' || c == ' ');
    if trimmed.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(trimmed, 8).ok()
}

fn parse_base256(field: &[u8]) -> Option<u64> {
    // Only the low 8 bytes can be represented; anything above must be zero
    let split = field.len().checked_sub(8)?;
    let (high, low) = field.split_at(split);
    let high_clear = (high[0] & 0x7f) == 0 && high[1..].iter().all(|&b| b == 0);
    if !high_clear {
        return None;
    }
    Some(BigEndian::read_u64(low))
}

/// Pull the `path` record out of a PAX extended header body.
///
/// Records look like `"<len> <key>=<value>\n"`, where `<len>` counts the
/// whole record including itself.
pub fn pax_path(body: &[u8]) -> Option<String> {
    let mut rest = body;
    while !rest.is_empty() {
        let space = rest.iter().position(|&b| b == b' ')?;
        let len: usize = std::str::from_utf8(&rest[..space]).ok()?.parse().ok()?;
        if len <= space || len > rest.len() {
            return None;
        }
        let record = &rest[space + 1..len];
        let record = record.strip_suffix(b"\n").unwrap_or(record);
        if let Some(value) = record.strip_prefix(b"path=") {
            return Some(String::from_utf8_lossy(value).into_owned());
        }
        rest = &rest[len..];
    }
    None
}
