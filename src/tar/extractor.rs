use tracing::{debug, warn};

use super::parser::{ScanStop, ScannedEntry, TarScanner};

/// Bytes of an extracted entry.
///
/// `Truncated` is returned when the header declares more content than the
/// container holds; the slice then runs to the end of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extracted<'a> {
    Complete(&'a [u8]),
    Truncated { data: &'a [u8], declared_size: u64 },
}

impl<'a> Extracted<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        match *self {
            Extracted::Complete(data) => data,
            Extracted::Truncated { data, .. } => data,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Extracted::Truncated { .. })
    }
}

/// Tar entry extractor over an in-memory container
pub struct TarExtractor<'a> {
    data: &'a [u8],
}

impl<'a> TarExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// List the name of every entry, in container order
    pub fn list_names(&self) -> Vec<String> {
        TarScanner::new(self.data).map(|e| e.header.name).collect()
    }

    /// List every scanned entry with its offsets
    pub fn list_entries(&self) -> Vec<ScannedEntry> {
        TarScanner::new(self.data).collect()
    }

    /// Find the first regular entry named `target` and return its content.
    ///
    /// An entry matches when its name equals `target` or ends with
    /// `"/" + target`. Returns `None` when nothing matches.
    pub fn extract(&self, target: &str) -> Option<Extracted<'a>> {
        let mut scanner = TarScanner::new(self.data);

        let Some(entry) = scanner
            .by_ref()
            .find(|e| e.header.kind.is_regular() && name_matches(&e.header.name, target))
        else {
            let stop = scanner.stop_reason();
            debug!(target_name = %target, end_of_archive = (stop == ScanStop::EndOfArchive), "entry not found");
            return None;
        };

        Some(self.slice_content(&entry))
    }

    fn slice_content(&self, entry: &ScannedEntry) -> Extracted<'a> {
        let start = entry.content_start;
        let declared_end = entry.declared_end();

        if declared_end > self.data.len() as u64 {
            let data = &self.data[start.min(self.data.len())..];
            warn!(
                name = %entry.header.name,
                declared_size = entry.header.size,
                available = data.len(),
                "archive truncated, returning partial entry"
            );
            return Extracted::Truncated {
                data,
                declared_size: entry.header.size,
            };
        }

        // declared_end fits in the buffer, so it fits in usize
        Extracted::Complete(&self.data[start..declared_end as usize])
    }
}

/// Exact name or a `/`-separated suffix of it
pub fn name_matches(name: &str, target: &str) -> bool {
    if name == target {
        return true;
    }
    name.strip_suffix(target)
        .is_some_and(|prefix| prefix.ends_with('/'))
}

/// Extract `target` from `container`
pub fn extract<'a>(container: &'a [u8], target: &str) -> Option<Extracted<'a>> {
    TarExtractor::new(container).extract(target)
}

/// List all entry names in `container`
pub fn list_names(container: &[u8]) -> Vec<String> {
    TarExtractor::new(container).list_names()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tar::parser::tests::{finish, header_block, push_entry};

    #[test]
    fn test_hello_scenario() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "hello.txt", b"hi");
        finish(&mut tar);

        assert_eq!(extract(&tar, "hello.txt"), Some(Extracted::Complete(b"hi")));
    }

    #[test]
    fn test_round_trip_many_entries() {
        let files: Vec<(String, Vec<u8>)> = (0..5)
            .map(|i| (format!("dir/file{i}.bin"), vec![i as u8; i * 300]))
            .collect();
        let mut tar = Vec::new();
        for (name, content) in &files {
            push_entry(&mut tar, name, content);
        }
        finish(&mut tar);

        let names: Vec<_> = files.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(list_names(&tar), names);
        for (name, content) in &files {
            let got = extract(&tar, name).unwrap();
            assert_eq!(got.bytes(), content.as_slice());
            assert!(!got.is_truncated());
        }
    }

    #[test]
    fn test_suffix_match() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "folder/hello.txt", b"nested");
        finish(&mut tar);

        assert_eq!(extract(&tar, "hello.txt").unwrap().bytes(), b"nested");
        // Suffix must sit on a path boundary
        assert_eq!(extract(&tar, "lo.txt"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "a/config.json", b"first");
        push_entry(&mut tar, "config.json", b"second");
        finish(&mut tar);

        assert_eq!(extract(&tar, "config.json").unwrap().bytes(), b"first");
    }

    #[test]
    fn test_missing_entry() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "a.txt", b"a");
        finish(&mut tar);

        assert_eq!(extract(&tar, "b.txt"), None);
        assert_eq!(extract(&[], "b.txt"), None);
    }

    #[test]
    fn test_empty_entry_is_found() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "empty", b"");
        finish(&mut tar);

        assert_eq!(extract(&tar, "empty"), Some(Extracted::Complete(&[])));
    }

    #[test]
    fn test_truncated_entry() {
        let mut tar = Vec::new();
        push_entry(&mut tar, "big.bin", &[9u8; 2000]);
        tar.truncate(512 + 700);

        let got = extract(&tar, "big.bin").unwrap();
        assert_eq!(
            got,
            Extracted::Truncated {
                data: &[9u8; 700],
                declared_size: 2000
            }
        );
    }

    #[test]
    fn test_directories_are_not_extracted() {
        let mut tar = header_block("hello.txt", b'5', b"00000000000\0");
        push_entry(&mut tar, "hello.txt", b"file");
        finish(&mut tar);

        assert_eq!(list_names(&tar), vec!["hello.txt", "hello.txt"]);
        assert_eq!(extract(&tar, "hello.txt").unwrap().bytes(), b"file");
    }
}
