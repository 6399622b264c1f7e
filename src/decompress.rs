//! Gzip decompression of stored artifacts.
//!
//! This is the only step of the pipeline that suspends: the stream is
//! drained on tokio's blocking pool and awaited once. Dropping the returned
//! future abandons the result; the blocking task has no side effects.

use flate2::read::MultiGzDecoder;
use std::io::Read;
use tracing::debug;

use crate::error::DecompressionError;

/// Gzip member header magic
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `data` starts like a gzip stream
pub fn is_compressed(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Largest container a stored object may expand to (1 GiB)
pub const MAX_DECOMPRESSED_SIZE: u64 = 1 << 30;

/// Decompress a gzip stream synchronously, capped at [`MAX_DECOMPRESSED_SIZE`].
pub fn decompress_blocking(data: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    decompress_limited(data, MAX_DECOMPRESSED_SIZE)
}

/// Decompress a gzip stream, failing once the output passes `limit` bytes.
pub fn decompress_limited(data: &[u8], limit: u64) -> Result<Vec<u8>, DecompressionError> {
    let mut decoder = MultiGzDecoder::new(data).take(limit.saturating_add(1));
    let capacity = (data.len() as u64).saturating_mul(4).min(limit);
    let mut out = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));
    decoder.read_to_end(&mut out)?;

    if out.len() as u64 > limit {
        return Err(DecompressionError::TooLarge {
            compressed: data.len(),
            limit,
        });
    }

    debug!(compressed = data.len(), decompressed = out.len(), "decompressed container");
    Ok(out)
}

/// Decompress a gzip stream on the blocking pool.
///
/// # Errors
///
/// Returns [`DecompressionError::InvalidStream`] when the input is not a
/// complete gzip stream.
pub async fn decompress(data: bytes::Bytes) -> Result<Vec<u8>, DecompressionError> {
    tokio::task::spawn_blocking(move || decompress_blocking(&data)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compression, write::GzEncoder};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_detects_gzip_magic() {
        assert!(is_compressed(&gzip(b"x")));
        assert!(!is_compressed(b"hello.txt\0\0"));
        assert!(!is_compressed(&[0x1f]));
    }

    #[tokio::test]
    async fn test_decompress_round_trip() {
        let payload = vec![42u8; 10_000];
        let out = decompress(gzip(&payload).into()).await.unwrap();
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_concatenated_members() {
        let mut data = gzip(b"first ");
        data.extend(gzip(b"second"));
        let out = decompress(data.into()).await.unwrap();
        assert_eq!(out, b"first second");
    }

    #[test]
    fn test_output_is_capped() {
        let data = gzip(&[0u8; 64 * 1024]);
        assert!(data.len() < 1024);

        let err = decompress_limited(&data, 4096).unwrap_err();
        assert!(matches!(err, DecompressionError::TooLarge { limit: 4096, .. }));
        assert_eq!(decompress_limited(&data, 64 * 1024).unwrap().len(), 64 * 1024);
    }

    #[tokio::test]
    async fn test_rejects_corrupt_stream() {
        let mut data = gzip(&[1u8; 4096]);
        data.truncate(data.len() / 2);
        let err = decompress(data.into()).await.unwrap_err();
        assert!(matches!(err, DecompressionError::InvalidStream(_)));

        let err = decompress(bytes::Bytes::from_static(b"not gzip at all")).await.unwrap_err();
        assert!(matches!(err, DecompressionError::InvalidStream(_)));
    }
}
