//! Payload compression and the packed envelope.
//!
//! Encoded commands and saved sessions are plain text or bytes that can
//! get large (a full snapshot of a big module). Before they go on the
//! wire or to disk they are wrapped in an envelope: a two-byte magic
//! saying whether the body is compressed, then the body.
//!
//! ```text
//! Z T <zstd frame>      compressed
//! R T <raw bytes>       stored as-is
//! ```
//!
//! Small payloads are stored raw; compressing them costs more than it
//! saves. The threshold comes from [`CompressionConfig`].
//!
//! ## Usage
//!
//! ```
//! use rust_tabletop::compression::{pack, unpack};
//! use rust_tabletop::core::CompressionConfig;
//!
//! let payload = b"add/1/0/piece;1;Tank;board;0;0;;0".repeat(40);
//! let packed = pack(&payload, &CompressionConfig::default()).unwrap();
//! assert!(packed.len() < payload.len());
//! assert_eq!(unpack(&packed).unwrap(), payload);
//! ```

use thiserror::Error;
use tracing::debug;

use crate::core::CompressionConfig;

/// Magic for a compressed body.
pub const MAGIC_COMPRESSED: [u8; 2] = *b"ZT";

/// Magic for a raw body.
pub const MAGIC_RAW: [u8; 2] = *b"RT";

/// Errors raised by compression and envelope handling.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("compression failed")]
    Compress(#[source] std::io::Error),

    #[error("compressed payload is corrupt")]
    Corrupt(#[source] std::io::Error),

    #[error("payload too short for an envelope ({0} bytes)")]
    Truncated(usize),

    #[error("unknown envelope magic {0:02x?}")]
    UnknownMagic([u8; 2]),
}

/// Compress bytes into a zstd frame.
///
/// Total over all inputs, including the empty one.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>, CompressionError> {
    zstd::bulk::compress(data, level).map_err(CompressionError::Compress)
}

/// Decompress a zstd frame produced by [`compress`].
///
/// Corrupt or truncated input is an error; no partial output is returned.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if !is_compressed(data) {
        return Err(CompressionError::Corrupt(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "missing zstd frame header",
        )));
    }
    zstd::stream::decode_all(data).map_err(CompressionError::Corrupt)
}

/// Does `data` start with a zstd frame header?
#[must_use]
pub fn is_compressed(data: &[u8]) -> bool {
    const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
    data.starts_with(&ZSTD_MAGIC)
}

/// Wrap `payload` in an envelope, compressing it if `config` says so.
pub fn pack(payload: &[u8], config: &CompressionConfig) -> Result<Vec<u8>, CompressionError> {
    let (magic, body) = if config.should_compress(payload.len()) {
        let body = compress(payload, config.level)?;
        debug!(raw = payload.len(), compressed = body.len(), "packed compressed payload");
        (MAGIC_COMPRESSED, body)
    } else {
        (MAGIC_RAW, payload.to_vec())
    };

    let mut packed = Vec::with_capacity(body.len() + 2);
    packed.extend_from_slice(&magic);
    packed.extend_from_slice(&body);
    Ok(packed)
}

/// Open an envelope written by [`pack`].
pub fn unpack(packed: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if packed.len() < 2 {
        return Err(CompressionError::Truncated(packed.len()));
    }
    let (magic, body) = packed.split_at(2);
    match [magic[0], magic[1]] {
        MAGIC_COMPRESSED => decompress(body),
        MAGIC_RAW => Ok(body.to_vec()),
        other => Err(CompressionError::UnknownMagic(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        // Repetitive with some variation, like real encodings.
        (0..len).map(|i| b"piece;label;Tank\t"[i % 17] ^ (i / 4096) as u8).collect()
    }

    #[test]
    fn test_round_trip_sizes() {
        for len in [0, 1, 100, 1 << 20, (1 << 20) + 7] {
            let data = sample(len);
            let compressed = compress(&data, 3).unwrap();
            assert!(is_compressed(&compressed));
            assert_eq!(decompress(&compressed).unwrap(), data, "len {}", len);
        }
    }

    #[test]
    fn test_large_payload_shrinks() {
        let data = sample(1 << 20);
        assert!(compress(&data, 3).unwrap().len() < data.len() / 10);
    }

    #[test]
    fn test_corrupt_input_rejected() {
        assert!(matches!(decompress(b""), Err(CompressionError::Corrupt(_))));
        assert!(matches!(decompress(b"not zstd at all"), Err(CompressionError::Corrupt(_))));

        let mut compressed = compress(&sample(10_000), 3).unwrap();
        compressed.truncate(compressed.len() / 2);
        assert!(matches!(decompress(&compressed), Err(CompressionError::Corrupt(_))));
    }

    #[test]
    fn test_envelope_threshold() {
        let config = CompressionConfig {
            level: 3,
            threshold: 64,
        };
        let small = pack(b"tiny", &config).unwrap();
        assert_eq!(&small[..2], b"RT");
        assert_eq!(unpack(&small).unwrap(), b"tiny");

        let data = sample(64);
        let big = pack(&data, &config).unwrap();
        assert_eq!(&big[..2], b"ZT");
        assert_eq!(unpack(&big).unwrap(), data);

        let empty = pack(b"", &CompressionConfig::always()).unwrap();
        assert_eq!(unpack(&empty).unwrap(), b"");
        let raw = pack(b"", &CompressionConfig::disabled()).unwrap();
        assert_eq!(raw, b"RT");
    }

    #[test]
    fn test_bad_envelopes() {
        assert!(matches!(unpack(b""), Err(CompressionError::Truncated(0))));
        assert!(matches!(unpack(b"Z"), Err(CompressionError::Truncated(1))));
        assert!(matches!(unpack(b"PKxx"), Err(CompressionError::UnknownMagic(m)) if &m == b"PK"));
        assert!(matches!(unpack(b"ZTgarbage"), Err(CompressionError::Corrupt(_))));
    }
}
