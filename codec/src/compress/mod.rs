//! Compression codecs: a byte-in/byte-out transform tagged by
//! [`polyrpc_types::CompressType`].

mod gzip;
mod lz4;
mod none;
mod snappy;
mod zlib;

use bytes::Bytes;
use error_stack::Report;
use polyrpc_types::CompressType;

use crate::error::CompressionError;

/// A symmetric compress/decompress pair for one [`CompressType`] tag.
///
/// `hint_size` of `0` means "unknown, grow dynamically"; a correct hint is
/// an optimization only, never required for correctness.
pub trait Compressor {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>>;
    fn decompress(&self, src: &[u8], hint_size: usize) -> Result<Bytes, Report<CompressionError>>;
}

/// Resolves the [`Compressor`] for a given tag.
#[must_use]
pub fn compressor_for(tag: CompressType) -> &'static dyn Compressor {
    match tag {
        CompressType::None => &none::None_,
        CompressType::Snappy => &snappy::Snappy,
        CompressType::Gzip => &gzip::Gzip,
        CompressType::Zlib => &zlib::Zlib,
        CompressType::Lz4 => &lz4::Lz4,
    }
}

/// Compresses `src` with the compressor for `tag`.
///
/// # Errors
///
/// Returns [`CompressionError::Compress`] if the underlying codec fails.
pub fn compress(tag: CompressType, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
    compressor_for(tag).compress(src)
}

/// Decompresses `src` with the compressor for `tag`.
///
/// # Errors
///
/// Returns [`CompressionError::Decompress`] if the underlying codec fails.
pub fn decompress(tag: CompressType, src: &[u8], hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
    compressor_for(tag).decompress(src, hint_size)
}

#[cfg(test)]
mod tests {
    use super::{compress, decompress};
    use polyrpc_types::CompressType;

    #[test]
    fn every_variant_round_trips() {
        let payload = b"the quick brown fox jumps over the lazy dog".repeat(4);
        for tag in [
            CompressType::None,
            CompressType::Snappy,
            CompressType::Gzip,
            CompressType::Zlib,
            CompressType::Lz4,
        ] {
            let compressed = compress(tag, &payload).expect("compress succeeds");
            let decompressed = decompress(tag, &compressed, payload.len()).expect("decompress succeeds");
            assert_eq!(decompressed.as_ref(), payload.as_slice(), "tag {tag} round-trip");
        }
    }

    #[test]
    fn zero_hint_size_still_decompresses() {
        let payload = b"zero hint size payload".repeat(8);
        for tag in [CompressType::Gzip, CompressType::Zlib, CompressType::Lz4, CompressType::Snappy] {
            let compressed = compress(tag, &payload).expect("compress succeeds");
            let decompressed = decompress(tag, &compressed, 0).expect("decompress succeeds");
            assert_eq!(decompressed.as_ref(), payload.as_slice());
        }
    }
}
