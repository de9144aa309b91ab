//! Snappy compression (tag 1) via `snap`.

use bytes::Bytes;
use error_stack::{Report, ResultExt};

use super::Compressor;
use crate::error::CompressionError;

const CODEC: &str = "snappy";

pub(super) struct Snappy;

impl Compressor for Snappy {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
        let mut encoder = snap::raw::Encoder::new();
        let compressed = encoder
            .compress_vec(src)
            .change_context(CompressionError::Compress { codec: CODEC })?;
        Ok(Bytes::from(compressed))
    }

    fn decompress(&self, src: &[u8], _hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
        let mut decoder = snap::raw::Decoder::new();
        let decompressed = decoder
            .decompress_vec(src)
            .change_context(CompressionError::Decompress { codec: CODEC })?;
        Ok(Bytes::from(decompressed))
    }
}
