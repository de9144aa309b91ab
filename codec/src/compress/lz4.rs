//! LZ4 compression (tag 4) via `lz4_flex`'s length-prepended block format.

use bytes::Bytes;
use error_stack::{Report, ResultExt};

use super::Compressor;
use crate::error::CompressionError;

const CODEC: &str = "lz4";

pub(super) struct Lz4;

impl Compressor for Lz4 {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
        Ok(Bytes::from(lz4_flex::block::compress_prepend_size(src)))
    }

    fn decompress(&self, src: &[u8], _hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
        let decompressed = lz4_flex::block::decompress_size_prepended(src)
            .change_context(CompressionError::Decompress { codec: CODEC })?;
        Ok(Bytes::from(decompressed))
    }
}
