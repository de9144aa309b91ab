//! Gzip compression (tag 2) via `flate2`.

use std::io::{Read, Write};

use bytes::Bytes;
use error_stack::{Report, ResultExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::Compressor;
use crate::error::CompressionError;

const CODEC: &str = "gzip";

pub(super) struct Gzip;

impl Compressor for Gzip {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(src.len() / 2), Compression::default());
        encoder
            .write_all(src)
            .change_context(CompressionError::Compress { codec: CODEC })?;
        let bytes = encoder
            .finish()
            .change_context(CompressionError::Compress { codec: CODEC })?;
        Ok(Bytes::from(bytes))
    }

    fn decompress(&self, src: &[u8], hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
        let mut decoder = GzDecoder::new(src);
        let mut out = Vec::with_capacity(hint_size);
        decoder
            .read_to_end(&mut out)
            .change_context(CompressionError::Decompress { codec: CODEC })?;
        Ok(Bytes::from(out))
    }
}
