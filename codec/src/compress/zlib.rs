//! Zlib (deflate, RFC 1950) compression (tag 3) via `flate2`.

use std::io::{Read, Write};

use bytes::Bytes;
use error_stack::{Report, ResultExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::Compressor;
use crate::error::CompressionError;

const CODEC: &str = "zlib";

pub(super) struct Zlib;

impl Compressor for Zlib {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(src.len() / 2), Compression::default());
        encoder
            .write_all(src)
            .change_context(CompressionError::Compress { codec: CODEC })?;
        let bytes = encoder
            .finish()
            .change_context(CompressionError::Compress { codec: CODEC })?;
        Ok(Bytes::from(bytes))
    }

    fn decompress(&self, src: &[u8], hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
        let mut decoder = ZlibDecoder::new(src);
        let mut out = Vec::with_capacity(hint_size);
        decoder
            .read_to_end(&mut out)
            .change_context(CompressionError::Decompress { codec: CODEC })?;
        Ok(Bytes::from(out))
    }
}
