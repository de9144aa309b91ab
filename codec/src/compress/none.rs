//! The identity compressor: tag 0, used whenever a payload is below the
//! compression threshold or the call explicitly opts out.

use bytes::Bytes;
use error_stack::Report;

use super::Compressor;
use crate::error::CompressionError;

pub(super) struct None_;

impl Compressor for None_ {
    fn compress(&self, src: &[u8]) -> Result<Bytes, Report<CompressionError>> {
        Ok(Bytes::copy_from_slice(src))
    }

    fn decompress(&self, src: &[u8], _hint_size: usize) -> Result<Bytes, Report<CompressionError>> {
        Ok(Bytes::copy_from_slice(src))
    }
}
