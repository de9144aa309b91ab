//! The compression threshold, below which a payload is always sent
//! uncompressed regardless of configured compressor (see `DESIGN.md`).
//!
//! A payload must not be compressed if its uncompressed size is below this
//! threshold; the outbound meta then carries compression tag `0` (none) even
//! when a non-identity compressor is configured for the call.

/// Default threshold, in bytes, below which payloads travel uncompressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1024;

/// Whether a payload of `len` bytes should be compressed under `threshold`.
#[must_use]
pub fn should_compress(len: usize, threshold: usize) -> bool {
    len >= threshold
}

#[cfg(test)]
mod tests {
    use super::{should_compress, DEFAULT_COMPRESSION_THRESHOLD};

    #[test]
    fn payload_below_threshold_is_not_compressed() {
        assert!(!should_compress(1023, DEFAULT_COMPRESSION_THRESHOLD));
    }

    #[test]
    fn payload_at_or_above_threshold_is_compressed() {
        assert!(should_compress(1024, DEFAULT_COMPRESSION_THRESHOLD));
        assert!(should_compress(2048, DEFAULT_COMPRESSION_THRESHOLD));
    }
}
