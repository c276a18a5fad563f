//! Binary layout of stored embeddings.
//!
//! A vector is stored as the raw concatenation of its components, each an
//! IEEE-754 single-precision float in little-endian byte order. There is no
//! header: the dimensionality is a deployment setting known to both the
//! writer and the reader.

use thiserror::Error;

/// Width of one encoded component in bytes.
pub const FLOAT_WIDTH: usize = std::mem::size_of::<f32>();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("blob length {len} is not a multiple of 4")]
    Misaligned { len: usize },
    #[error("blob holds {actual} components, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Encode a vector into `FLOAT_WIDTH * vector.len()` bytes.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Decode a blob produced by [`encode`] back into a vector of
/// `dimensions` components.
pub fn decode(bytes: &[u8], dimensions: usize) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % FLOAT_WIDTH != 0 {
        return Err(CodecError::Misaligned { len: bytes.len() });
    }

    let actual = bytes.len() / FLOAT_WIDTH;
    if actual != dimensions {
        return Err(CodecError::DimensionMismatch {
            expected: dimensions,
            actual,
        });
    }

    Ok(bytes
        .chunks_exact(FLOAT_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
