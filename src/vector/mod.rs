//! Embedding vectors: storage encoding and similarity math.

pub mod codec;
pub mod similarity;

pub use codec::{CodecError, decode, encode};
pub use similarity::{DimensionMismatchError, cosine_similarity, normalize};
