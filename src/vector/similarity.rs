use thiserror::Error;

/// Two vectors of different lengths were compared.
///
/// Embeddings of one deployment always share a dimensionality, so this
/// signals a model mismatch upstream rather than bad input data.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot compare vectors of dimensions {left} and {right}")]
pub struct DimensionMismatchError {
    pub left: usize,
    pub right: usize,
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when either vector has zero norm. Sums are accumulated in
/// `f64` so that very small or very large components neither underflow nor
/// overflow.
pub fn cosine_similarity(v1: &[f32], v2: &[f32]) -> Result<f32, DimensionMismatchError> {
    if v1.len() != v2.len() {
        return Err(DimensionMismatchError {
            left: v1.len(),
            right: v2.len(),
        });
    }

    let norm1 = norm(v1);
    let norm2 = norm(v2);
    if norm1 == 0.0 || norm2 == 0.0 {
        return Ok(0.0);
    }

    let dot = v1
        .iter()
        .zip(v2)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum::<f64>();
    Ok((dot / (norm1 * norm2)) as f32)
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize(vec: &[f32]) -> Vec<f32> {
    let norm = norm(vec);
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| (f64::from(*x) / norm) as f32).collect()
    }
}

fn norm(vec: &[f32]) -> f64 {
    vec.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}
