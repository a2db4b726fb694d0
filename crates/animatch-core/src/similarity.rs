//! Vector math for embedding comparison.

use thiserror::Error;

/// Why two vectors could not be compared.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    #[error("vectors have different dimensions ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
    #[error("vector has zero magnitude")]
    ZeroMagnitude,
}

/// Cosine similarity between two equal-length vectors, in `[-1, 1]`.
///
/// Fails on a dimension mismatch or when either vector has zero magnitude.
pub fn try_cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VectorError::ZeroMagnitude);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Cosine similarity that never fails: degenerate inputs score `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    try_cosine_similarity(a, b).unwrap_or(0.0)
}
