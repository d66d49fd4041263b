//! Similarity functions for ANN ordering over the vector value column.
//!
//! Scores are normalised so that a higher value always means "more similar",
//! matching how the storage engine's vector index ranks `ANN OF` results.

use serde::{Deserialize, Serialize};

/// Similarity function configured on the vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFunction {
    /// Cosine similarity, mapped to `(1 + cos) / 2`.
    #[default]
    Cosine,

    /// Euclidean distance, mapped to `1 / (1 + d²)`.
    Euclidean,

    /// Dot product, mapped to `(1 + dot) / 2`. Expects normalised vectors.
    DotProduct,
}

impl SimilarityFunction {
    /// Scores two vectors; higher is more similar.
    ///
    /// Vectors of different lengths score `0.0` so they sort last.
    #[must_use]
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        match self {
            Self::Cosine => {
                let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
                    (0.0f32, 0.0f32, 0.0f32),
                    |(dot, na, nb), (x, y)| (dot + x * y, na + x * x, nb + y * y),
                );
                let denom = norm_a.sqrt() * norm_b.sqrt();
                if denom == 0.0 {
                    return 0.0;
                }
                (1.0 + dot / denom) / 2.0
            }
            Self::Euclidean => {
                let squared: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                1.0 / (1.0 + squared)
            }
            Self::DotProduct => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                (1.0 + dot) / 2.0
            }
        }
    }

    /// Returns the name used in the vector index options.
    #[must_use]
    pub const fn as_option(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::DotProduct => "dot_product",
        }
    }

    /// Sorts scored results best-first.
    pub fn sort_results<T>(&self, results: &mut [(T, f32)]) {
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    }
}
