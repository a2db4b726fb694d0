//! Cross-image character comparison.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::deadline::with_deadline;
use crate::embedding_cache::CachedEmbedder;
use crate::error::{AnimatchError, AnimatchResult};
use crate::similarity::cosine_similarity;
use crate::traits::Embedder;
use crate::types::{AnalysisResult, CharacterAnalysis};

/// Maximum number of analyzed images one comparison accepts.
pub const MAX_COMPARE_IMAGES: usize = 4;

/// Similarity between two characters found in different images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterPairSimilarity {
    /// Index of the image the left character came from.
    pub left_image: usize,
    pub left: String,
    pub right_image: usize,
    pub right: String,
    pub similarity: f32,
}

/// Scores characters against each other using their embedding text.
pub struct CharacterComparator {
    embedder: Arc<dyn Embedder>,
    timeout: Option<Duration>,
}

impl CharacterComparator {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Arc::new(CachedEmbedder::new(embedder)),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cosine similarity of two characters. Failed embeddings score 0.
    pub async fn similarity(&self, a: &CharacterAnalysis, b: &CharacterAnalysis) -> f32 {
        let (left_text, right_text) = (a.embedding_text(), b.embedding_text());
        let (left, right) = futures::join!(self.embed(&left_text), self.embed(&right_text));
        match (left, right) {
            (Ok(left), Ok(right)) => cosine_similarity(&left, &right),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(left = %a.name, right = %b.name, error = %e, "Comparison embedding failed");
                0.0
            }
        }
    }

    /// Compare every character of each image with every character of the
    /// other images, most similar pairs first.
    pub async fn compare_results(
        &self,
        results: &[AnalysisResult],
    ) -> AnimatchResult<Vec<CharacterPairSimilarity>> {
        if results.len() > MAX_COMPARE_IMAGES {
            return Err(AnimatchError::Configuration(format!(
                "At most {} images can be compared, got {}",
                MAX_COMPARE_IMAGES,
                results.len()
            )));
        }

        let mut pairs = Vec::new();
        for (i, left_result) in results.iter().enumerate() {
            for (j, right_result) in results.iter().enumerate().skip(i + 1) {
                for left in &left_result.characters {
                    for right in &right_result.characters {
                        pairs.push(CharacterPairSimilarity {
                            left_image: i,
                            left: left.name.clone(),
                            right_image: j,
                            right: right.name.clone(),
                            similarity: self.similarity(left, right).await,
                        });
                    }
                }
            }
        }

        pairs.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Ok(pairs)
    }

    async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
        with_deadline("Embedding", self.timeout, self.embedder.embed(text)).await
    }
}
