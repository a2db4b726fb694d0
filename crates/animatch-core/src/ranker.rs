//! Similarity ranking of related characters.
//!
//! A subject and each candidate are embedded from `name + " " + description`,
//! scored by cosine similarity, sorted descending and truncated to `top_k`.
//! Ranking tolerates partial failure: an unknown candidate, a failed
//! embedding or a vector of the wrong dimension removes only that candidate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::deadline::with_deadline;
use crate::error::AnimatchResult;
use crate::knowledge::KnowledgeLookup;
use crate::similarity::{try_cosine_similarity, VectorError};
use crate::traits::Embedder;
use crate::types::{CharacterRecord, RankedRelation};

/// Ranking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Maximum relations kept per character.
    pub top_k: usize,
    /// Candidate embeddings requested concurrently.
    pub max_concurrent_embeddings: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_concurrent_embeddings: 8,
        }
    }
}

/// Ranks candidate characters by embedding similarity to a subject.
pub struct SimilarityRanker {
    embedder: Arc<dyn Embedder>,
    knowledge: Arc<dyn KnowledgeLookup>,
    config: RankingConfig,
    call_timeout: Option<Duration>,
}

struct Scored<'a> {
    position: usize,
    record: &'a CharacterRecord,
    similarity: f32,
}

impl SimilarityRanker {
    pub fn new(embedder: Arc<dyn Embedder>, knowledge: Arc<dyn KnowledgeLookup>) -> Self {
        Self {
            embedder,
            knowledge,
            config: RankingConfig::default(),
            call_timeout: None,
        }
    }

    pub fn with_config(mut self, config: RankingConfig) -> Self {
        self.config = config;
        self
    }

    /// Bound every embedding call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Rank the subject's declared related characters with the configured `top_k`.
    pub async fn rank_related(&self, subject: &CharacterRecord) -> Vec<RankedRelation> {
        self.rank(subject, &subject.related_names, self.config.top_k)
            .await
    }

    /// Rank `candidate_names` by similarity to `subject`.
    ///
    /// The output has at most `top_k` entries, is sorted by non-increasing
    /// similarity (ties keep candidate order), and never repeats a name or
    /// contains the subject itself. Failures never propagate: if the subject
    /// or every candidate fails to embed, the result is empty.
    pub async fn rank(
        &self,
        subject: &CharacterRecord,
        candidate_names: &[String],
        top_k: usize,
    ) -> Vec<RankedRelation> {
        if top_k == 0 || candidate_names.is_empty() {
            return Vec::new();
        }

        let candidates = self.resolve_candidates(subject, candidate_names);
        if candidates.is_empty() {
            tracing::debug!(subject = %subject.name, "No resolvable candidates");
            return Vec::new();
        }

        let subject_embedding = match self.embed_record(subject).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(subject = %subject.name, error = %e, "Subject embedding failed, skipping ranking");
                return Vec::new();
            }
        };

        let concurrency = self.config.max_concurrent_embeddings.max(1);
        let embedded: Vec<_> = stream::iter(candidates)
            .map(|(position, record)| async move {
                (position, record, self.embed_record(record).await)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut scored: Vec<Scored<'_>> = embedded
            .into_iter()
            .filter_map(|(position, record, embedding)| {
                let embedding = match embedding {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        tracing::warn!(candidate = %record.name, error = %e, "Candidate embedding failed, dropping");
                        return None;
                    }
                };
                let similarity = match try_cosine_similarity(&subject_embedding, &embedding) {
                    Ok(similarity) if similarity.is_finite() => similarity,
                    Ok(_) => {
                        tracing::warn!(candidate = %record.name, "Non-finite similarity, dropping");
                        return None;
                    }
                    Err(VectorError::ZeroMagnitude) => {
                        tracing::debug!(candidate = %record.name, "Degenerate embedding, scoring 0");
                        0.0
                    }
                    Err(e @ VectorError::DimensionMismatch { .. }) => {
                        tracing::warn!(candidate = %record.name, error = %e, "Embedding dimension mismatch, dropping");
                        return None;
                    }
                };
                Some(Scored {
                    position,
                    record,
                    similarity,
                })
            })
            .collect();

        // Stable sort: equal scores keep candidate order.
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        scored.truncate(top_k);

        tracing::debug!(subject = %subject.name, ranked = scored.len(), "Ranked related characters");

        scored
            .into_iter()
            .map(|s| RankedRelation::new(s.record.name.clone(), s.similarity))
            .collect()
    }

    /// Resolve candidates, dropping unknown names, repeats and the subject.
    fn resolve_candidates<'a>(
        &'a self,
        subject: &CharacterRecord,
        candidate_names: &[String],
    ) -> Vec<(usize, &'a CharacterRecord)> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(candidate_names.len());

        for (position, name) in candidate_names.iter().enumerate() {
            let Some(record) = self.knowledge.resolve(name) else {
                tracing::debug!(candidate = %name, "Candidate not in knowledge base, dropping");
                continue;
            };
            if record.name == subject.name || !seen.insert(record.name.as_str()) {
                continue;
            }
            resolved.push((position, record));
        }

        resolved
    }

    async fn embed_record(&self, record: &CharacterRecord) -> AnimatchResult<Vec<f32>> {
        let text = record.embedding_text();
        with_deadline("Embedding", self.call_timeout, self.embedder.embed(&text)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnimatchError;
    use crate::knowledge::KnowledgeBase;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Embeds by looking up the character name (text up to the first space
    /// that matches a known key).
    struct TableEmbedder {
        vectors: HashMap<&'static str, Vec<f32>>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
            if self.failing.iter().any(|name| text.starts_with(name)) {
                return Err(AnimatchError::embedding("provider down"));
            }
            self.vectors
                .iter()
                .find(|(name, _)| text.starts_with(*name))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| AnimatchError::embedding("unknown text"))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "table"
        }
    }

    fn knowledge() -> Arc<dyn KnowledgeLookup> {
        let records = vec![
            CharacterRecord::new("Subject", "Show", "subject")
                .with_related(["Near", "Far", "Mid", "Ghost"]),
            CharacterRecord::new("Near", "Show", "near"),
            CharacterRecord::new("Far", "Show", "far"),
            CharacterRecord::new("Mid", "Show", "mid"),
            CharacterRecord::new("Twin", "Show", "twin"),
            CharacterRecord::new("Flat", "Show", "flat"),
            CharacterRecord::new("Wide", "Show", "wide"),
        ];
        Arc::new(KnowledgeBase::new(records).unwrap())
    }

    fn embedder(failing: Vec<&'static str>) -> Arc<dyn Embedder> {
        let vectors = HashMap::from([
            ("Subject", vec![1.0, 0.0, 0.0]),
            ("Near", vec![0.9, 0.1, 0.0]),
            ("Mid", vec![0.5, 0.5, 0.0]),
            ("Far", vec![0.0, 0.0, 1.0]),
            ("Twin", vec![0.9, 0.1, 0.0]),
            ("Flat", vec![0.0, 0.0, 0.0]),
            ("Wide", vec![1.0, 0.0, 0.0, 0.0]),
        ]);
        Arc::new(TableEmbedder { vectors, failing })
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn subject(kb: &Arc<dyn KnowledgeLookup>) -> CharacterRecord {
        kb.resolve("Subject").unwrap().clone()
    }

    #[tokio::test]
    async fn test_sorted_descending() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Far", "Mid", "Near"]), 5).await;

        let order: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["Near", "Mid", "Far"]);
        assert!(ranked.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_truncates_to_top_k() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Far", "Mid", "Near"]), 2).await;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Near");
    }

    #[tokio::test]
    async fn test_unknown_candidates_dropped() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker.rank_related(&subject(&kb)).await;
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.name != "Ghost"));
    }

    #[tokio::test]
    async fn test_no_duplicates_or_self() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker
            .rank(&subject(&kb), &names(&["Near", "Subject", "Near", "Mid"]), 5)
            .await;
        let order: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["Near", "Mid"]);
    }

    #[tokio::test]
    async fn test_ties_keep_candidate_order() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Twin", "Near"]), 5).await;
        assert_eq!(ranked[0].name, "Twin");
        assert_eq!(ranked[1].name, "Near");

        let ranked = ranker.rank(&subject(&kb), &names(&["Near", "Twin"]), 5).await;
        assert_eq!(ranked[0].name, "Near");
    }

    #[tokio::test]
    async fn test_failed_candidate_removed_only() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec!["Near"]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Near", "Mid"]), 5).await;
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Mid");
    }

    #[tokio::test]
    async fn test_all_candidates_fail_returns_empty() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec!["Near", "Mid", "Far"]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Near", "Mid", "Far"]), 5).await;
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_subject_failure_returns_empty() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec!["Subject"]), kb.clone());
        let ranked = ranker.rank(&subject(&kb), &names(&["Near"]), 5).await;
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_degenerate_and_mismatched_vectors() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        let ranked = ranker
            .rank(&subject(&kb), &names(&["Flat", "Wide", "Far"]), 5)
            .await;
        let order: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        // Flat scores 0 and ties with Far; Wide has the wrong dimension.
        assert_eq!(order, vec!["Flat", "Far"]);
        assert_eq!(ranked[0].similarity, 0.0);
    }

    #[tokio::test]
    async fn test_zero_top_k() {
        let kb = knowledge();
        let ranker = SimilarityRanker::new(embedder(vec![]), kb.clone());
        assert!(ranker.rank(&subject(&kb), &names(&["Near"]), 0).await.is_empty());
    }
}
