//! In-memory embedding cache scoped to a single analysis run.
//!
//! Related-character lists overlap heavily (Naruto lists Sasuke, Sasuke lists
//! Naruto), so the same `name + description` text is embedded many times per
//! run. The cache keys on the exact text and guarantees one provider call per
//! distinct text, even when lookups race. Failures are not cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::AnimatchResult;
use crate::traits::Embedder;

/// Memoizing wrapper around another [`Embedder`].
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    entries: Mutex<HashMap<String, Arc<OnceCell<Vec<f32>>>>>,
    misses: AtomicUsize,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            misses: AtomicUsize::new(0),
        }
    }

    /// Number of calls forwarded to the inner provider.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of texts with a cached vector.
    pub fn len(&self) -> usize {
        self.lock_entries()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<Vec<f32>>>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cell_for(&self, text: &str) -> Arc<OnceCell<Vec<f32>>> {
        self.lock_entries()
            .entry(text.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
        let cell = self.cell_for(text);
        let embedding = cell
            .get_or_try_init(|| async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(chars = text.len(), "Embedding cache miss");
                self.inner.embed(text).await
            })
            .await?;
        Ok(embedding.clone())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
