//! Bounded waits for remote provider calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{AnimatchError, AnimatchResult};

/// Await `fut`, failing with [`AnimatchError::Timeout`] once `limit` elapses.
///
/// `None` waits indefinitely.
pub async fn with_deadline<T, F>(stage: &str, limit: Option<Duration>, fut: F) -> AnimatchResult<T>
where
    F: Future<Output = AnimatchResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AnimatchError::timeout(stage, limit))?,
        None => fut.await,
    }
}
