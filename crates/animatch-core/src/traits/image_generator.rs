//! Image generator trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnimatchResult;

/// Produces a portrait reference for a character.
///
/// Used only for optional enrichment; callers treat any failure as "no image".
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image reference (usually a URL) for the named character.
    ///
    /// Returns `Ok(None)` when the provider produced nothing usable.
    async fn generate(&self, name: &str, description: &str) -> AnimatchResult<Option<String>>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Image generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGeneratorConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ImageGeneratorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: None,
        }
    }
}
