//! Recognizer trait and related types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnimatchResult;
use crate::types::{ImageInput, RecognizedCharacter};

/// Identifies anime characters in an image.
///
/// Implementations return names in the order the provider reported them. An
/// empty list is a valid answer, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognize the characters present in `image`.
    async fn recognize(&self, image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>>;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// Recognizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: RecognizerProvider,
    /// Vision model name/identifier.
    pub model: String,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL for API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom recognition prompt (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            provider: RecognizerProvider::default(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            prompt: None,
        }
    }
}

/// Recognizer provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerProvider {
    #[default]
    Gemini,
    OpenAI,
}
