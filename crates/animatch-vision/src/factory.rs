//! Factories for recognition and portrait providers.

use std::sync::Arc;
use std::time::Duration;

use animatch_core::error::AnimatchResult;
use animatch_core::traits::{
    ImageGenerator, ImageGeneratorConfig, Recognizer, RecognizerConfig, RecognizerProvider,
};

use crate::gemini::{GeminiImageGenerator, GeminiRecognizer};
use crate::openai::OpenAIRecognizer;

/// Factory for creating recognizers.
pub struct RecognizerFactory;

impl RecognizerFactory {
    /// Create a recognizer from the given configuration.
    pub fn create(config: RecognizerConfig) -> AnimatchResult<Arc<dyn Recognizer>> {
        Self::create_with_timeout(config, None)
    }

    /// Create a recognizer whose HTTP requests are bounded by `timeout`.
    pub fn create_with_timeout(
        config: RecognizerConfig,
        timeout: Option<Duration>,
    ) -> AnimatchResult<Arc<dyn Recognizer>> {
        tracing::debug!(provider = ?config.provider, model = %config.model, "Creating recognizer");
        match config.provider {
            RecognizerProvider::Gemini => {
                let recognizer = GeminiRecognizer::with_timeout(config, timeout)?;
                Ok(Arc::new(recognizer))
            }
            RecognizerProvider::OpenAI => {
                let recognizer = OpenAIRecognizer::with_timeout(config, timeout)?;
                Ok(Arc::new(recognizer))
            }
        }
    }

    /// Create a Gemini recognizer with default configuration.
    pub fn gemini() -> AnimatchResult<Arc<dyn Recognizer>> {
        Self::create(RecognizerConfig::default())
    }

    /// Create an OpenAI recognizer with default configuration.
    pub fn openai() -> AnimatchResult<Arc<dyn Recognizer>> {
        Self::create(RecognizerConfig {
            provider: RecognizerProvider::OpenAI,
            ..Default::default()
        })
    }

    /// Create the portrait generator, or `None` when it is not configured.
    pub fn image_generator(
        config: Option<&ImageGeneratorConfig>,
        timeout: Option<Duration>,
    ) -> AnimatchResult<Option<Arc<dyn ImageGenerator>>> {
        let Some(config) = config else {
            return Ok(None);
        };
        let generator = GeminiImageGenerator::with_timeout(config.clone(), timeout)?;
        Ok(Some(Arc::new(generator)))
    }
}
