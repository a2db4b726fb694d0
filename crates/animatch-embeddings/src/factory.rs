//! Factory for creating embedding providers.

use std::sync::Arc;
use std::time::Duration;

use animatch_core::config::EmbedderProviderConfig;
use animatch_core::error::AnimatchResult;
use animatch_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};

use crate::gemini::GeminiEmbedder;
use crate::openai::OpenAIEmbedder;

/// Factory for creating embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create an embedder from the given configuration.
    pub fn create(provider: EmbedderProvider, config: EmbedderConfig) -> AnimatchResult<Arc<dyn Embedder>> {
        Self::create_with_timeout(provider, config, None)
    }

    /// Create an embedder whose HTTP requests are bounded by `timeout`.
    pub fn create_with_timeout(
        provider: EmbedderProvider,
        config: EmbedderConfig,
        timeout: Option<Duration>,
    ) -> AnimatchResult<Arc<dyn Embedder>> {
        tracing::debug!(?provider, model = %config.model, "Creating embedder");
        match provider {
            EmbedderProvider::Gemini => {
                let embedder = GeminiEmbedder::with_timeout(config, timeout)?;
                Ok(Arc::new(embedder))
            }
            EmbedderProvider::OpenAI => {
                let embedder = OpenAIEmbedder::with_timeout(config, timeout)?;
                Ok(Arc::new(embedder))
            }
        }
    }

    /// Create an embedder from an [`EmbedderProviderConfig`] section.
    pub fn from_config(
        config: &EmbedderProviderConfig,
        timeout: Option<Duration>,
    ) -> AnimatchResult<Arc<dyn Embedder>> {
        Self::create_with_timeout(config.provider, config.config.clone(), timeout)
    }

    /// Create a Gemini embedder with default configuration.
    pub fn gemini() -> AnimatchResult<Arc<dyn Embedder>> {
        Self::create(EmbedderProvider::Gemini, EmbedderConfig::default())
    }

    /// Create an OpenAI embedder with default configuration.
    pub fn openai() -> AnimatchResult<Arc<dyn Embedder>> {
        Self::create(EmbedderProvider::OpenAI, EmbedderConfig::default())
    }

    /// Create an OpenAI embedder with a specific model.
    pub fn openai_with_model(model: impl Into<String>, dims: usize) -> AnimatchResult<Arc<dyn Embedder>> {
        let config = EmbedderConfig {
            model: model.into(),
            embedding_dims: dims,
            ..Default::default()
        };
        Self::create(EmbedderProvider::OpenAI, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini_with_key() {
        let config = EmbedderConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let embedder = EmbedderFactory::create(EmbedderProvider::Gemini, config).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-004");
        assert_eq!(embedder.dimension(), 768);
    }

    #[test]
    fn test_from_config_section() {
        let section = EmbedderProviderConfig {
            provider: EmbedderProvider::OpenAI,
            config: EmbedderConfig {
                model: "text-embedding-3-large".to_string(),
                embedding_dims: 3072,
                api_key: Some("sk-test".to_string()),
                base_url: None,
            },
        };
        let embedder =
            EmbedderFactory::from_config(&section, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-large");
    }
}
