//! OpenAI embedding provider implementation.

use std::time::Duration;

use async_trait::async_trait;

use animatch_core::error::{AnimatchError, AnimatchResult};
use animatch_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};

/// Default OpenAI embedding model when the configured one is Gemini's.
pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    pub fn new(config: EmbedderConfig) -> AnimatchResult<Self> {
        Self::with_timeout(config, None)
    }

    /// Create an OpenAI embedder whose HTTP requests give up after `timeout`.
    pub fn with_timeout(config: EmbedderConfig, timeout: Option<Duration>) -> AnimatchResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                AnimatchError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        if let Some(ref base_url) = config.base_url {
            url::Url::parse(base_url).map_err(|e| {
                AnimatchError::Configuration(format!("Invalid OpenAI base URL '{}': {}", base_url, e))
            })?;
        }

        #[cfg(feature = "openai")]
        let openai_config = if let Some(ref base_url) = config.base_url {
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };
        #[cfg(not(feature = "openai"))]
        let _ = (api_key, timeout);

        #[cfg(feature = "openai")]
        let client = {
            let mut http = reqwest::Client::builder();
            if let Some(timeout) = timeout {
                http = http.timeout(timeout);
            }
            let http = http.build().map_err(|e| {
                AnimatchError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
            Client::with_config(openai_config).with_http_client(http)
        };

        let mut config = config;
        if config.model.is_empty() || config.model.starts_with("text-embedding-004") {
            config.model = DEFAULT_OPENAI_EMBEDDING_MODEL.to_string();
            config.embedding_dims = 1536;
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input: EmbeddingInput::String(text.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AnimatchError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AnimatchError::malformed("embedding", "No embedding returned"))?;

        Ok(embedding.embedding)
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> AnimatchResult<Vec<f32>> {
        Err(AnimatchError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    #[cfg(feature = "openai")]
    async fn embed_batch(&self, texts: &[String]) -> AnimatchResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input: EmbeddingInput::StringArray(texts.to_vec()),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AnimatchError::embedding(format!("OpenAI embedding error: {}", e)))?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(AnimatchError::malformed(
                "embedding",
                format!("expected {} embeddings, got {}", texts.len(), data.len()),
            ));
        }
        data.sort_by_key(|e| e.index);

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> EmbedderConfig {
        EmbedderConfig {
            model: model.to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_gemini_default_model_swapped() {
        let embedder = OpenAIEmbedder::new(EmbedderConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(embedder.model_name(), DEFAULT_OPENAI_EMBEDDING_MODEL);
        assert_eq!(embedder.dimension(), 1536);
    }

    #[test]
    fn test_explicit_model_kept() {
        let embedder = OpenAIEmbedder::new(EmbedderConfig {
            embedding_dims: 3072,
            ..config("text-embedding-3-large")
        })
        .unwrap();
        assert_eq!(embedder.model_name(), "text-embedding-3-large");
        assert_eq!(embedder.dimension(), 3072);
    }

    #[cfg(feature = "openai")]
    #[tokio::test]
    async fn test_slow_provider_times_out() {
        use serde_json::json;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "object": "list",
                        "model": "text-embedding-3-small",
                        "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, 0.2] }],
                        "usage": { "prompt_tokens": 2, "total_tokens": 2 }
                    }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::with_timeout(
            EmbedderConfig {
                base_url: Some(server.uri()),
                ..config("text-embedding-3-small")
            },
            Some(Duration::from_millis(200)),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let err = embedder.embed("Roronoa Zoro").await.unwrap_err();
        assert!(matches!(err, AnimatchError::Embedding { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = OpenAIEmbedder::new(EmbedderConfig {
            base_url: Some("::nope".to_string()),
            ..config("text-embedding-3-small")
        });
        assert!(matches!(result, Err(AnimatchError::Configuration(_))));
    }
}
