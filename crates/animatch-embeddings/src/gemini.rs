//! Gemini embedding provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use animatch_core::error::{AnimatchError, AnimatchResult, ErrorCode};
use animatch_core::traits::{Embedder, EmbedderConfig};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `embedContent` provider.
pub struct GeminiEmbedder {
    client: Client,
    config: EmbedderConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder.
    pub fn new(config: EmbedderConfig) -> AnimatchResult<Self> {
        Self::with_timeout(config, None)
    }

    /// Create a Gemini embedder whose HTTP requests give up after `timeout`.
    pub fn with_timeout(config: EmbedderConfig, timeout: Option<Duration>) -> AnimatchResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                AnimatchError::Configuration("Gemini API key not found. Set GEMINI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            api_key
                .parse()
                .map_err(|_| AnimatchError::Configuration("Invalid API key format".to_string()))?,
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            AnimatchError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        let base_url = match config.base_url.as_deref() {
            Some(url) => {
                url::Url::parse(url).map_err(|e| {
                    AnimatchError::Configuration(format!("Invalid Gemini base URL '{}': {}", url, e))
                })?;
                url.trim_end_matches('/').to_string()
            }
            None => GEMINI_API_URL.to_string(),
        };

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn model_path(&self) -> String {
        if self.config.model.starts_with("models/") {
            self.config.model.clone()
        } else {
            format!("models/{}", self.config.model)
        }
    }

    fn request<'a>(&self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: self.model_path(),
            content: Content {
                parts: [Part { text }],
            },
        }
    }

    async fn post<T: Serialize>(&self, method: &str, body: &T) -> AnimatchResult<String> {
        let url = format!("{}/{}:{}", self.base_url, self.model_path(), method);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.text().await.map_err(request_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AnimatchError::from_http_status(status.as_u16(), &message));
        }

        Ok(body)
    }
}

fn request_error(e: reqwest::Error) -> AnimatchError {
    let code = if e.is_timeout() {
        ErrorCode::NetTimeout
    } else {
        ErrorCode::EmbConnectionFailed
    };
    AnimatchError::Embedding {
        message: format!("Gemini embedding request failed: {}", e),
        code,
        source: Some(Box::new(e)),
    }
}

fn parse_embedding(body: &str) -> AnimatchResult<Vec<f32>> {
    let response: EmbedContentResponse = serde_json::from_str(body)
        .map_err(|e| AnimatchError::malformed("embedding", e.to_string()))?;

    match response.embedding {
        Some(embedding) if !embedding.values.is_empty() => Ok(embedding.values),
        _ => Err(AnimatchError::malformed(
            "embedding",
            "response has no embedding.values",
        )),
    }
}

fn parse_batch(body: &str, expected: usize) -> AnimatchResult<Vec<Vec<f32>>> {
    let response: BatchEmbedContentsResponse = serde_json::from_str(body)
        .map_err(|e| AnimatchError::malformed("embedding", e.to_string()))?;

    if response.embeddings.len() != expected {
        return Err(AnimatchError::malformed(
            "embedding",
            format!(
                "expected {} embeddings, got {}",
                expected,
                response.embeddings.len()
            ),
        ));
    }

    Ok(response.embeddings.into_iter().map(|e| e.values).collect())
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
        let body = self.post("embedContent", &self.request(text)).await?;
        let values = parse_embedding(&body)?;
        tracing::debug!(model = %self.config.model, dims = values.len(), "Gemini embedding");
        Ok(values)
    }

    async fn embed_batch(&self, texts: &[String]) -> AnimatchResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = BatchEmbedContentsRequest {
            requests: texts.iter().map(|t| self.request(t)).collect(),
        };
        let body = self.post("batchEmbedContents", &request).await?;
        parse_batch(&body, texts.len())
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
