//! Gemini `generateContent` client and providers built on it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use animatch_core::error::{AnimatchError, AnimatchResult, ErrorCode};
use animatch_core::json_parser::parse_character_names;
use animatch_core::traits::{ImageGenerator, ImageGeneratorConfig, Recognizer, RecognizerConfig};
use animatch_core::types::{ImageInput, RecognizedCharacter, DEFAULT_MIME_TYPE};

use crate::prompts::{portrait_prompt, RECOGNITION_SYSTEM_PROMPT, RECOGNITION_USER_PROMPT};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileRef,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileRef {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Thin Gemini REST client shared by the recognizer and portrait generator.
pub(crate) struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub(crate) fn new(
        api_key: Option<String>,
        base_url: Option<&str>,
        model: &str,
        timeout: Option<Duration>,
    ) -> AnimatchResult<Self> {
        let api_key = api_key
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

        let base_url = match base_url {
            Some(url) => {
                url::Url::parse(url).map_err(|e| {
                    AnimatchError::Configuration(format!("Invalid Gemini base URL '{}': {}", url, e))
                })?;
                url.trim_end_matches('/').to_string()
            }
            None => GEMINI_API_URL.to_string(),
        };

        let model = model.trim_start_matches("models/");
        if model.is_empty() {
            return Err(AnimatchError::Configuration(
                "Gemini model name is empty".to_string(),
            ));
        }

        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
        })
    }

    pub(crate) fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> AnimatchResult<GenerateContentResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AnimatchError::from_http_status(status.as_u16(), &message));
        }

        serde_json::from_str(&body).map_err(|e| AnimatchError::malformed("Gemini", e.to_string()))
    }
}

fn network_error(e: reqwest::Error) -> AnimatchError {
    let code = if e.is_timeout() {
        ErrorCode::NetTimeout
    } else {
        ErrorCode::NetConnectionFailed
    };
    AnimatchError::Network {
        message: format!("Gemini request failed: {}", e),
        code,
        source: Some(Box::new(e)),
    }
}

/// Transport and server failures during recognition become recognition
/// errors; authentication, rate limit and payload errors pass through.
fn recognition_error(e: AnimatchError) -> AnimatchError {
    match e {
        AnimatchError::Network {
            message,
            code,
            source,
        } => AnimatchError::Recognition {
            message,
            code: match code {
                ErrorCode::NetTimeout => ErrorCode::NetTimeout,
                _ => ErrorCode::RecConnectionFailed,
            },
            source,
        },
        other => other,
    }
}

fn image_generation_error(e: AnimatchError) -> AnimatchError {
    match e {
        AnimatchError::Network { message, .. } => AnimatchError::image_generation(message),
        other => other,
    }
}

/// Guess a MIME type from a URL's file extension.
fn mime_from_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    match path.rsplit('.').next() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => DEFAULT_MIME_TYPE,
    }
}

fn image_part(image: &ImageInput) -> AnimatchResult<Part> {
    if let Some(url) = image.as_url() {
        return Ok(Part::File {
            file_data: FileRef {
                mime_type: mime_from_url(url).to_string(),
                file_uri: url.to_string(),
            },
        });
    }

    let inline = image.to_inline()?;
    Ok(Part::Inline {
        inline_data: Blob {
            mime_type: inline.mime_type,
            data: inline.data,
        },
    })
}

/// Gemini vision recognizer.
pub struct GeminiRecognizer {
    client: GeminiClient,
    config: RecognizerConfig,
}

impl GeminiRecognizer {
    /// Create a new Gemini recognizer.
    pub fn new(config: RecognizerConfig) -> AnimatchResult<Self> {
        Self::with_timeout(config, None)
    }

    /// Create a recognizer whose HTTP requests give up after `timeout`.
    pub fn with_timeout(config: RecognizerConfig, timeout: Option<Duration>) -> AnimatchResult<Self> {
        let client = GeminiClient::new(
            config.api_key.clone(),
            config.base_url.as_deref(),
            &config.model,
            timeout,
        )?;
        Ok(Self { client, config })
    }

    fn build_request(&self, image: &ImageInput) -> AnimatchResult<GenerateContentRequest> {
        let instruction = self
            .config
            .prompt
            .clone()
            .unwrap_or_else(|| RECOGNITION_SYSTEM_PROMPT.to_string());

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: instruction },
                    Part::Text {
                        text: RECOGNITION_USER_PROMPT.to_string(),
                    },
                    image_part(image)?,
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.config.temperature,
            }),
        })
    }
}

#[async_trait]
impl Recognizer for GeminiRecognizer {
    async fn recognize(&self, image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>> {
        let request = self.build_request(image)?;
        let response = self
            .client
            .generate_content(&request)
            .await
            .map_err(recognition_error)?;

        let text = response.first_text().ok_or_else(|| {
            AnimatchError::malformed("recognition", "response has no candidate text")
        })?;
        tracing::debug!(model = %self.client.model(), reply = %text.trim(), "Recognition reply");

        parse_character_names(text)
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}

/// Portrait generator backed by a Gemini text model.
///
/// The model is asked for an image URL; whatever text it returns is passed
/// through unverified.
pub struct GeminiImageGenerator {
    client: GeminiClient,
}

impl GeminiImageGenerator {
    pub fn new(config: ImageGeneratorConfig) -> AnimatchResult<Self> {
        Self::with_timeout(config, None)
    }

    pub fn with_timeout(config: ImageGeneratorConfig, timeout: Option<Duration>) -> AnimatchResult<Self> {
        let client =
            GeminiClient::new(config.api_key, config.base_url.as_deref(), &config.model, timeout)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(&self, name: &str, description: &str) -> AnimatchResult<Option<String>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part::Text {
                    text: portrait_prompt(name, description),
                }],
            }],
            generation_config: None,
        };

        let response = self
            .client
            .generate_content(&request)
            .await
            .map_err(image_generation_error)?;
        let image = response
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if image.is_none() {
            tracing::debug!(character = %name, "Portrait model returned nothing");
        }
        Ok(image)
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}
