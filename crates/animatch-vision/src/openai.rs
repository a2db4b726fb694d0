//! OpenAI vision recognizer using async-openai.

use std::time::Duration;

use async_trait::async_trait;

use animatch_core::error::{AnimatchError, AnimatchResult};
use animatch_core::json_parser::parse_character_names;
use animatch_core::traits::{Recognizer, RecognizerConfig};
use animatch_core::types::{ImageInput, RecognizedCharacter};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest, ImageDetail,
        ImageUrl,
    },
    Client,
};

#[cfg(feature = "openai")]
use crate::prompts::{RECOGNITION_SYSTEM_PROMPT, RECOGNITION_USER_PROMPT};

/// Vision model used when the configured one belongs to another provider.
pub const DEFAULT_OPENAI_VISION_MODEL: &str = "gpt-4o";

const MAX_TOKENS: u32 = 1000;

/// OpenAI chat-completions vision recognizer.
pub struct OpenAIRecognizer {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: RecognizerConfig,
}

impl OpenAIRecognizer {
    /// Create a new OpenAI recognizer.
    pub fn new(config: RecognizerConfig) -> AnimatchResult<Self> {
        Self::with_timeout(config, None)
    }

    /// Create a recognizer whose HTTP requests give up after `timeout`.
    pub fn with_timeout(config: RecognizerConfig, timeout: Option<Duration>) -> AnimatchResult<Self> {
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
        let client = {
            let openai_config = if let Some(ref base_url) = config.base_url {
                OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(base_url)
            } else {
                OpenAIConfig::new().with_api_key(api_key)
            };

            let mut http = reqwest::Client::builder();
            if let Some(timeout) = timeout {
                http = http.timeout(timeout);
            }
            let http = http.build().map_err(|e| {
                AnimatchError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

            Client::with_config(openai_config).with_http_client(http)
        };
        #[cfg(not(feature = "openai"))]
        let _ = (api_key, timeout);

        let mut config = config;
        if config.model.is_empty() || config.model.starts_with("gemini") {
            config.model = DEFAULT_OPENAI_VISION_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    /// Image reference as OpenAI expects it: a remote URL or a data URI.
    fn image_url(image: &ImageInput) -> AnimatchResult<String> {
        match image.as_url() {
            Some(url) => Ok(url.to_string()),
            None => Ok(image.to_inline()?.to_data_uri()),
        }
    }

    #[cfg(feature = "openai")]
    fn build_request(&self, image: &ImageInput) -> AnimatchResult<CreateChatCompletionRequest> {
        let instruction = self
            .config
            .prompt
            .clone()
            .unwrap_or_else(|| RECOGNITION_SYSTEM_PROMPT.to_string());

        let image_part = ChatCompletionRequestMessageContentPartImage {
            image_url: ImageUrl {
                url: Self::image_url(image)?,
                detail: Some(ImageDetail::High),
            },
        };

        Ok(CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Array(vec![
                        ChatCompletionRequestUserMessageContentPart::Text(instruction.into()),
                        ChatCompletionRequestUserMessageContentPart::Text(
                            RECOGNITION_USER_PROMPT.to_string().into(),
                        ),
                        ChatCompletionRequestUserMessageContentPart::ImageUrl(image_part),
                    ]),
                    name: None,
                },
            )],
            temperature: Some(self.config.temperature),
            max_completion_tokens: Some(MAX_TOKENS),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Recognizer for OpenAIRecognizer {
    #[cfg(feature = "openai")]
    async fn recognize(&self, image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>> {
        let request = self.build_request(image)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AnimatchError::recognition(format!("OpenAI API error: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                AnimatchError::malformed("recognition", "Empty response from vision API")
            })?;
        tracing::debug!(model = %self.config.model, reply = %text.trim(), "Recognition reply");

        parse_character_names(&text)
    }

    #[cfg(not(feature = "openai"))]
    async fn recognize(&self, _image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>> {
        Err(AnimatchError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RecognizerConfig {
        RecognizerConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_gemini_model_swapped() {
        let recognizer = OpenAIRecognizer::new(config()).unwrap();
        assert_eq!(recognizer.model_name(), DEFAULT_OPENAI_VISION_MODEL);
    }

    #[test]
    fn test_image_url_forms() {
        assert_eq!(
            OpenAIRecognizer::image_url(&ImageInput::from_url("https://x/a.png")).unwrap(),
            "https://x/a.png"
        );
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let uri = OpenAIRecognizer::image_url(&ImageInput::from_bytes(png)).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_request_carries_prompt_and_temperature() {
        let recognizer = OpenAIRecognizer::new(RecognizerConfig {
            prompt: Some("List the characters.".to_string()),
            ..config()
        })
        .unwrap();
        let request = recognizer
            .build_request(&ImageInput::from_url("https://x/a.png"))
            .unwrap();

        assert_eq!(request.model, DEFAULT_OPENAI_VISION_MODEL);
        assert_eq!(request.temperature, Some(0.3));
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("List the characters."));
        assert!(json.contains("https://x/a.png"));
    }
}
