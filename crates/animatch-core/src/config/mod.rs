//! Configuration system for animatch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AnimatchError, AnimatchResult};
use crate::knowledge::{KnowledgeBase, NameMatching};
use crate::pipeline::PipelineConfig;
use crate::ranker::RankingConfig;
use crate::traits::{
    EmbedderConfig, EmbedderProvider, ImageGeneratorConfig, RecognizerConfig, RecognizerProvider,
};

/// Embedder provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

/// Where character reference data comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Dataset file (JSON, YAML or TOML). The built-in dataset is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub name_matching: NameMatching,
}

/// Main animatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatchConfig {
    /// Embedder configuration.
    pub embedder: EmbedderProviderConfig,
    /// Vision recognizer configuration.
    pub recognizer: RecognizerConfig,
    /// Portrait generation (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_generator: Option<ImageGeneratorConfig>,
    pub ranking: RankingConfig,
    pub pipeline: PipelineConfig,
    pub knowledge: KnowledgeConfig,
}

impl Default for AnimatchConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderProviderConfig::default(),
            recognizer: RecognizerConfig::default(),
            image_generator: Some(ImageGeneratorConfig::default()),
            ranking: RankingConfig::default(),
            pipeline: PipelineConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl AnimatchConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> AnimatchResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| AnimatchError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| AnimatchError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| AnimatchError::Configuration(e.to_string())),
            _ => Err(AnimatchError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> AnimatchResult<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay settings from an environment lookup.
    pub fn apply_env<F>(&mut self, var: F) -> AnimatchResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = var("ANIMATCH_EMBEDDER_PROVIDER") {
            self.embedder.provider = provider.parse()?;
        }
        if let Some(model) = var("ANIMATCH_EMBEDDING_MODEL") {
            self.embedder.config.model = model;
        }
        if let Some(model) = var("ANIMATCH_VISION_MODEL") {
            self.recognizer.model = model;
        }
        if let Some(top_k) = var("ANIMATCH_TOP_K") {
            self.ranking.top_k = parse_number("ANIMATCH_TOP_K", &top_k)?;
        }
        if let Some(secs) = var("ANIMATCH_TIMEOUT_SECS") {
            self.pipeline.request_timeout_secs = parse_number("ANIMATCH_TIMEOUT_SECS", &secs)?;
        }
        if let Some(path) = var("ANIMATCH_KNOWLEDGE_PATH") {
            self.knowledge.path = Some(PathBuf::from(path));
        }

        // API keys go to whichever components use that provider.
        if let Some(key) = var("GEMINI_API_KEY") {
            if self.embedder.provider == EmbedderProvider::Gemini {
                self.embedder.config.api_key.get_or_insert(key.clone());
            }
            if self.recognizer.provider == RecognizerProvider::Gemini {
                self.recognizer.api_key.get_or_insert(key.clone());
            }
            if let Some(generator) = self.image_generator.as_mut() {
                generator.api_key.get_or_insert(key);
            }
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            if self.embedder.provider == EmbedderProvider::OpenAI {
                self.embedder.config.api_key.get_or_insert(key.clone());
            }
            if self.recognizer.provider == RecognizerProvider::OpenAI {
                self.recognizer.api_key.get_or_insert(key);
            }
        }

        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> AnimatchConfigBuilder {
        AnimatchConfigBuilder::default()
    }

    /// Bound applied to every remote call.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.pipeline.request_timeout()
    }

    /// Load the configured knowledge base, or the built-in dataset.
    pub fn load_knowledge(&self) -> AnimatchResult<KnowledgeBase> {
        let knowledge = match &self.knowledge.path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading knowledge base");
                KnowledgeBase::from_file(path)?
            }
            None => KnowledgeBase::builtin(),
        };
        Ok(knowledge.with_matching(self.knowledge.name_matching))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> AnimatchResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnimatchError::Configuration(format!("{} must be a number, got '{}'", key, value)))
}

/// Builder for AnimatchConfig.
#[derive(Default)]
pub struct AnimatchConfigBuilder {
    config: AnimatchConfig,
}

impl AnimatchConfigBuilder {
    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set recognizer configuration.
    pub fn recognizer(mut self, config: RecognizerConfig) -> Self {
        self.config.recognizer = config;
        self
    }

    /// Set or clear image generator configuration.
    pub fn image_generator(mut self, config: Option<ImageGeneratorConfig>) -> Self {
        self.config.image_generator = config;
        self
    }

    pub fn ranking(mut self, config: RankingConfig) -> Self {
        self.config.ranking = config;
        self
    }

    pub fn pipeline(mut self, config: PipelineConfig) -> Self {
        self.config.pipeline = config;
        self
    }

    pub fn knowledge(mut self, config: KnowledgeConfig) -> Self {
        self.config.knowledge = config;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AnimatchConfig {
        self.config
    }
}
