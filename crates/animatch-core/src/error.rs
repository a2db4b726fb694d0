//! Error types for animatch operations.
//!
//! Errors carry a structured [`ErrorCode`] for programmatic handling and an
//! optional suggestion for the user. Only failures that abort an analysis are
//! surfaced through this type; per-item degradations (unresolved names, failed
//! embeddings for a single candidate) are logged and skipped instead.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for animatch operations.
pub type AnimatchResult<T> = Result<T, AnimatchError>;

/// Main error type for all animatch operations.
#[derive(Error, Debug)]
pub enum AnimatchError {
    /// Character recognition call failed.
    #[error("Recognition error: {message}")]
    Recognition {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Image generation failed.
    #[error("Image generation error: {message}")]
    ImageGeneration { message: String, code: ErrorCode },

    /// A remote provider returned a payload of an unexpected shape.
    #[error("Malformed {stage} response: {message}")]
    MalformedResponse {
        stage: String,
        message: String,
        code: ErrorCode,
    },

    /// Input image could not be used.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication { message: String, code: ErrorCode },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        code: ErrorCode,
        retry_after: Option<u64>,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote call did not complete in time.
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: String, after: Duration },

    /// The analysis was cancelled by the caller.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Recognition (REC_xxx)
    RecConnectionFailed,
    RecFailed,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,

    // Image generation (IMG_xxx)
    ImgGenerationFailed,

    // Provider responses (RESP_xxx)
    RespMalformed,

    // Authentication (AUTH_xxx)
    AuthInvalidKey,

    // Rate Limit (RATE_xxx)
    RateLimitExceeded,

    // Network (NET_xxx)
    NetTimeout,
    NetConnectionFailed,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RecConnectionFailed => "REC_001",
            ErrorCode::RecFailed => "REC_002",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::ImgGenerationFailed => "IMG_001",
            ErrorCode::RespMalformed => "RESP_001",
            ErrorCode::AuthInvalidKey => "AUTH_001",
            ErrorCode::RateLimitExceeded => "RATE_001",
            ErrorCode::NetTimeout => "NET_001",
            ErrorCode::NetConnectionFailed => "NET_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl AnimatchError {
    /// Create a recognition error.
    pub fn recognition(message: impl Into<String>) -> Self {
        Self::Recognition {
            message: message.into(),
            code: ErrorCode::RecFailed,
            source: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an image generation error.
    pub fn image_generation(message: impl Into<String>) -> Self {
        Self::ImageGeneration {
            message: message.into(),
            code: ErrorCode::ImgGenerationFailed,
        }
    }

    /// Create a malformed provider response error for the given stage.
    pub fn malformed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            stage: stage.into(),
            message: message.into(),
            code: ErrorCode::RespMalformed,
        }
    }

    /// Create a timeout error for the given stage.
    pub fn timeout(stage: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            stage: stage.into(),
            after,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Recognition { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::ImageGeneration { code, .. } => *code,
            Self::MalformedResponse { code, .. } => *code,
            Self::Authentication { code, .. } => *code,
            Self::RateLimit { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Timeout { .. } => ErrorCode::NetTimeout,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Recognition { .. } => Some("Please check your vision provider configuration"),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::Authentication { .. } => Some("Please check your API key"),
            Self::RateLimit { .. } => Some("Please wait before making more requests"),
            Self::Timeout { .. } => Some("The provider is slow to respond; try again or raise the timeout"),
            Self::InvalidImage(_) => Some("Upload a PNG, JPEG, GIF or WebP image"),
            _ => None,
        }
    }

    /// Convert from an HTTP status code returned by a provider.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Authentication {
                message: body.to_string(),
                code: ErrorCode::AuthInvalidKey,
            },
            408 | 504 => Self::Network {
                message: body.to_string(),
                code: ErrorCode::NetTimeout,
                source: None,
            },
            429 => Self::RateLimit {
                message: body.to_string(),
                code: ErrorCode::RateLimitExceeded,
                retry_after: None,
            },
            _ => Self::Network {
                message: format!("HTTP {}: {}", status, body),
                code: ErrorCode::NetConnectionFailed,
                source: None,
            },
        }
    }
}
