//! animatch-embeddings - Embedding provider implementations for animatch.
//!
//! # Supported Providers
//!
//! - **Gemini** - `text-embedding-004` via the `embedContent` REST endpoint
//! - **OpenAI** (feature: `openai`) - text-embedding-3-small, text-embedding-3-large, etc.
//!
//! # Example
//!
//! ```ignore
//! use animatch_embeddings::EmbedderFactory;
//!
//! // Gemini, reading GEMINI_API_KEY
//! let embedder = EmbedderFactory::gemini()?;
//!
//! // Or OpenAI with a specific model
//! let embedder = EmbedderFactory::openai_with_model("text-embedding-3-large", 3072)?;
//! ```

mod factory;
mod gemini;
mod openai;

pub use factory::EmbedderFactory;
pub use gemini::GeminiEmbedder;
pub use openai::{OpenAIEmbedder, DEFAULT_OPENAI_EMBEDDING_MODEL};

// Re-export core types for convenience
pub use animatch_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
