//! animatch-vision - Character recognition providers for animatch.
//!
//! # Supported Providers
//!
//! - **Gemini** - `generateContent` with the image inlined as base64, or
//!   referenced by URL
//! - **OpenAI** (feature: `openai`) - GPT-4o style vision chat completions
//!
//! A Gemini-backed [`GeminiImageGenerator`] supplies optional portrait
//! references for analysed characters.
//!
//! # Example
//!
//! ```ignore
//! use animatch_vision::RecognizerFactory;
//!
//! let recognizer = RecognizerFactory::gemini()?;
//! let characters = recognizer.recognize(&ImageInput::from_path("shot.png")?).await?;
//! ```

mod factory;
mod gemini;
mod openai;
pub mod prompts;

pub use factory::RecognizerFactory;
pub use gemini::{GeminiImageGenerator, GeminiRecognizer};
pub use openai::{OpenAIRecognizer, DEFAULT_OPENAI_VISION_MODEL};

// Re-export core types for convenience
pub use animatch_core::traits::{
    ImageGenerator, ImageGeneratorConfig, Recognizer, RecognizerConfig, RecognizerProvider,
};
