//! animatch-core - Core library for animatch.
//!
//! This crate provides the types, provider traits, similarity ranking and the
//! analysis pipeline that turns an image of anime characters into character
//! details, related characters and viewing suggestions.
//!
//! # Example
//!
//! ```ignore
//! use animatch_core::{AnalysisPipeline, ImageInput, KnowledgeBase};
//!
//! let pipeline = AnalysisPipeline::new(recognizer, embedder, Arc::new(KnowledgeBase::builtin()));
//! let result = pipeline.analyze(&ImageInput::from_path("naruto.png")?, None).await?;
//!
//! for character in &result.characters {
//!     println!("{} ({})", character.name, character.anime);
//! }
//! ```

pub mod compare;
pub mod config;
pub mod deadline;
pub mod embedding_cache;
pub mod error;
pub mod json_parser;
pub mod knowledge;
pub mod pipeline;
pub mod ranker;
pub mod similarity;
pub mod suggestions;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use compare::{CharacterComparator, CharacterPairSimilarity, MAX_COMPARE_IMAGES};
pub use config::{AnimatchConfig, EmbedderProviderConfig, KnowledgeConfig};
pub use embedding_cache::CachedEmbedder;
pub use error::{AnimatchError, AnimatchResult, ErrorCode};
pub use knowledge::{KnowledgeBase, KnowledgeLookup, NameMatching};
pub use pipeline::{
    AnalysisPhase, AnalysisPipeline, AnalysisPipelineBuilder, PipelineConfig, ProgressBus,
    ProgressEvent, ProgressObserver, ProgressSubscriber,
};
pub use ranker::{RankingConfig, SimilarityRanker};
pub use similarity::{cosine_similarity, try_cosine_similarity, VectorError};
pub use suggestions::{RuleBasedSynthesizer, Synthesizer};
pub use traits::{
    Embedder, EmbedderConfig, EmbedderProvider, ImageGenerator, ImageGeneratorConfig, Recognizer,
    RecognizerConfig, RecognizerProvider,
};
pub use types::{
    AnalysisResult, CharacterAnalysis, CharacterRecord, ImageInput, InlineImage, RankedRelation,
    RecognizedCharacter, StreamingPlatform, SuggestionsBundle,
};
pub use tokio_util::sync::CancellationToken;
