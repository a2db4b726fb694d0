//! The analysis pipeline.
//!
//! One run recognizes characters in an image, resolves them against the
//! knowledge base, ranks each character's related characters and derives
//! suggestions. Only recognition failures (and cancellation) abort a run;
//! unresolved names and failed embeddings are logged and skipped.

mod progress;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::deadline::with_deadline;
use crate::embedding_cache::CachedEmbedder;
use crate::error::{AnimatchError, AnimatchResult};
use crate::knowledge::KnowledgeLookup;
use crate::ranker::{RankingConfig, SimilarityRanker};
use crate::suggestions::{RuleBasedSynthesizer, Synthesizer};
use crate::traits::{Embedder, ImageGenerator, Recognizer};
use crate::types::{
    AnalysisResult, CharacterAnalysis, CharacterRecord, ImageInput, RecognizedCharacter,
};

pub(crate) use progress::PhaseTracker;
pub use progress::{AnalysisPhase, ProgressBus, ProgressEvent, ProgressObserver, ProgressSubscriber};

/// Pipeline behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound for every remote call, in seconds. `0` disables the bound.
    pub request_timeout_secs: u64,
    /// Request a portrait for each resolved character when an image
    /// generator is configured.
    pub generate_images: bool,
    /// Also request portraits for ranked relations.
    pub generate_relation_images: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            generate_images: true,
            generate_relation_images: false,
        }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// Orchestrates recognition, resolution, ranking and synthesis.
pub struct AnalysisPipeline {
    recognizer: Arc<dyn Recognizer>,
    embedder: Arc<dyn Embedder>,
    knowledge: Arc<dyn KnowledgeLookup>,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    synthesizer: Arc<dyn Synthesizer>,
    ranking: RankingConfig,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// Create a pipeline with default ranking and suggestion rules.
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        embedder: Arc<dyn Embedder>,
        knowledge: Arc<dyn KnowledgeLookup>,
    ) -> Self {
        Self {
            recognizer,
            embedder,
            knowledge,
            image_generator: None,
            synthesizer: Arc::new(RuleBasedSynthesizer::default()),
            ranking: RankingConfig::default(),
            config: PipelineConfig::default(),
        }
    }

    pub fn builder(
        recognizer: Arc<dyn Recognizer>,
        embedder: Arc<dyn Embedder>,
        knowledge: Arc<dyn KnowledgeLookup>,
    ) -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder {
            pipeline: Self::new(recognizer, embedder, knowledge),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    /// Analyze an image.
    pub async fn analyze(
        &self,
        image: &ImageInput,
        observer: Option<&dyn ProgressObserver>,
    ) -> AnimatchResult<AnalysisResult> {
        self.analyze_with_cancellation(image, observer, &CancellationToken::new())
            .await
    }

    /// Analyze an image, abandoning in-flight calls once `cancel` fires.
    ///
    /// A cancelled run returns [`AnimatchError::Cancelled`] and discards any
    /// partial results.
    pub async fn analyze_with_cancellation(
        &self,
        image: &ImageInput,
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> AnimatchResult<AnalysisResult> {
        let mut tracker = PhaseTracker::new(observer);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnimatchError::Cancelled),
            result = self.run(image, &mut tracker) => result,
        };

        if let Err(e) = &outcome {
            tracker.fail(e);
        }
        outcome
    }

    async fn run(
        &self,
        image: &ImageInput,
        tracker: &mut PhaseTracker<'_>,
    ) -> AnimatchResult<AnalysisResult> {
        let timeout = self.config.request_timeout();

        tracker.advance(AnalysisPhase::Recognizing, "Recognizing characters...")?;
        let recognized = with_deadline(
            "Recognition",
            timeout,
            self.recognizer.recognize(image),
        )
        .await?;
        let recognized = dedupe_recognized(recognized);
        tracing::info!(count = recognized.len(), model = self.recognizer.model_name(), "Characters recognized");

        tracker.advance(AnalysisPhase::Resolving, "Gathering character details...")?;
        let resolved = self.resolve(&recognized);

        tracker.advance(AnalysisPhase::Ranking, "Finding similar characters...")?;
        // Fresh cache per run; vectors are never reused across analyses.
        let embedder: Arc<dyn Embedder> = Arc::new(CachedEmbedder::new(self.embedder.clone()));
        let mut ranker = SimilarityRanker::new(embedder, self.knowledge.clone())
            .with_config(self.ranking.clone());
        if let Some(timeout) = timeout {
            ranker = ranker.with_timeout(timeout);
        }

        let mut characters = Vec::with_capacity(resolved.len());
        for (recognized, record) in resolved {
            tracker.report(format!("Finding similar characters for {}...", record.name));
            let relations = ranker.rank_related(record).await;

            let mut analysis = CharacterAnalysis::from_record(record, relations);
            analysis.confidence = recognized.confidence;
            self.enrich_images(&mut analysis, timeout).await;
            characters.push(analysis);
        }

        tracker.advance(AnalysisPhase::Synthesizing, "Generating suggestions...")?;
        let suggestions = self.synthesizer.synthesize(&characters);

        tracker.advance(
            AnalysisPhase::Done,
            format!("Found {} character(s)", characters.len()),
        )?;

        Ok(AnalysisResult {
            characters,
            suggestions,
        })
    }

    /// Resolve recognized names, dropping those the knowledge base lacks.
    fn resolve<'a>(
        &'a self,
        recognized: &'a [RecognizedCharacter],
    ) -> Vec<(&'a RecognizedCharacter, &'a CharacterRecord)> {
        // Different spellings can resolve to one record; keep the first.
        let mut seen = HashSet::new();
        recognized
            .iter()
            .filter_map(|candidate| match self.knowledge.resolve(&candidate.name) {
                Some(record) if !seen.insert(record.name.as_str()) => {
                    tracing::debug!(name = %candidate.name, record = %record.name, "Character already resolved, skipping");
                    None
                }
                Some(record) => Some((candidate, record)),
                None => {
                    tracing::warn!(name = %candidate.name, "Recognized character not in knowledge base, dropping");
                    None
                }
            })
            .collect()
    }

    async fn enrich_images(&self, analysis: &mut CharacterAnalysis, timeout: Option<Duration>) {
        let Some(generator) = self.image_generator.as_deref() else {
            return;
        };
        if !self.config.generate_images {
            return;
        }

        analysis.image = generate_image(generator, &analysis.name, &analysis.description, timeout).await;

        if !self.config.generate_relation_images {
            return;
        }
        for relation in &mut analysis.related_characters {
            if let Some(record) = self.knowledge.resolve(&relation.name) {
                relation.image =
                    generate_image(generator, &record.name, &record.description, timeout).await;
            }
        }
    }
}

/// Request a portrait; any failure or empty answer means no image.
async fn generate_image(
    generator: &dyn ImageGenerator,
    name: &str,
    description: &str,
    timeout: Option<Duration>,
) -> Option<String> {
    match with_deadline("Image generation", timeout, generator.generate(name, description)).await {
        Ok(Some(image)) if !image.trim().is_empty() => Some(image.trim().to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(character = %name, error = %e, "Image generation failed");
            None
        }
    }
}

/// Keep the first occurrence of each recognized name.
fn dedupe_recognized(recognized: Vec<RecognizedCharacter>) -> Vec<RecognizedCharacter> {
    let mut seen = HashSet::new();
    recognized
        .into_iter()
        .filter(|c| seen.insert(c.name.clone()))
        .collect()
}

/// Builder for [`AnalysisPipeline`].
pub struct AnalysisPipelineBuilder {
    pipeline: AnalysisPipeline,
}

impl AnalysisPipelineBuilder {
    pub fn image_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.pipeline.image_generator = Some(generator);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.pipeline.synthesizer = synthesizer;
        self
    }

    pub fn ranking(mut self, ranking: RankingConfig) -> Self {
        self.pipeline.ranking = ranking;
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.pipeline.config = config;
        self
    }

    pub fn build(self) -> AnalysisPipeline {
        self.pipeline
    }
}
