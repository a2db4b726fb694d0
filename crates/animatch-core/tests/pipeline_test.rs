//! Integration tests for the analysis pipeline.
//!
//! Providers are stubbed; the knowledge base is a small fixture dataset.

use animatch_core::{
    AnalysisPhase, AnalysisPipeline, AnimatchError, AnimatchResult, CancellationToken,
    CharacterRecord, Embedder, ImageGenerator, ImageInput, KnowledgeBase, KnowledgeLookup,
    PipelineConfig, ProgressBus, ProgressEvent, ProgressObserver, RankingConfig, Recognizer,
    RecognizedCharacter,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct StubRecognizer {
    names: Vec<String>,
}

impl StubRecognizer {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Recognizer for StubRecognizer {
    async fn recognize(&self, _image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>> {
        Ok(self.names.iter().map(RecognizedCharacter::new).collect())
    }

    fn model_name(&self) -> &str {
        "stub-vision"
    }
}

/// Never answers; used to exercise cancellation and timeouts.
struct StalledRecognizer;

#[async_trait]
impl Recognizer for StalledRecognizer {
    async fn recognize(&self, _image: &ImageInput) -> AnimatchResult<Vec<RecognizedCharacter>> {
        std::future::pending().await
    }

    fn model_name(&self) -> &str {
        "stalled"
    }
}

/// Looks vectors up by character name prefix and counts every call.
struct TableEmbedder {
    vectors: HashMap<&'static str, Vec<f32>>,
    calls: AtomicUsize,
}

impl TableEmbedder {
    fn new(vectors: &[(&'static str, [f32; 3])]) -> Self {
        Self {
            vectors: vectors.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> AnimatchResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .iter()
            .find(|(name, _)| text.starts_with(*name))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| AnimatchError::embedding(format!("no vector for '{}'", text)))
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

struct PortraitGenerator;

#[async_trait]
impl ImageGenerator for PortraitGenerator {
    async fn generate(&self, name: &str, _description: &str) -> AnimatchResult<Option<String>> {
        if name.starts_with("Sasuke") {
            return Err(AnimatchError::image_generation("quota"));
        }
        Ok(Some(format!(
            " https://img.example/{}.png ",
            name.replace(' ', "_")
        )))
    }

    fn model_name(&self) -> &str {
        "portraits"
    }
}

fn fixture_knowledge() -> Arc<dyn KnowledgeLookup> {
    let records = vec![
        CharacterRecord::new("Naruto Uzumaki", "Naruto", "Orange ninja")
            .with_related(["Sasuke Uchiha", "Sakura Haruno"]),
        CharacterRecord::new("Sasuke Uchiha", "Naruto", "Avenger ninja")
            .with_related(["Naruto Uzumaki"]),
        CharacterRecord::new("Sakura Haruno", "Naruto", "Medical ninja"),
        CharacterRecord::new("Nami", "One Piece", "Navigator").with_related(["Sanji"]),
    ];
    Arc::new(KnowledgeBase::new(records).unwrap())
}

fn fixture_embedder() -> Arc<TableEmbedder> {
    Arc::new(TableEmbedder::new(&[
        ("Naruto Uzumaki", [1.0, 0.0, 0.0]),
        ("Sasuke Uchiha", [0.6, 0.8, 0.0]),
        ("Sakura Haruno", [0.9, 0.1, 0.0]),
        ("Nami", [0.0, 0.0, 1.0]),
    ]))
}

fn image() -> ImageInput {
    ImageInput::from_url("https://example.com/screenshot.png")
}

#[tokio::test]
async fn test_naruto_end_to_end() {
    let pipeline = AnalysisPipeline::new(
        Arc::new(StubRecognizer::new(&["Naruto Uzumaki"])),
        fixture_embedder(),
        fixture_knowledge(),
    );

    let result = pipeline.analyze(&image(), None).await.unwrap();

    assert_eq!(result.characters.len(), 1);
    let naruto = &result.characters[0];
    assert_eq!(naruto.name, "Naruto Uzumaki");
    assert_eq!(naruto.english_name, "Naruto Uzumaki");
    assert_eq!(naruto.anime, "Naruto");

    let related: Vec<_> = naruto
        .related_characters
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(related, vec!["Sakura Haruno", "Sasuke Uchiha"]);
    assert!(naruto
        .related_characters
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));

    assert_eq!(result.suggestions.recommended_anime.len(), 1);
    assert_eq!(result.suggestions.recommended_anime[0].title, "Naruto");
    assert_eq!(result.suggestions.suggested_characters.len(), 2);
    assert_eq!(
        result.suggestions.suggested_characters[0].reason,
        "Similar to Naruto Uzumaki"
    );
}

#[tokio::test]
async fn test_unresolved_name_dropped() {
    let pipeline = AnalysisPipeline::new(
        Arc::new(StubRecognizer::new(&["Nami", "Unknown Extra"])),
        fixture_embedder(),
        fixture_knowledge(),
    );

    let result = pipeline.analyze(&image(), None).await.unwrap();

    assert_eq!(result.characters.len(), 1);
    assert_eq!(result.characters[0].name, "Nami");
    // Sanji is not in the fixture dataset.
    assert!(result.characters[0].related_characters.is_empty());
}

#[tokio::test]
async fn test_no_characters_completes() {
    let seen = Mutex::new(Vec::new());
    let observer = |event: &ProgressEvent| seen.lock().unwrap().push(event.phase);

    let pipeline = AnalysisPipeline::new(
        Arc::new(StubRecognizer::new(&[])),
        fixture_embedder(),
        fixture_knowledge(),
    );

    let result = pipeline
        .analyze(&image(), Some(&observer as &dyn ProgressObserver))
        .await
        .unwrap();

    assert!(result.is_empty());
    assert!(result.suggestions.is_empty());
    assert_eq!(seen.lock().unwrap().last(), Some(&AnalysisPhase::Done));
}

#[tokio::test]
async fn test_embeddings_cached_within_run() {
    let embedder = fixture_embedder();
    let pipeline = AnalysisPipeline::new(
        Arc::new(StubRecognizer::new(&["Naruto Uzumaki", "Sasuke Uchiha"])),
        embedder.clone(),
        fixture_knowledge(),
    );

    let result = pipeline.analyze(&image(), None).await.unwrap();
    assert_eq!(result.characters.len(), 2);

    // Naruto, Sasuke and Sakura are each embedded once even though Naruto
    // and Sasuke appear both as subjects and as candidates.
    assert_eq!(embedder.calls(), 3);

    // A second run starts with an empty cache.
    pipeline.analyze(&image(), None).await.unwrap();
    assert_eq!(embedder.calls(), 6);
}

#[tokio::test]
async fn test_top_k_from_ranking_config() {
    let pipeline = AnalysisPipeline::builder(
        Arc::new(StubRecognizer::new(&["Naruto Uzumaki"])),
        fixture_embedder(),
        fixture_knowledge(),
    )
    .ranking(RankingConfig {
        top_k: 1,
        ..Default::default()
    })
    .build();

    let result = pipeline.analyze(&image(), None).await.unwrap();
    let related = &result.characters[0].related_characters;
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].name, "Sakura Haruno");
}

#[tokio::test]
async fn test_image_enrichment_degrades_per_character() {
    let pipeline = AnalysisPipeline::builder(
        Arc::new(StubRecognizer::new(&["Naruto Uzumaki", "Sasuke Uchiha"])),
        fixture_embedder(),
        fixture_knowledge(),
    )
    .image_generator(Arc::new(PortraitGenerator))
    .config(PipelineConfig {
        generate_relation_images: true,
        ..Default::default()
    })
    .build();

    let result = pipeline.analyze(&image(), None).await.unwrap();

    let naruto = result.character("Naruto Uzumaki").unwrap();
    assert_eq!(
        naruto.image.as_deref(),
        Some("https://img.example/Naruto_Uzumaki.png")
    );
    let sakura = naruto
        .related_characters
        .iter()
        .find(|r| r.name == "Sakura Haruno")
        .unwrap();
    assert!(sakura.image.is_some());

    let sasuke = result.character("Sasuke Uchiha").unwrap();
    assert!(sasuke.image.is_none());
}

#[tokio::test]
async fn test_cancelled_before_recognition_completes() {
    let bus = ProgressBus::new();
    let mut events = bus.subscribe();

    let pipeline = AnalysisPipeline::new(
        Arc::new(StalledRecognizer),
        fixture_embedder(),
        fixture_knowledge(),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = pipeline
        .analyze_with_cancellation(&image(), Some(&bus as &dyn ProgressObserver), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AnimatchError::Cancelled));
    assert_eq!(events.recv().await.unwrap().phase, AnalysisPhase::Recognizing);
    assert_eq!(events.recv().await.unwrap().phase, AnalysisPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_recognition_timeout_aborts() {
    let pipeline = AnalysisPipeline::builder(
        Arc::new(StalledRecognizer),
        fixture_embedder(),
        fixture_knowledge(),
    )
    .config(PipelineConfig {
        request_timeout_secs: 5,
        ..Default::default()
    })
    .build();

    let err = pipeline.analyze(&image(), None).await.unwrap_err();
    assert!(matches!(err, AnimatchError::Timeout { .. }));
}
