//! Analysis result types.

use serde::{Deserialize, Serialize};

use super::character::{CharacterRecord, StreamingPlatform};
use super::suggestions::SuggestionsBundle;

/// A character name reported by a recognition provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedCharacter {
    pub name: String,
    /// Provider confidence, when reported. Not used for ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RecognizedCharacter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A related character annotated with its similarity to the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRelation {
    pub name: String,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl RankedRelation {
    pub fn new(name: impl Into<String>, similarity: f32) -> Self {
        Self {
            name: name.into(),
            similarity,
            image: None,
        }
    }
}

/// One resolved character with its ranked relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAnalysis {
    pub name: String,
    pub english_name: String,
    pub anime: String,
    pub description: String,
    /// Sorted by descending similarity.
    pub related_characters: Vec<RankedRelation>,
    pub streaming_platforms: Vec<StreamingPlatform>,
    pub appearances: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl CharacterAnalysis {
    /// Build a result entry from a knowledge record and its ranked relations.
    pub fn from_record(record: &CharacterRecord, related_characters: Vec<RankedRelation>) -> Self {
        Self {
            name: record.name.clone(),
            english_name: record.display_name().to_string(),
            anime: record.anime_title.clone(),
            description: record.description.clone(),
            related_characters,
            streaming_platforms: record.streaming_platforms.clone(),
            appearances: record.notable_appearances.clone(),
            image: None,
            confidence: None,
        }
    }

    /// Text fed to the embedding provider: `name + " " + description`.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}

/// Output of one analysis run.
///
/// `characters` keeps recognition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub characters: Vec<CharacterAnalysis>,
    pub suggestions: SuggestionsBundle,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn character(&self, name: &str) -> Option<&CharacterAnalysis> {
        self.characters.iter().find(|c| c.name == name)
    }
}
