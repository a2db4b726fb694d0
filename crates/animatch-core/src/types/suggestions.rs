//! Recommendation types derived from an analysis.

use serde::{Deserialize, Serialize};

/// A series recommended from the detected characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedAnime {
    pub title: String,
    pub reason: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A character worth looking at next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedCharacter {
    pub name: String,
    pub anime: String,
    pub reason: String,
}

/// Where to continue watching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchNext {
    pub title: String,
    pub episode: String,
    pub description: String,
}

/// Recommendations recomputed for every analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsBundle {
    #[serde(default)]
    pub recommended_anime: Vec<RecommendedAnime>,
    #[serde(default)]
    pub suggested_characters: Vec<SuggestedCharacter>,
    #[serde(default)]
    pub watch_next: Vec<WatchNext>,
}

impl SuggestionsBundle {
    /// True when there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.recommended_anime.is_empty()
            && self.suggested_characters.is_empty()
            && self.watch_next.is_empty()
    }
}
