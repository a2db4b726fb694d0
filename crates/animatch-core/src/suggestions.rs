//! Suggestion synthesis.
//!
//! The rule-based synthesizer is deliberately simple; swap in another
//! [`Synthesizer`] to change how recommendations are derived.

use std::collections::HashSet;

use crate::types::{
    CharacterAnalysis, RecommendedAnime, SuggestedCharacter, SuggestionsBundle, WatchNext,
};

/// Derives recommendations from resolved characters. Must not fail.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, characters: &[CharacterAnalysis]) -> SuggestionsBundle;
}

/// Rule-based suggestions: one entry per distinct anime title plus the top
/// relations of each character.
#[derive(Debug, Clone)]
pub struct RuleBasedSynthesizer {
    /// Relations taken from each character for `suggested_characters`.
    pub relations_per_character: usize,
    /// Genres attached to every recommended anime.
    pub default_genres: Vec<String>,
}

impl Default for RuleBasedSynthesizer {
    fn default() -> Self {
        Self {
            relations_per_character: 2,
            default_genres: vec!["Action".to_string(), "Adventure".to_string()],
        }
    }
}

impl RuleBasedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Distinct anime titles in first-seen order.
fn distinct_titles(characters: &[CharacterAnalysis]) -> Vec<&str> {
    let mut seen = HashSet::new();
    characters
        .iter()
        .map(|c| c.anime.as_str())
        .filter(|title| seen.insert(*title))
        .collect()
}

impl Synthesizer for RuleBasedSynthesizer {
    fn synthesize(&self, characters: &[CharacterAnalysis]) -> SuggestionsBundle {
        let titles = distinct_titles(characters);

        let recommended_anime = titles
            .iter()
            .map(|title| RecommendedAnime {
                title: title.to_string(),
                reason: "Based on detected characters".to_string(),
                genres: self.default_genres.clone(),
            })
            .collect();

        let suggested_characters = characters
            .iter()
            .flat_map(|c| {
                c.related_characters
                    .iter()
                    .take(self.relations_per_character)
                    .map(move |rel| SuggestedCharacter {
                        name: rel.name.clone(),
                        anime: c.anime.clone(),
                        reason: format!("Similar to {}", c.name),
                    })
            })
            .collect();

        let watch_next = titles
            .iter()
            .map(|title| WatchNext {
                title: title.to_string(),
                episode: "Season 1, Episode 1".to_string(),
                description: "Continue your anime journey".to_string(),
            })
            .collect();

        SuggestionsBundle {
            recommended_anime,
            suggested_characters,
            watch_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CharacterRecord, RankedRelation};

    fn analysis(name: &str, anime: &str, related: &[(&str, f32)]) -> CharacterAnalysis {
        let record = CharacterRecord::new(name, anime, "desc");
        let relations = related
            .iter()
            .map(|(n, s)| RankedRelation::new(*n, *s))
            .collect();
        CharacterAnalysis::from_record(&record, relations)
    }

    #[test]
    fn test_same_anime_deduped() {
        let characters = vec![
            analysis("Naruto Uzumaki", "Naruto", &[]),
            analysis("Sasuke Uchiha", "Naruto", &[]),
        ];
        let bundle = RuleBasedSynthesizer::new().synthesize(&characters);
        assert_eq!(bundle.recommended_anime.len(), 1);
        assert_eq!(bundle.recommended_anime[0].title, "Naruto");
        assert_eq!(bundle.recommended_anime[0].genres, vec!["Action", "Adventure"]);
        assert_eq!(bundle.watch_next.len(), 1);
        assert_eq!(bundle.watch_next[0].episode, "Season 1, Episode 1");
    }

    #[test]
    fn test_titles_keep_first_seen_order() {
        let characters = vec![
            analysis("Vegeta", "Dragon Ball", &[]),
            analysis("Levi Ackerman", "Attack on Titan", &[]),
            analysis("Son Goku", "Dragon Ball", &[]),
        ];
        let bundle = RuleBasedSynthesizer::new().synthesize(&characters);
        let titles: Vec<_> = bundle.recommended_anime.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Dragon Ball", "Attack on Titan"]);
    }

    #[test]
    fn test_top_two_relations_with_reason() {
        let characters = vec![analysis(
            "Monkey D. Luffy",
            "One Piece",
            &[("Roronoa Zoro", 0.9), ("Nami", 0.8), ("Sanji", 0.7)],
        )];
        let bundle = RuleBasedSynthesizer::new().synthesize(&characters);
        assert_eq!(bundle.suggested_characters.len(), 2);
        assert_eq!(bundle.suggested_characters[0].name, "Roronoa Zoro");
        assert_eq!(bundle.suggested_characters[1].name, "Nami");
        assert_eq!(bundle.suggested_characters[0].anime, "One Piece");
        assert_eq!(
            bundle.suggested_characters[0].reason,
            "Similar to Monkey D. Luffy"
        );
    }

    #[test]
    fn test_empty_input() {
        let bundle = RuleBasedSynthesizer::new().synthesize(&[]);
        assert!(bundle.is_empty());
    }
}
