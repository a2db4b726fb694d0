//! Character reference data.

use serde::{Deserialize, Serialize};

/// A place where a character's series can be streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingPlatform {
    pub name: String,
    pub url: String,
}

impl StreamingPlatform {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Static descriptive attributes for one anime character.
///
/// Records are immutable reference data keyed by `name`. Both snake_case and
/// camelCase field spellings are accepted when loading a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Unique character name.
    pub name: String,
    /// English display name, when it differs from `name`.
    #[serde(
        default,
        alias = "englishName",
        skip_serializing_if = "Option::is_none"
    )]
    pub english_name: Option<String>,
    /// Title of the anime the character belongs to.
    #[serde(alias = "anime", alias = "animeTitle")]
    pub anime_title: String,
    /// Free-text description, used as embedding input.
    pub description: String,
    /// Names of related characters, candidates for similarity ranking.
    #[serde(
        default,
        alias = "related_characters",
        alias = "relatedCharacters",
        alias = "relatedNames"
    )]
    pub related_names: Vec<String>,
    #[serde(default, alias = "streamingPlatforms")]
    pub streaming_platforms: Vec<StreamingPlatform>,
    #[serde(
        default,
        alias = "appearances",
        alias = "notableAppearances"
    )]
    pub notable_appearances: Vec<String>,
}

impl CharacterRecord {
    /// Create a record with no relations, platforms or appearances.
    pub fn new(
        name: impl Into<String>,
        anime_title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            english_name: None,
            anime_title: anime_title.into(),
            description: description.into(),
            related_names: Vec::new(),
            streaming_platforms: Vec::new(),
            notable_appearances: Vec::new(),
        }
    }

    pub fn with_related<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_appearances<I, S>(mut self, appearances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notable_appearances = appearances.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_platform(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.streaming_platforms
            .push(StreamingPlatform::new(name, url));
        self
    }

    pub fn with_english_name(mut self, english_name: impl Into<String>) -> Self {
        self.english_name = Some(english_name.into());
        self
    }

    /// Text fed to the embedding provider: `name + " " + description`.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }

    /// English name, falling back to the record name.
    pub fn display_name(&self) -> &str {
        self.english_name.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text() {
        let record = CharacterRecord::new("Vegeta", "Dragon Ball", "Prince of the Saiyans.");
        assert_eq!(record.embedding_text(), "Vegeta Prince of the Saiyans.");
    }

    #[test]
    fn test_accepts_camel_case_fields() {
        let json = r#"{
            "name": "Nami",
            "anime": "One Piece",
            "description": "Navigator of the Straw Hat Pirates.",
            "relatedCharacters": ["Monkey D. Luffy"],
            "streamingPlatforms": [{"name": "Crunchyroll", "url": "https://example.com"}],
            "appearances": ["One Piece"]
        }"#;
        let record: CharacterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.anime_title, "One Piece");
        assert_eq!(record.related_names, vec!["Monkey D. Luffy"]);
        assert_eq!(record.streaming_platforms[0].name, "Crunchyroll");
        assert_eq!(record.notable_appearances, vec!["One Piece"]);
    }

    #[test]
    fn test_accepts_snake_case_related_characters() {
        let json = r#"{
            "name": "Sanji",
            "anime_title": "One Piece",
            "description": "Cook.",
            "related_characters": ["Roronoa Zoro"]
        }"#;
        let record: CharacterRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.related_names, vec!["Roronoa Zoro"]);
        assert!(record.streaming_platforms.is_empty());
        assert_eq!(record.display_name(), "Sanji");
    }
}
