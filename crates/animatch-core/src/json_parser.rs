//! JSON parsing utilities for model responses.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AnimatchError, AnimatchResult};
use crate::types::RecognizedCharacter;

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[a-zA-Z0-9]*\n?([\s\S]*?)\n?```$").expect("valid code block regex"));

static THINK_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think tag regex"));

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array regex"));

/// Remove a surrounding code fence and any thinking tags from a response.
pub fn remove_code_blocks(content: &str) -> String {
    let content = content.trim();

    let content = CODE_BLOCK
        .captures(content)
        .and_then(|c| c.get(1).map(|m| m.as_str().trim()))
        .unwrap_or(content);

    THINK_TAGS.replace_all(content, "").trim().to_string()
}

/// One element of a recognition array: a bare name or an object with `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, alias = "score")]
        confidence: Option<f32>,
    },
}

impl NameEntry {
    fn into_recognized(self) -> Option<RecognizedCharacter> {
        let (name, confidence) = match self {
            NameEntry::Name(name) => (name, None),
            NameEntry::Detailed { name, confidence } => (name, confidence),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(RecognizedCharacter {
            name: name.to_string(),
            confidence,
        })
    }
}

fn into_characters(entries: Vec<NameEntry>) -> Vec<RecognizedCharacter> {
    entries
        .into_iter()
        .filter_map(NameEntry::into_recognized)
        .collect()
}

/// Parse the character list out of a recognition model's text reply.
///
/// The reply is expected to be a JSON array of names. When the whole reply is
/// not valid JSON, the first `[...]` span is parsed instead; a reply with no
/// array at all means no characters were found. A span that looks like an
/// array but does not parse is a malformed response.
pub fn parse_character_names(response: &str) -> AnimatchResult<Vec<RecognizedCharacter>> {
    let cleaned = remove_code_blocks(response);
    if cleaned.is_empty() {
        return Ok(vec![]);
    }

    if let Ok(entries) = serde_json::from_str::<Vec<NameEntry>>(&cleaned) {
        return Ok(into_characters(entries));
    }

    tracing::debug!("Recognition reply is not a bare JSON array, extracting");

    let Some(span) = JSON_ARRAY.find(&cleaned) else {
        tracing::debug!("No JSON array in recognition reply");
        return Ok(vec![]);
    };

    serde_json::from_str::<Vec<NameEntry>>(span.as_str())
        .map(into_characters)
        .map_err(|e| {
            AnimatchError::malformed(
                "recognition",
                format!("Failed to parse character names: {}", e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(parsed: &[RecognizedCharacter]) -> Vec<&str> {
        parsed.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_plain_array() {
        let parsed = parse_character_names(r#"["Naruto Uzumaki", "Sasuke Uchiha"]"#).unwrap();
        assert_eq!(names(&parsed), vec!["Naruto Uzumaki", "Sasuke Uchiha"]);
    }

    #[test]
    fn test_array_inside_prose() {
        let parsed = parse_character_names(r#"Here you go: ["A", "B"] enjoy"#).unwrap();
        assert_eq!(names(&parsed), vec!["A", "B"]);
    }

    #[test]
    fn test_multiline_array_in_code_block() {
        let input = "```json\n[\n  \"Vegeta\",\n  \"Son Goku\"\n]\n```";
        let parsed = parse_character_names(input).unwrap();
        assert_eq!(names(&parsed), vec!["Vegeta", "Son Goku"]);
    }

    #[test]
    fn test_no_array_is_empty() {
        assert!(parse_character_names("I could not find any characters.")
            .unwrap()
            .is_empty());
        assert!(parse_character_names("").unwrap().is_empty());
        assert!(parse_character_names("[]").unwrap().is_empty());
    }

    #[test]
    fn test_objects_with_confidence() {
        let parsed = parse_character_names(
            r#"[{"name": "Levi Ackerman", "confidence": 0.92}, {"name": "Eren Yeager", "score": 0.5}]"#,
        )
        .unwrap();
        assert_eq!(names(&parsed), vec!["Levi Ackerman", "Eren Yeager"]);
        assert_eq!(parsed[0].confidence, Some(0.92));
        assert_eq!(parsed[1].confidence, Some(0.5));
    }

    #[test]
    fn test_blank_names_dropped() {
        let parsed = parse_character_names(r#"["  ", " Nami "]"#).unwrap();
        assert_eq!(names(&parsed), vec!["Nami"]);
    }

    #[test]
    fn test_broken_array_is_malformed() {
        let err = parse_character_names("Characters: [Naruto, Sasuke]").unwrap_err();
        assert!(matches!(err, AnimatchError::MalformedResponse { .. }));
    }

    #[test]
    fn test_remove_think_tags() {
        let cleaned = remove_code_blocks("<think>hmm</think>[\"Nami\"]");
        assert_eq!(cleaned, "[\"Nami\"]");
    }
}
