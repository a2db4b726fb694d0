//! Character knowledge lookup.
//!
//! The knowledge base is injected into the pipeline as a read-only service so
//! tests can substitute a fixture dataset.

mod builtin;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnimatchError, AnimatchResult};
use crate::types::CharacterRecord;

pub use builtin::builtin_records;

/// How character names are matched against the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Case-sensitive exact match.
    #[default]
    Exact,
    /// Exact match first, then a case-insensitive fallback.
    CaseInsensitive,
}

/// Read-only mapping from character name to reference data.
pub trait KnowledgeLookup: Send + Sync {
    /// Resolve a name to its record, or `None` when unknown.
    fn resolve(&self, name: &str) -> Option<&CharacterRecord>;

    /// Number of known characters.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory knowledge base.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: Vec<CharacterRecord>,
    by_name: HashMap<String, usize>,
    by_folded_name: HashMap<String, usize>,
    matching: NameMatching,
}

/// On-disk dataset layout: `{ "characters": [ ... ] }`.
#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    characters: Vec<CharacterRecord>,
}

impl KnowledgeBase {
    /// Build a knowledge base from records.
    ///
    /// Names must be unique; a repeated name is a configuration error.
    pub fn new(records: Vec<CharacterRecord>) -> AnimatchResult<Self> {
        let mut by_name = HashMap::with_capacity(records.len());
        let mut by_folded_name = HashMap::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(AnimatchError::Configuration(format!(
                    "Knowledge record #{} has an empty name",
                    idx
                )));
            }
            if by_name.insert(record.name.clone(), idx).is_some() {
                return Err(AnimatchError::Configuration(format!(
                    "Duplicate knowledge record for '{}'",
                    record.name
                )));
            }
            by_folded_name
                .entry(record.name.to_lowercase())
                .or_insert(idx);
        }

        Ok(Self {
            records,
            by_name,
            by_folded_name,
            matching: NameMatching::Exact,
        })
    }

    /// The sample dataset shipped with animatch.
    pub fn builtin() -> Self {
        // Built-in records have unique, non-empty names.
        Self::new(builtin_records()).unwrap_or_default()
    }

    /// Load records from a JSON, YAML or TOML file.
    ///
    /// JSON and YAML accept either a bare list of records or
    /// `{ characters: [...] }`; TOML requires the `characters` table array.
    pub fn from_file(path: impl AsRef<Path>) -> AnimatchResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str());

        let records = match ext {
            Some("json") => parse_json_records(&content)?,
            Some("yaml" | "yml") => parse_yaml_records(&content)?,
            Some("toml") => toml::from_str::<KnowledgeFile>(&content)
                .map(|f| f.characters)
                .map_err(|e| AnimatchError::Configuration(e.to_string()))?,
            _ => {
                return Err(AnimatchError::Configuration(
                    "Unsupported knowledge file format. Use .json, .yaml or .toml".to_string(),
                ))
            }
        };

        tracing::info!(path = %path.display(), count = records.len(), "Loaded knowledge base");
        Self::new(records)
    }

    /// Set the name matching mode.
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    pub fn matching(&self) -> NameMatching {
        self.matching
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[CharacterRecord] {
        &self.records
    }
}

fn parse_json_records(content: &str) -> AnimatchResult<Vec<CharacterRecord>> {
    if let Ok(file) = serde_json::from_str::<KnowledgeFile>(content) {
        return Ok(file.characters);
    }
    serde_json::from_str::<Vec<CharacterRecord>>(content)
        .map_err(|e| AnimatchError::Configuration(format!("Invalid knowledge JSON: {}", e)))
}

fn parse_yaml_records(content: &str) -> AnimatchResult<Vec<CharacterRecord>> {
    if let Ok(file) = serde_yaml::from_str::<KnowledgeFile>(content) {
        return Ok(file.characters);
    }
    serde_yaml::from_str::<Vec<CharacterRecord>>(content)
        .map_err(|e| AnimatchError::Configuration(format!("Invalid knowledge YAML: {}", e)))
}

impl KnowledgeLookup for KnowledgeBase {
    fn resolve(&self, name: &str) -> Option<&CharacterRecord> {
        let idx = match self.by_name.get(name) {
            Some(idx) => Some(*idx),
            None if self.matching == NameMatching::CaseInsensitive => {
                self.by_folded_name.get(&name.trim().to_lowercase()).copied()
            }
            None => None,
        };
        idx.and_then(|i| self.records.get(i))
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
