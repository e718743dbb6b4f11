//! Manifest data model: tiers, document entries, and the validated manifest.
//!
//! A [`Manifest`] is built once from a static source (see [`crate::format`])
//! and never mutated afterwards. Reloading means constructing a new one.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors from building or (de)serializing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to serialize TOML manifest: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON manifest error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("markdown manifest, line {line}: {reason}")]
    Markdown { line: usize, reason: String },

    #[error("markdown manifest has no table with id, title, path and tier columns")]
    MissingTable,

    #[error("document {id:?} cannot be written as a markdown row: {reason}")]
    Unrepresentable { id: String, reason: String },

    #[error("cannot determine manifest format for {0:?}")]
    UnknownFormat(String),

    #[error("manifest validation error: {0}")]
    Validation(String),
}

/// An unrecognized tier value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tier {0:?}: expected one of high, medium, low")]
pub struct InvalidTier(pub String);

/// Priority classification governing default load order.
///
/// The derived ordering is the load order: `High < Medium < Low`. Every
/// source format parses through [`FromStr`], so surrounding whitespace is
/// ignored and case variants are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Tier {
    High,
    Medium,
    Low,
}

impl Tier {
    /// All tiers in load order.
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Medium, Tier::Low];

    /// The textual form used in manifest sources.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Tier {
    type Error = InvalidTier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Tier {
    type Err = InvalidTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(Tier::High),
            "medium" => Ok(Tier::Medium),
            "low" => Ok(Tier::Low),
            _ => Err(InvalidTier(s.to_string())),
        }
    }
}

/// One row of the manifest: a retrievable topic document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Stable short name, unique across the manifest.
    pub id: String,
    /// Display label.
    pub title: String,
    /// Relative retrieval location.
    pub path: String,
    /// Load priority.
    pub tier: Tier,
}

impl DocumentEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        path: impl Into<String>,
        tier: Tier,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: path.into(),
            tier,
        }
    }
}

/// The immutable, ordered table of topic entries.
///
/// Entries keep their authored order. Ids are unique; this is checked when
/// the manifest is constructed, not when documents are retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<DocumentEntry>,
    by_id: HashMap<String, usize>,
}

impl Manifest {
    /// Build a manifest from entries in authored order.
    pub fn new(entries: Vec<DocumentEntry>) -> Result<Self, ManifestError> {
        let mut by_id = HashMap::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if entry.id.is_empty() {
                return Err(ManifestError::Validation(format!(
                    "documents[{i}].id must not be empty"
                )));
            }
            if entry.id.trim() != entry.id {
                return Err(ManifestError::Validation(format!(
                    "documents[{i}].id {:?} has surrounding whitespace",
                    entry.id
                )));
            }
            if entry.path.trim().is_empty() {
                return Err(ManifestError::Validation(format!(
                    "documents[{i}].path must not be empty (id {:?})",
                    entry.id
                )));
            }
            if let Some(first) = by_id.insert(entry.id.clone(), i) {
                return Err(ManifestError::Validation(format!(
                    "documents[{i}]: duplicate id {:?} (first defined at documents[{first}])",
                    entry.id
                )));
            }
        }

        Ok(Self { entries, by_id })
    }

    /// All entries in authored order.
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    /// Look up an entry by exact id.
    pub fn get(&self, id: &str) -> Option<&DocumentEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a DocumentEntry;
    type IntoIter = std::slice::Iter<'a, DocumentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, tier: Tier) -> DocumentEntry {
        DocumentEntry::new(id, id.to_uppercase(), format!("references/{id}.md"), tier)
    }

    #[test]
    fn test_tier_order_is_load_order() {
        assert!(Tier::High < Tier::Medium);
        assert!(Tier::Medium < Tier::Low);
        assert_eq!(Tier::ALL, [Tier::High, Tier::Medium, Tier::Low]);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("high".parse::<Tier>().unwrap(), Tier::High);
        assert_eq!(" medium ".parse::<Tier>().unwrap(), Tier::Medium);
        assert_eq!("low".parse::<Tier>().unwrap(), Tier::Low);
    }

    #[test]
    fn test_tier_rejects_unknown_and_case_variants() {
        assert_eq!(
            "urgent".parse::<Tier>().unwrap_err(),
            InvalidTier("urgent".to_string())
        );
        assert!("High".parse::<Tier>().is_err());
        assert!("".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_display_matches_parse() {
        for tier in Tier::ALL {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
    }

    #[test]
    fn test_tier_deserializes_like_from_str() {
        let entry: DocumentEntry = toml::from_str(
            "id = \"ssr\"\ntitle = \"SSR\"\npath = \"ssr.md\"\ntier = \" high \"\n",
        )
        .unwrap();
        assert_eq!(entry.tier, Tier::High);

        let entry: DocumentEntry = serde_json::from_str(
            r#"{"id": "ssr", "title": "SSR", "path": "ssr.md", "tier": "low\n"}"#,
        )
        .unwrap();
        assert_eq!(entry.tier, Tier::Low);

        let err = serde_json::from_str::<DocumentEntry>(
            r#"{"id": "ssr", "title": "SSR", "path": "ssr.md", "tier": "High"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid tier"), "{err}");

        assert_eq!(serde_json::to_string(&Tier::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_manifest_preserves_authored_order() {
        let manifest = Manifest::new(vec![
            entry("ssr", Tier::High),
            entry("routing", Tier::Low),
            entry("images", Tier::High),
        ])
        .unwrap();

        let ids: Vec<&str> = manifest.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ssr", "routing", "images"]);
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.get("routing").unwrap().tier, Tier::Low);
    }

    #[test]
    fn test_manifest_rejects_duplicate_ids() {
        let err = Manifest::new(vec![
            entry("ssr", Tier::High),
            entry("images", Tier::Medium),
            entry("ssr", Tier::Low),
        ])
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("duplicate id \"ssr\""), "{msg}");
        assert!(msg.contains("documents[0]"), "{msg}");
    }

    #[test]
    fn test_manifest_rejects_empty_id() {
        let result = Manifest::new(vec![entry("", Tier::High)]);
        assert!(matches!(result, Err(ManifestError::Validation(_))));
    }

    #[test]
    fn test_manifest_rejects_padded_id() {
        let result = Manifest::new(vec![entry(" ssr", Tier::High)]);
        assert!(matches!(result, Err(ManifestError::Validation(_))));
    }

    #[test]
    fn test_manifest_rejects_empty_path() {
        let result = Manifest::new(vec![DocumentEntry::new("ssr", "SSR", "  ", Tier::High)]);
        assert!(matches!(result, Err(ManifestError::Validation(_))));
    }

    #[test]
    fn test_empty_manifest_is_valid() {
        let manifest = Manifest::new(Vec::new()).unwrap();
        assert!(manifest.is_empty());
        assert!(manifest.get("anything").is_none());
    }

    #[test]
    fn test_get_is_case_sensitive() {
        let manifest = Manifest::new(vec![entry("images", Tier::High)]).unwrap();
        assert!(manifest.get("images").is_some());
        assert!(manifest.get("Images").is_none());
        assert!(manifest.get("").is_none());
    }
}
