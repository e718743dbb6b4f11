//! Reference index: tier-aware lookups over an immutable manifest.
//!
//! The index is stateless after construction: every operation is a pure
//! lookup, so an `Arc<ReferenceIndex>` can be shared across threads and
//! tasks without locking.

use std::collections::BTreeMap;

use crate::manifest::{DocumentEntry, InvalidTier, Manifest, Tier};

/// Errors from index lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    InvalidTier(#[from] InvalidTier),

    #[error("no document with id {0:?}")]
    NotFound(String),
}

/// Priority-ordered lookup over a [`Manifest`].
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    manifest: Manifest,
    /// Positions into the manifest, sorted by tier and stable within a tier.
    load_order: Vec<usize>,
}

impl ReferenceIndex {
    /// Build the index, precomputing the default load order.
    pub fn new(manifest: Manifest) -> Self {
        let mut load_order: Vec<usize> = (0..manifest.len()).collect();
        // sort_by_key is stable, so authored order survives within a tier
        load_order.sort_by_key(|&i| manifest.entries()[i].tier);
        Self {
            manifest,
            load_order,
        }
    }

    /// The underlying manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// All entries in authored order, optionally restricted to `tiers`.
    pub fn list(&self, tiers: Option<&[Tier]>) -> Vec<&DocumentEntry> {
        self.manifest
            .iter()
            .filter(|e| tiers.is_none_or(|t| t.contains(&e.tier)))
            .collect()
    }

    /// Like [`list`](Self::list), but with tier names as supplied by a caller.
    ///
    /// An empty slice means no filter. Fails on the first unrecognized name.
    pub fn list_named<S: AsRef<str>>(
        &self,
        tiers: &[S],
    ) -> Result<Vec<&DocumentEntry>, IndexError> {
        if tiers.is_empty() {
            return Ok(self.list(None));
        }
        let parsed = tiers
            .iter()
            .map(|t| t.as_ref().parse::<Tier>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.list(Some(&parsed)))
    }

    /// The entry with exactly this id.
    pub fn resolve(&self, id: &str) -> Result<&DocumentEntry, IndexError> {
        self.manifest
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))
    }

    /// Entries grouped high → medium → low, authored order within a tier.
    ///
    /// This is the default consumption order when no topic is requested.
    pub fn load_order(&self) -> Vec<&DocumentEntry> {
        self.load_order
            .iter()
            .map(|&i| &self.manifest.entries()[i])
            .collect()
    }

    /// Topic search: case-insensitive substring match on id or title,
    /// returned in load order.
    pub fn search(&self, query: &str) -> Vec<&DocumentEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.load_order()
            .into_iter()
            .filter(|e| {
                e.id.to_lowercase().contains(&query) || e.title.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Number of entries per tier. Tiers with no entries are omitted.
    pub fn tier_counts(&self) -> BTreeMap<Tier, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.manifest {
            *counts.entry(entry.tier).or_default() += 1;
        }
        counts
    }

    /// One-line description for logs and diagnostics.
    pub fn summary(&self) -> String {
        let counts = self.tier_counts();
        let per_tier: Vec<String> = Tier::ALL
            .iter()
            .map(|t| format!("{t}: {}", counts.get(t).copied().unwrap_or(0)))
            .collect();
        format!(
            "Reference index: {} documents ({})",
            self.manifest.len(),
            per_tier.join(", ")
        )
    }

    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }
}
