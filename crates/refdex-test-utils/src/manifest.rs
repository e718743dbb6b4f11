//! Manifest builders for tests.
//!
//! Use [`TestManifestBuilder`] to create manifests without repeating entry
//! boilerplate across crate boundaries.

use refdex_core::{DocumentEntry, Manifest, ReferenceIndex, Tier};

/// Fluent builder for [`Manifest`] in tests.
///
/// # Example
///
/// ```ignore
/// let index = TestManifestBuilder::new()
///     .high("images")
///     .medium("pagination")
///     .build_index();
/// ```
pub struct TestManifestBuilder {
    entries: Vec<DocumentEntry>,
}

impl TestManifestBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The four-entry manifest used throughout the docs:
    /// images/high, ssr/high, pagination/medium, integrations/low.
    pub fn scenario() -> Self {
        Self::new()
            .high("images")
            .high("ssr")
            .medium("pagination")
            .low("integrations")
    }

    /// Add an entry titled after its id, stored at `references/<id>.md`.
    pub fn entry(self, id: &str, tier: Tier) -> Self {
        let title = title_case(id);
        self.entry_with(id, &title, &format!("references/{id}.md"), tier)
    }

    pub fn entry_with(mut self, id: &str, title: &str, path: &str, tier: Tier) -> Self {
        self.entries.push(DocumentEntry::new(id, title, path, tier));
        self
    }

    pub fn high(self, id: &str) -> Self {
        self.entry(id, Tier::High)
    }

    pub fn medium(self, id: &str) -> Self {
        self.entry(id, Tier::Medium)
    }

    pub fn low(self, id: &str) -> Self {
        self.entry(id, Tier::Low)
    }

    /// The raw entries, without validation.
    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn build(self) -> Manifest {
        Manifest::new(self.entries).expect("test manifest should be valid")
    }

    pub fn build_index(self) -> ReferenceIndex {
        ReferenceIndex::new(self.build())
    }
}

impl Default for TestManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn title_case(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
