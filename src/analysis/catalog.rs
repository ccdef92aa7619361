use std::collections::HashMap;

use rusqlite::Connection;

use crate::db::{list_reference_entries, DatabaseError};
use crate::models::ReferenceEntry;

/// Read-only mapping from canonical name to reference entry.
pub trait ReferenceCatalog: Send + Sync {
    /// Exact-match lookup on an already-normalized key.
    fn lookup(&self, canonical_name: &str) -> Option<&ReferenceEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot of the reference table held in memory. Built once and shared
/// behind an `Arc`; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: HashMap<String, ReferenceEntry>,
}

impl InMemoryCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (e.canonical_name.clone(), e))
            .collect();
        Self { entries }
    }

    /// Read the whole `biomarkers` table.
    pub fn load(conn: &Connection) -> Result<Self, DatabaseError> {
        let entries = list_reference_entries(conn)?;
        tracing::debug!(count = entries.len(), "Loaded reference catalog");
        Ok(Self::from_entries(entries))
    }

    /// Entries sorted by category then display name, for listing.
    pub fn sorted_entries(&self) -> Vec<&ReferenceEntry> {
        let mut list: Vec<_> = self.entries.values().collect();
        list.sort_by(|a, b| {
            a.category
                .as_deref()
                .unwrap_or("")
                .cmp(b.category.as_deref().unwrap_or(""))
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        list
    }
}

impl ReferenceCatalog for InMemoryCatalog {
    fn lookup(&self, canonical_name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(canonical_name)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn reference(name: &str, display: &str, unit: &str, min: f64, max: f64) -> ReferenceEntry {
        ReferenceEntry {
            canonical_name: name.into(),
            display_name: display.into(),
            unit: unit.into(),
            min_bound: min,
            max_bound: max,
            category: None,
            description: None,
            explanation: format!("{display} explanation"),
            advice_low: Some(format!("{display} low advice")),
            advice_high: Some(format!("{display} high advice")),
            advice_normal: Some(format!("{display} normal advice")),
        }
    }

    /// Small catalog used across classifier and endpoint tests.
    pub fn sample_catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_entries([
            reference("hemoglobine", "Hémoglobine", "g/dL", 13.0, 17.0),
            reference("vitamine_d", "Vitamine D", "ng/mL", 30.0, 100.0),
            reference("glucose", "Glycémie (Glucose)", "g/L", 0.7, 1.1),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::db::{open_memory_database, seed::seed_reference_entries};

    #[test]
    fn lookup_is_exact_match() {
        let catalog = sample_catalog();
        assert!(catalog.lookup("vitamine_d").is_some());
        assert!(catalog.lookup("Vitamine D").is_none());
        assert!(catalog.lookup("vitamine").is_none());
    }

    #[test]
    fn empty_catalog() {
        let catalog = InMemoryCatalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.lookup("glucose").is_none());
    }

    #[test]
    fn load_from_seeded_database() {
        let conn = open_memory_database().unwrap();
        seed_reference_entries(&conn).unwrap();
        let catalog = InMemoryCatalog::load(&conn).unwrap();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.lookup("tsh").unwrap().unit, "mUI/L");
    }

    #[test]
    fn sorted_entries_by_category() {
        let mut a = reference("a", "A", "u", 0.0, 1.0);
        a.category = Some("Lipides".into());
        let mut b = reference("b", "B", "u", 0.0, 1.0);
        b.category = Some("Hématologie".into());
        let catalog = InMemoryCatalog::from_entries([a, b]);
        let names: Vec<_> = catalog
            .sorted_entries()
            .iter()
            .map(|e| e.canonical_name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
