use rusqlite::Connection;

use super::repository::{count_reference_entries, insert_reference_entry};
use super::DatabaseError;
use crate::models::ReferenceEntry;

const BUNDLED_CATALOG: &str = include_str!("../../resources/seed/biomarkers.json");

/// Parse the catalog shipped with the binary.
pub fn bundled_reference_entries() -> Result<Vec<ReferenceEntry>, DatabaseError> {
    serde_json::from_str(BUNDLED_CATALOG).map_err(|e| DatabaseError::SeedParse(e.to_string()))
}

/// Insert the bundled catalog when the `biomarkers` table is empty.
/// Returns the number of inserted entries (0 if the table was already
/// populated).
pub fn seed_reference_entries(conn: &Connection) -> Result<usize, DatabaseError> {
    if count_reference_entries(conn)? > 0 {
        tracing::debug!("Reference catalog already populated, skipping seed");
        return Ok(0);
    }

    let entries = bundled_reference_entries()?;
    let tx = conn.unchecked_transaction()?;
    for entry in &entries {
        insert_reference_entry(&tx, entry)?;
    }
    tx.commit()?;

    tracing::info!(count = entries.len(), "Seeded reference catalog");
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::get_reference_entry;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn bundled_catalog_parses() {
        let entries = bundled_reference_entries().unwrap();
        assert_eq!(entries.len(), 10);
        assert!(entries.iter().all(|e| e.min_bound <= e.max_bound));
        assert!(entries.iter().all(|e| !e.explanation.is_empty()));
    }

    #[test]
    fn seed_populates_empty_table() {
        let conn = open_memory_database().unwrap();
        assert_eq!(seed_reference_entries(&conn).unwrap(), 10);
        assert_eq!(count_reference_entries(&conn).unwrap(), 10);

        let hb = get_reference_entry(&conn, "hemoglobine").unwrap().unwrap();
        assert_eq!(hb.display_name, "Hémoglobine");
        assert_eq!(hb.unit, "g/dL");
        assert_eq!(hb.min_bound, 13.0);
        assert_eq!(hb.max_bound, 17.0);
    }

    #[test]
    fn seed_is_noop_when_populated() {
        let conn = open_memory_database().unwrap();
        seed_reference_entries(&conn).unwrap();
        assert_eq!(seed_reference_entries(&conn).unwrap(), 0);
        assert_eq!(count_reference_entries(&conn).unwrap(), 10);
    }
}
