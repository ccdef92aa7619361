use rusqlite::{params, Connection, OptionalExtension};

use crate::analysis::normalize_name;
use crate::db::DatabaseError;
use crate::models::ReferenceEntry;

const ENTRY_COLUMNS: &str = "name, display_name, unit, min_value, max_value, category, \
     description, explanation, advice_low, advice_high, advice_normal";

/// Administrative insert. Rejects entries the catalog could not honour:
/// a non-canonical name, inverted or non-finite bounds, or an empty
/// explanation.
pub fn insert_reference_entry(
    conn: &Connection,
    entry: &ReferenceEntry,
) -> Result<i64, DatabaseError> {
    validate_entry(entry)?;

    conn.execute(
        &format!(
            "INSERT INTO biomarkers ({ENTRY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            entry.canonical_name,
            entry.display_name,
            entry.unit,
            entry.min_bound,
            entry.max_bound,
            entry.category,
            entry.description,
            entry.explanation,
            entry.advice_low,
            entry.advice_high,
            entry.advice_normal,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "biomarker '{}' already exists",
                entry.canonical_name
            ))
        }
        other => DatabaseError::Sqlite(other),
    })?;

    Ok(conn.last_insert_rowid())
}

fn validate_entry(entry: &ReferenceEntry) -> Result<(), DatabaseError> {
    if entry.canonical_name.is_empty() || normalize_name(&entry.canonical_name) != entry.canonical_name
    {
        return Err(DatabaseError::ConstraintViolation(format!(
            "biomarker name '{}' is not canonical",
            entry.canonical_name
        )));
    }
    if !entry.min_bound.is_finite() || !entry.max_bound.is_finite() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "biomarker '{}' has non-finite bounds",
            entry.canonical_name
        )));
    }
    if entry.min_bound > entry.max_bound {
        return Err(DatabaseError::ConstraintViolation(format!(
            "biomarker '{}': min {} > max {}",
            entry.canonical_name, entry.min_bound, entry.max_bound
        )));
    }
    if entry.explanation.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "biomarker '{}' has no explanation",
            entry.canonical_name
        )));
    }
    Ok(())
}

/// All reference entries, ordered by category then display name.
pub fn list_reference_entries(conn: &Connection) -> Result<Vec<ReferenceEntry>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM biomarkers
         ORDER BY COALESCE(category, ''), display_name"
    ))?;

    let rows = stmt.query_map([], entry_from_row)?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

pub fn get_reference_entry(
    conn: &Connection,
    canonical_name: &str,
) -> Result<Option<ReferenceEntry>, DatabaseError> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM biomarkers WHERE name = ?1"),
            params![canonical_name],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn count_reference_entries(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM biomarkers", [], |row| row.get(0))?;
    Ok(count)
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> Result<ReferenceEntry, rusqlite::Error> {
    Ok(ReferenceEntry {
        canonical_name: row.get(0)?,
        display_name: row.get(1)?,
        unit: row.get(2)?,
        min_bound: row.get(3)?,
        max_bound: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        explanation: row.get(7)?,
        advice_low: row.get(8)?,
        advice_high: row.get(9)?,
        advice_normal: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn entry(name: &str, min: f64, max: f64) -> ReferenceEntry {
        ReferenceEntry {
            canonical_name: name.into(),
            display_name: name.to_uppercase(),
            unit: "g/L".into(),
            min_bound: min,
            max_bound: max,
            category: Some("Test".into()),
            description: None,
            explanation: "Explanation".into(),
            advice_low: Some("low".into()),
            advice_high: None,
            advice_normal: None,
        }
    }

    #[test]
    fn insert_and_get() {
        let conn = open_memory_database().unwrap();
        insert_reference_entry(&conn, &entry("glucose", 0.7, 1.1)).unwrap();

        let loaded = get_reference_entry(&conn, "glucose").unwrap().unwrap();
        assert_eq!(loaded, entry("glucose", 0.7, 1.1));
        assert!(get_reference_entry(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_name_rejected() {
        let conn = open_memory_database().unwrap();
        insert_reference_entry(&conn, &entry("tsh", 0.4, 4.0)).unwrap();
        let err = insert_reference_entry(&conn, &entry("tsh", 0.5, 4.0)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_reference_entry(&conn, &entry("tsh", 4.0, 0.4)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert_eq!(count_reference_entries(&conn).unwrap(), 0);
    }

    #[test]
    fn equal_bounds_accepted() {
        let conn = open_memory_database().unwrap();
        insert_reference_entry(&conn, &entry("fixed", 1.0, 1.0)).unwrap();
        assert_eq!(count_reference_entries(&conn).unwrap(), 1);
    }

    #[test]
    fn non_canonical_name_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_reference_entry(&conn, &entry("Vitamine D", 30.0, 100.0)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn empty_explanation_rejected() {
        let conn = open_memory_database().unwrap();
        let mut e = entry("ferritine", 30.0, 300.0);
        e.explanation = "   ".into();
        assert!(insert_reference_entry(&conn, &e).is_err());
    }

    #[test]
    fn list_orders_by_category_then_display_name() {
        let conn = open_memory_database().unwrap();
        let mut b = entry("b_marker", 1.0, 2.0);
        b.category = Some("A".into());
        let mut a = entry("a_marker", 1.0, 2.0);
        a.category = Some("B".into());
        insert_reference_entry(&conn, &a).unwrap();
        insert_reference_entry(&conn, &b).unwrap();

        let list = list_reference_entries(&conn).unwrap();
        let names: Vec<_> = list.iter().map(|e| e.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["b_marker", "a_marker"]);
    }
}
