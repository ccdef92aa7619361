use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::user::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{ProfileData, ProfileUpdate, UserProfile};

const PROFILE_COLUMNS: &str = "id, user_id, \
     birthdate, biological_sex, height, weight, ethnicity, blood_type, \
     alcohol_consumption, tobacco_consumption, diet_type, medications, supplements, \
     physical_activity_level, is_menopause, is_pregnant, menstrual_cycle_phase, \
     blood_test_time, blood_test_fasting, chronic_diseases, family_history, \
     recent_infection, created_at, updated_at";

pub fn get_profile(conn: &Connection, user_id: &Uuid) -> Result<Option<UserProfile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?1"),
            params![user_id.to_string()],
            profile_row_from_rusqlite,
        )
        .optional()?;
    row.map(profile_from_row).transpose()
}

/// Return the user's profile, creating an empty one on first access.
pub fn get_or_create_profile(conn: &Connection, user_id: &Uuid) -> Result<UserProfile, DatabaseError> {
    match get_profile(conn, user_id)? {
        Some(profile) => Ok(profile),
        None => upsert_profile(conn, user_id, ProfileUpdate::default()),
    }
}

/// Create the profile from `update`, or apply the fields present in
/// `update` to the existing one.
pub fn upsert_profile(
    conn: &Connection,
    user_id: &Uuid,
    update: ProfileUpdate,
) -> Result<UserProfile, DatabaseError> {
    let now = chrono::Utc::now().naive_utc();

    let mut profile = match get_profile(conn, user_id)? {
        Some(mut existing) => {
            existing.updated_at = now;
            existing
        }
        None => UserProfile {
            id: Uuid::new_v4(),
            user_id: *user_id,
            data: ProfileData::default(),
            created_at: now,
            updated_at: now,
        },
    };
    update.apply_to(&mut profile.data);

    let d = &profile.data;
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO user_profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)"
        ),
        params![
            profile.id.to_string(),
            profile.user_id.to_string(),
            d.birthdate,
            d.biological_sex,
            d.height,
            d.weight,
            d.ethnicity,
            d.blood_type,
            d.alcohol_consumption,
            d.tobacco_consumption,
            d.diet_type,
            d.medications,
            d.supplements,
            d.physical_activity_level,
            d.is_menopause,
            d.is_pregnant,
            d.menstrual_cycle_phase,
            d.blood_test_time,
            d.blood_test_fasting,
            d.chronic_diseases,
            d.family_history,
            d.recent_infection,
            profile.created_at,
            profile.updated_at,
        ],
    )?;

    Ok(profile)
}

pub fn delete_profile(conn: &Connection, user_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM user_profiles WHERE user_id = ?1",
        params![user_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "UserProfile".into(),
            id: user_id.to_string(),
        });
    }
    Ok(())
}

struct ProfileRow {
    id: String,
    user_id: String,
    data: ProfileData,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

fn profile_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProfileRow, rusqlite::Error> {
    Ok(ProfileRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        data: ProfileData {
            birthdate: row.get::<_, Option<NaiveDate>>(2)?,
            biological_sex: row.get(3)?,
            height: row.get(4)?,
            weight: row.get(5)?,
            ethnicity: row.get(6)?,
            blood_type: row.get(7)?,
            alcohol_consumption: row.get(8)?,
            tobacco_consumption: row.get(9)?,
            diet_type: row.get(10)?,
            medications: row.get(11)?,
            supplements: row.get(12)?,
            physical_activity_level: row.get(13)?,
            is_menopause: row.get(14)?,
            is_pregnant: row.get(15)?,
            menstrual_cycle_phase: row.get(16)?,
            blood_test_time: row.get(17)?,
            blood_test_fasting: row.get(18)?,
            chronic_diseases: row.get(19)?,
            family_history: row.get(20)?,
            recent_infection: row.get(21)?,
        },
        created_at: row.get(22)?,
        updated_at: row.get(23)?,
    })
}

fn profile_from_row(row: ProfileRow) -> Result<UserProfile, DatabaseError> {
    Ok(UserProfile {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        data: row.data,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_user;
    use crate::db::sqlite::open_memory_database;
    use crate::models::User;
    use serde_json::json;

    fn update(body: serde_json::Value) -> ProfileUpdate {
        serde_json::from_value(body).unwrap()
    }

    fn setup() -> (Connection, Uuid) {
        let conn = open_memory_database().unwrap();
        let now = chrono::Utc::now().naive_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            hashed_password: String::new(),
            is_active: true,
            is_superuser: false,
            is_verified: true,
            created_at: now,
            updated_at: now,
        };
        insert_user(&conn, &user).unwrap();
        (conn, user.id)
    }

    #[test]
    fn get_or_create_creates_empty_profile_once() {
        let (conn, user_id) = setup();
        assert!(get_profile(&conn, &user_id).unwrap().is_none());

        let first = get_or_create_profile(&conn, &user_id).unwrap();
        assert_eq!(first.data, ProfileData::default());

        let second = get_or_create_profile(&conn, &user_id).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn upsert_merges_into_existing() {
        let (conn, user_id) = setup();
        let created = upsert_profile(
            &conn,
            &user_id,
            update(json!({"blood_type": "A-", "birthdate": "1985-02-01", "is_pregnant": true})),
        )
        .unwrap();

        let updated = upsert_profile(
            &conn,
            &user_id,
            update(json!({"weight": 58.5, "is_pregnant": false})),
        )
        .unwrap();
        assert_eq!(updated.id, created.id);

        let stored = get_profile(&conn, &user_id).unwrap().unwrap();
        assert_eq!(stored.data.blood_type.as_deref(), Some("A-"));
        assert_eq!(stored.data.birthdate, NaiveDate::from_ymd_opt(1985, 2, 1));
        assert_eq!(stored.data.weight, Some(58.5));
        assert_eq!(stored.data.is_pregnant, Some(false));
        assert_eq!(stored.created_at, created.created_at);
    }

    #[test]
    fn upsert_null_clears_stored_value() {
        let (conn, user_id) = setup();
        upsert_profile(
            &conn,
            &user_id,
            update(json!({"height": 172.0, "medications": "levothyroxine"})),
        )
        .unwrap();

        upsert_profile(&conn, &user_id, update(json!({"height": null}))).unwrap();

        let stored = get_profile(&conn, &user_id).unwrap().unwrap();
        assert_eq!(stored.data.height, None);
        assert_eq!(stored.data.medications.as_deref(), Some("levothyroxine"));
    }

    #[test]
    fn delete_missing_profile_is_not_found() {
        let (conn, user_id) = setup();
        let err = delete_profile(&conn, &user_id).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_profile() {
        let (conn, user_id) = setup();
        get_or_create_profile(&conn, &user_id).unwrap();
        delete_profile(&conn, &user_id).unwrap();
        assert!(get_profile(&conn, &user_id).unwrap().is_none());
    }

    #[test]
    fn profile_deleted_with_user() {
        let (conn, user_id) = setup();
        get_or_create_profile(&conn, &user_id).unwrap();
        conn.execute("DELETE FROM users WHERE id = ?1", params![user_id.to_string()])
            .unwrap();
        assert!(get_profile(&conn, &user_id).unwrap().is_none());
    }
}
