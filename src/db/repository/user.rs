use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::OAuthProviderKind;
use crate::models::{OAuthAccount, User};

const USER_COLUMNS: &str =
    "id, email, hashed_password, is_active, is_superuser, is_verified, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            user.id.to_string(),
            user.email,
            user.hashed_password,
            user.is_active as i32,
            user.is_superuser as i32,
            user.is_verified as i32,
            user.created_at,
            user.updated_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!("email '{}' already registered", user.email))
        }
        other => DatabaseError::Sqlite(other),
    })?;
    Ok(())
}

pub fn get_user_by_id(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

/// Lookup by email. Callers pass the already-normalized address.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_row_from_rusqlite,
        )
        .optional()?;
    row.map(user_from_row).transpose()
}

pub fn set_user_verified(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let now = chrono::Utc::now().naive_utc();
    let changed = conn.execute(
        "UPDATE users SET is_verified = 1, updated_at = ?1 WHERE id = ?2",
        params![now, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn link_oauth_account(conn: &Connection, account: &OAuthAccount) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO oauth_accounts (id, user_id, provider, provider_user_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id.to_string(),
            account.user_id.to_string(),
            account.provider.as_str(),
            account.provider_user_id,
            account.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_oauth_account(
    conn: &Connection,
    provider: OAuthProviderKind,
    provider_user_id: &str,
) -> Result<Option<OAuthAccount>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, provider, provider_user_id, created_at
             FROM oauth_accounts WHERE provider = ?1 AND provider_user_id = ?2",
            params![provider.as_str(), provider_user_id],
            |row| {
                Ok(OAuthAccountRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    provider: row.get(2)?,
                    provider_user_id: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .optional()?;

    row.map(|r| -> Result<OAuthAccount, DatabaseError> {
        Ok(OAuthAccount {
            id: parse_uuid(&r.id)?,
            user_id: parse_uuid(&r.user_id)?,
            provider: r.provider.parse()?,
            provider_user_id: r.provider_user_id,
            created_at: r.created_at,
        })
    })
    .transpose()
}

struct UserRow {
    id: String,
    email: String,
    hashed_password: String,
    is_active: bool,
    is_superuser: bool,
    is_verified: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

struct OAuthAccountRow {
    id: String,
    user_id: String,
    provider: String,
    provider_user_id: String,
    created_at: NaiveDateTime,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        is_active: row.get::<_, i32>(3)? != 0,
        is_superuser: row.get::<_, i32>(4)? != 0,
        is_verified: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        email: row.email,
        hashed_password: row.hashed_password,
        is_active: row.is_active,
        is_superuser: row.is_superuser,
        is_verified: row.is_verified,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
