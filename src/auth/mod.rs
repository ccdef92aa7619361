//! Accounts: password and OAuth sign-in, JWT access tokens.

pub mod jwt;
pub mod oauth;
pub mod password;

pub use jwt::*;
pub use oauth::*;
pub use password::*;

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{OAuthAccount, User};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    InactiveAccount,

    #[error("An account already exists for this email")]
    EmailTaken,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least 8 characters")]
    WeakPassword,

    #[error("Invalid authentication token")]
    TokenInvalid,

    #[error("Authentication token expired")]
    TokenExpired,

    #[error("Credential processing failed: {0}")]
    Hashing(String),

    #[error("OAuth sign-in failed: {0}")]
    OAuth(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
});

/// Trimmed, lower-cased address used for storage and lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

/// Create an active, unverified account with a password.
pub fn register_user(
    conn: &Connection,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_password(password)?;

    if db::get_user_by_email(conn, &email)?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let now = chrono::Utc::now().naive_utc();
    let user = User {
        id: Uuid::new_v4(),
        email,
        hashed_password: hasher.hash(password),
        is_active: true,
        is_superuser: false,
        is_verified: false,
        created_at: now,
        updated_at: now,
    };
    db::insert_user(conn, &user).map_err(|e| match e {
        DatabaseError::ConstraintViolation(_) => AuthError::EmailTaken,
        other => AuthError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok(user)
}

/// Password sign-in. Unknown email, OAuth-only account and wrong password
/// all yield `InvalidCredentials`.
pub fn authenticate(
    conn: &Connection,
    hasher: &PasswordHasher,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let email = normalize_email(email);
    let user = db::get_user_by_email(conn, &email)?.ok_or(AuthError::InvalidCredentials)?;

    if !user.has_password() || !hasher.verify(password, &user.hashed_password)? {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AuthError::InactiveAccount);
    }
    Ok(user)
}

/// Resolve a provider identity to a local account.
///
/// Looks up the linked provider account first, then the email. A new
/// account is created with no password and inherits the provider's
/// verification flag. An existing account is linked by email only when the
/// provider has verified that email.
pub fn sign_in_with_oauth(conn: &Connection, identity: &OAuthIdentity) -> Result<User, AuthError> {
    if let Some(account) =
        db::get_oauth_account(conn, identity.provider, &identity.provider_user_id)?
    {
        let user = db::get_user_by_id(conn, &account.user_id)?.ok_or_else(|| {
            DatabaseError::NotFound {
                entity_type: "User".into(),
                id: account.user_id.to_string(),
            }
        })?;
        return ensure_active(user);
    }

    let email = normalize_email(&identity.email);
    validate_email(&email)?;
    let now = chrono::Utc::now().naive_utc();

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    let user = match db::get_user_by_email(&tx, &email)? {
        Some(mut user) => {
            if !identity.email_verified {
                return Err(AuthError::OAuth(
                    "provider email is not verified, refusing to link existing account".into(),
                ));
            }
            if !user.is_verified {
                db::set_user_verified(&tx, &user.id)?;
                user.is_verified = true;
            }
            tracing::info!(user_id = %user.id, provider = %identity.provider, "Linked OAuth account to existing user");
            user
        }
        None => {
            let user = User {
                id: Uuid::new_v4(),
                email,
                hashed_password: String::new(),
                is_active: true,
                is_superuser: false,
                is_verified: identity.email_verified,
                created_at: now,
                updated_at: now,
            };
            db::insert_user(&tx, &user)?;
            tracing::info!(user_id = %user.id, provider = %identity.provider, "Created OAuth user");
            user
        }
    };

    db::link_oauth_account(
        &tx,
        &OAuthAccount {
            id: Uuid::new_v4(),
            user_id: user.id,
            provider: identity.provider,
            provider_user_id: identity.provider_user_id.clone(),
            created_at: now,
        },
    )?;
    tx.commit().map_err(DatabaseError::from)?;

    ensure_active(user)
}

fn ensure_active(user: User) -> Result<User, AuthError> {
    if user.is_active {
        Ok(user)
    } else {
        Err(AuthError::InactiveAccount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::enums::OAuthProviderKind;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1_000)
    }

    fn google(id: &str, email: &str) -> OAuthIdentity {
        OAuthIdentity {
            provider: OAuthProviderKind::Google,
            provider_user_id: id.into(),
            email: email.into(),
            email_verified: true,
        }
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("space in@example.com").is_err());
        assert!(validate_email("ada@localhost").is_err());
    }

    #[test]
    fn email_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn register_then_authenticate() {
        let conn = open_memory_database().unwrap();
        let user = register_user(&conn, &hasher(), " Ada@Example.com", "password123").unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
        assert!(!user.is_verified);

        let logged_in = authenticate(&conn, &hasher(), "ADA@example.com", "password123").unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[test]
    fn register_rejects_duplicate_and_bad_input() {
        let conn = open_memory_database().unwrap();
        register_user(&conn, &hasher(), "ada@example.com", "password123").unwrap();
        assert!(matches!(
            register_user(&conn, &hasher(), "ADA@example.com", "password456"),
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            register_user(&conn, &hasher(), "not-an-email", "password123"),
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            register_user(&conn, &hasher(), "bob@example.com", "short"),
            Err(AuthError::WeakPassword)
        ));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let conn = open_memory_database().unwrap();
        register_user(&conn, &hasher(), "ada@example.com", "password123").unwrap();
        assert!(matches!(
            authenticate(&conn, &hasher(), "ada@example.com", "wrong-password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&conn, &hasher(), "nobody@example.com", "password123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn inactive_account_cannot_log_in() {
        let conn = open_memory_database().unwrap();
        let user = register_user(&conn, &hasher(), "ada@example.com", "password123").unwrap();
        conn.execute(
            "UPDATE users SET is_active = 0 WHERE id = ?1",
            [user.id.to_string()],
        )
        .unwrap();
        assert!(matches!(
            authenticate(&conn, &hasher(), "ada@example.com", "password123"),
            Err(AuthError::InactiveAccount)
        ));
    }

    #[test]
    fn oauth_creates_verified_passwordless_user() {
        let conn = open_memory_database().unwrap();
        let user = sign_in_with_oauth(&conn, &google("g-1", "New@Example.com")).unwrap();
        assert_eq!(user.email, "new@example.com");
        assert!(user.is_verified);
        assert!(!user.has_password());

        // OAuth-only accounts cannot use the password flow
        assert!(matches!(
            authenticate(&conn, &hasher(), "new@example.com", ""),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn oauth_is_idempotent() {
        let conn = open_memory_database().unwrap();
        let first = sign_in_with_oauth(&conn, &google("g-1", "ada@example.com")).unwrap();
        let second = sign_in_with_oauth(&conn, &google("g-1", "ada@example.com")).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn oauth_links_existing_password_account() {
        let conn = open_memory_database().unwrap();
        let registered = register_user(&conn, &hasher(), "ada@example.com", "password123").unwrap();
        let via_google = sign_in_with_oauth(&conn, &google("g-9", "ada@example.com")).unwrap();
        assert_eq!(registered.id, via_google.id);
        assert!(via_google.is_verified);

        // Password login still works
        assert!(authenticate(&conn, &hasher(), "ada@example.com", "password123").is_ok());
        let linked = db::get_oauth_account(&conn, OAuthProviderKind::Google, "g-9")
            .unwrap()
            .unwrap();
        assert_eq!(linked.user_id, registered.id);
    }

    #[test]
    fn oauth_unverified_email_cannot_take_over_password_account() {
        let conn = open_memory_database().unwrap();
        let registered = register_user(&conn, &hasher(), "ada@example.com", "password123").unwrap();
        let identity = OAuthIdentity {
            email_verified: false,
            ..google("g-9", "ada@example.com")
        };
        assert!(matches!(
            sign_in_with_oauth(&conn, &identity),
            Err(AuthError::OAuth(_))
        ));

        // Nothing was linked and the account stays unverified
        assert!(db::get_oauth_account(&conn, OAuthProviderKind::Google, "g-9")
            .unwrap()
            .is_none());
        let stored = db::get_user_by_id(&conn, &registered.id).unwrap().unwrap();
        assert!(!stored.is_verified);
    }

    #[test]
    fn oauth_unverified_email_creates_unverified_user() {
        let conn = open_memory_database().unwrap();
        let identity = OAuthIdentity {
            email_verified: false,
            ..google("g-2", "new@example.com")
        };
        let user = sign_in_with_oauth(&conn, &identity).unwrap();
        assert!(!user.is_verified);
    }
}
