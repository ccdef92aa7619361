//! Shared application state.
//!
//! `CoreState` is built once at startup, wrapped in `Arc` and handed to
//! the axum router. It owns configuration, credentials helpers, the
//! optional external collaborators and the reference catalog snapshot.

use std::sync::{Arc, RwLock};

use crate::analysis::{InMemoryCatalog, ReferenceCatalog};
use crate::auth::{GoogleOAuthClient, JwtKeys, OAuthProvider, PasswordHasher};
use crate::config::AppConfig;
use crate::db;
use crate::extraction::{BiomarkerExtractor, GeminiClient};

pub struct CoreState {
    pub config: AppConfig,
    /// Immutable catalog snapshot. `None` until the first successful load.
    catalog: RwLock<Option<Arc<InMemoryCatalog>>>,
    extractor: Option<Arc<dyn BiomarkerExtractor>>,
    oauth: Option<Arc<dyn OAuthProvider>>,
    hasher: PasswordHasher,
    jwt: JwtKeys,
}

impl CoreState {
    /// Build state from configuration. External clients are created only
    /// for the integrations that are configured.
    pub fn new(config: AppConfig) -> Self {
        let extractor = config
            .gemini
            .as_ref()
            .map(|settings| Arc::new(GeminiClient::new(settings)) as Arc<dyn BiomarkerExtractor>);
        let oauth = config
            .google
            .clone()
            .map(|settings| Arc::new(GoogleOAuthClient::new(settings)) as Arc<dyn OAuthProvider>);
        let hasher = PasswordHasher::new(config.password_hash_iterations);
        let jwt = JwtKeys::new(config.jwt_secret.as_bytes(), config.jwt_expiration_secs);

        Self {
            config,
            catalog: RwLock::new(None),
            extractor,
            oauth,
            hasher,
            jwt,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn BiomarkerExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_oauth_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.oauth = Some(provider);
        self
    }

    /// Open a connection to the application database (migrations applied).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.database_path).map_err(CoreError::Database)
    }

    /// Run migrations and seed the bundled catalog if the table is empty.
    pub fn initialize_database(&self) -> Result<usize, CoreError> {
        let conn = self.open_db()?;
        Ok(db::seed::seed_reference_entries(&conn)?)
    }

    /// Current catalog snapshot, loading it on first use.
    pub fn catalog(&self) -> Result<Arc<InMemoryCatalog>, CoreError> {
        {
            let guard = self.catalog.read().map_err(|_| CoreError::LockPoisoned)?;
            if let Some(catalog) = guard.as_ref() {
                return Ok(Arc::clone(catalog));
            }
        }
        self.reload_catalog()
    }

    /// Re-read the catalog from the database and swap the snapshot.
    /// Requests holding the previous snapshot keep using it.
    pub fn reload_catalog(&self) -> Result<Arc<InMemoryCatalog>, CoreError> {
        let conn = self
            .open_db()
            .map_err(|e| CoreError::CatalogUnavailable(e.to_string()))?;
        let catalog = Arc::new(
            InMemoryCatalog::load(&conn)
                .map_err(|e| CoreError::CatalogUnavailable(e.to_string()))?,
        );
        let mut guard = self.catalog.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = Some(Arc::clone(&catalog));
        tracing::info!(entries = catalog.len(), "Reference catalog loaded");
        Ok(catalog)
    }

    pub fn extractor(&self) -> Option<Arc<dyn BiomarkerExtractor>> {
        self.extractor.clone()
    }

    pub fn oauth_provider(&self) -> Option<Arc<dyn OAuthProvider>> {
        self.oauth.clone()
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Reference catalog unavailable: {0}")]
    CatalogUnavailable(String),
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::extraction::MockExtractor;

    #[test]
    fn unconfigured_integrations_are_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let state = CoreState::new(test_config(&tmp.path().join("gula.db")));
        assert!(state.extractor().is_none());
        assert!(state.oauth_provider().is_none());
    }

    #[test]
    fn with_extractor_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let state = CoreState::new(test_config(&tmp.path().join("gula.db")))
            .with_extractor(Arc::new(MockExtractor::new("{}")));
        assert!(state.extractor().is_some());
    }

    #[test]
    fn catalog_loads_lazily_and_is_shared() {
        let tmp = tempfile::tempdir().unwrap();
        let state = seeded_state(tmp.path());

        let first = state.catalog().unwrap();
        assert_eq!(first.len(), 10);
        let second = state.catalog().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn reload_swaps_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let state = seeded_state(tmp.path());
        let before = state.catalog().unwrap();

        let conn = state.open_db().unwrap();
        conn.execute("DELETE FROM biomarkers WHERE name = 'tsh'", []).unwrap();

        let after = state.reload_catalog().unwrap();
        assert_eq!(before.len(), 10);
        assert_eq!(after.len(), 9);
        assert!(after.lookup("tsh").is_none());
        assert!(Arc::ptr_eq(&after, &state.catalog().unwrap()));
    }

    #[test]
    fn initialize_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let state = seeded_state(tmp.path());
        assert_eq!(state.initialize_database().unwrap(), 0);
    }
}
