//! Application state shared across all handlers

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::ObjectStorage;
use crate::infrastructure::auth::JwtKeys;
use crate::infrastructure::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use crate::infrastructure::storage::LocalStorage;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Where uploaded book images go
    pub storage: Arc<dyn ObjectStorage>,
    jwt: Arc<JwtKeys>,
    /// Per-file upload limit in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn ObjectStorage>, jwt: JwtKeys) -> Self {
        Self {
            db,
            storage,
            jwt: Arc::new(jwt),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Build state from configuration, storing uploads on the local disk.
    pub fn from_config(db: DatabaseConnection, config: &Config) -> Self {
        let storage = Arc::new(LocalStorage::new(
            &config.upload_dir,
            config.public_base_url.clone(),
        ));
        Self::new(
            db,
            storage,
            JwtKeys::new(config.jwt_secret.clone(), config.jwt_ttl_hours),
        )
        .with_max_upload_bytes(config.max_upload_bytes)
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }
}

// Handlers that only touch the database can extract the connection directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
