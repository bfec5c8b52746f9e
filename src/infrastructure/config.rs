use std::env;

/// Runtime configuration, read once at start-up.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub seed_demo: bool,
}

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://bookstore.db?mode=rwc".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            jwt_secret: jwt_secret_from_env(),
            jwt_ttl_hours: env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "/uploads".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|b| b.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            seed_demo: env::var("SEED_DEMO").is_ok(),
        }
    }
}

fn jwt_secret_from_env() -> String {
    match env::var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ if cfg!(debug_assertions) => "dev-secret".to_string(),
        _ => {
            // Tokens will not survive a restart, but the server stays usable.
            tracing::warn!("JWT_SECRET is not set; generating an ephemeral signing key");
            uuid::Uuid::new_v4().simple().to_string()
        }
    }
}
