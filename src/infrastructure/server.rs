// Server module - Router assembly and the HTTP listener

use axum::Router;
use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::api_docs::ApiDoc;
use crate::infrastructure::AppState;
use crate::infrastructure::config::Config;

/// Router options that only matter outside of tests
#[derive(Debug, Default, Clone)]
pub struct RouterOptions {
    /// Directory served under `/uploads`; nothing is served when `None`
    pub upload_dir: Option<String>,
    /// Allowed CORS origins; any origin when empty
    pub cors_allowed_origins: Vec<String>,
}

impl RouterOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_dir: Some(config.upload_dir.clone()),
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        match origin.parse::<HeaderValue>() {
            Ok(v) => allowed.push(v),
            Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
        }
    }
    cors.allow_origin(allowed)
}

/// Build the full application: `/api`, Swagger UI and uploaded files.
pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    let mut app = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api::api_router(state));

    if let Some(dir) = &options.upload_dir {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors_layer(&options.cors_allowed_origins))
}

/// Bind `0.0.0.0:PORT` and serve until the process is stopped.
pub async fn serve(app: Router, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Bookstore API listening on {}", addr);
    axum::serve(listener, app).await
}
