use axum::{extract::State, response::IntoResponse};
use sea_orm::DatabaseConnection;

use super::extract::Json;
use crate::domain::DomainError;
use crate::infrastructure::auth::Claims;
use crate::services::chat_service::{self, ChatRequest};

/// POST /api/chat - Shopping assistant; order lookups need a token
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply with the detected intent and optional data"),
        (status = 400, description = "Empty message")
    ),
    tag = "chat"
)]
pub async fn chat_handler(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let user_id = claims.as_ref().map(Claims::user_id);
    Ok(Json(
        chat_service::respond(&db, user_id, &payload.message).await?,
    ))
}
