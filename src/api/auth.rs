use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use super::extract::Json;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::user_service::{self, RegisterInput, UpdateProfileInput};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/register - Create a customer account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Account created, token returned"),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> Result<impl IntoResponse, DomainError> {
    let response = user_service::register(state.db(), state.jwt(), payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token and user"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account disabled")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let response =
        user_service::login(state.db(), state.jwt(), &payload.email, &payload.password).await?;
    Ok(Json(response))
}

/// GET /api/auth/me - Current user
pub async fn get_me(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(user_service::get_user(&db, claims.user_id()).await?))
}

/// PUT /api/auth/me - Update own name and phone
pub async fn update_me(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<UpdateProfileInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        user_service::update_profile(&db, claims.user_id(), payload).await?,
    ))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, DomainError> {
    user_service::change_password(
        &db,
        claims.user_id(),
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    Ok(Json(json!({ "message": "Password updated" })))
}
