use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;

use super::extract::{Json, Path};
use crate::domain::DomainError;
use crate::infrastructure::auth::Claims;
use crate::services::address_service::{self, AddressInput};

pub async fn list_addresses(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        address_service::list_addresses(&db, claims.user_id()).await?,
    ))
}

pub async fn create_address(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<AddressInput>,
) -> Result<impl IntoResponse, DomainError> {
    let address = address_service::create_address(&db, claims.user_id(), payload).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<AddressInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        address_service::update_address(&db, claims.user_id(), id, payload).await?,
    ))
}

/// PUT /api/addresses/:id/default
pub async fn set_default(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        address_service::set_default(&db, claims.user_id(), id).await?,
    ))
}

pub async fn delete_address(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    address_service::delete_address(&db, claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
