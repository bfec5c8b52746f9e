use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path};
use crate::domain::DomainError;
use crate::infrastructure::auth::Claims;
use crate::services::wishlist_service;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AddWishlistRequest {
    pub book_id: i32,
}

pub async fn list_wishlist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        wishlist_service::list_wishlist(&db, claims.user_id()).await?,
    ))
}

/// POST /api/wishlist - 201 when added, 200 when it was already there
pub async fn add_to_wishlist(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<AddWishlistRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let (item, created) =
        wishlist_service::add_to_wishlist(&db, claims.user_id(), payload.book_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(item)))
}

pub async fn remove(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    wishlist_service::remove_from_wishlist(&db, claims.user_id(), book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/wishlist/:book_id/move-to-cart
pub async fn move_to_cart(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(book_id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        wishlist_service::move_to_cart(&db, claims.user_id(), book_id).await?,
    ))
}
