use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use super::extract::{Json, Path};
use crate::domain::DomainError;
use crate::infrastructure::auth::Claims;
use crate::services::cart_service::{self, AddToCartInput, CheckoutInput};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// GET /api/cart - Lines, totals and covers
pub async fn get_cart(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(cart_service::get_cart(&db, claims.user_id()).await?))
}

pub async fn add_to_cart(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        cart_service::add_to_cart(&db, claims.user_id(), payload).await?,
    ))
}

/// PUT /api/cart/items/:id - Zero removes the line
pub async fn update_quantity(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        cart_service::update_quantity(&db, claims.user_id(), id, payload.quantity).await?,
    ))
}

pub async fn remove_item(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        cart_service::remove_item(&db, claims.user_id(), id).await?,
    ))
}

pub async fn clear_cart(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> Result<impl IntoResponse, DomainError> {
    let removed = cart_service::clear_cart(&db, claims.user_id()).await?;
    Ok(Json(json!({ "removed": removed })))
}

/// POST /api/cart/checkout - Order some or all cart lines
#[utoipa::path(
    post,
    path = "/api/cart/checkout",
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order created; ordered lines left the cart"),
        (status = 400, description = "Empty selection, bad address or inactive book"),
        (status = 409, description = "Insufficient stock")
    ),
    tag = "orders"
)]
pub async fn checkout(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CheckoutInput>,
) -> Result<impl IntoResponse, DomainError> {
    let order = cart_service::checkout(&db, claims.user_id(), payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
