use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::validation::page_window;
use crate::domain::{DomainError, OrderStatus};
use crate::infrastructure::auth::{AdminClaims, Claims};
use crate::services::order_service::{self, CreateOrderInput, OrderFilter, Viewer};

#[derive(Debug, Default, Deserialize)]
pub struct MyOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminOrdersQuery {
    pub status: Option<OrderStatus>,
    /// Order number or recipient contains
    pub search: Option<String>,
    /// Inclusive `YYYY-MM-DD` bounds on the creation date
    pub from: Option<String>,
    pub to: Option<String>,
    pub user_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created and stock reserved"),
        (status = 400, description = "No items, bad quantity, foreign address or inactive book"),
        (status = 409, description = "Insufficient stock")
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, DomainError> {
    let order = order_service::create_order(&db, claims.user_id(), payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders - The caller's own orders
pub async fn list_my_orders(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Query(params): Query<MyOrdersQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = OrderFilter {
        user_id: Some(claims.user_id()),
        status: params.status,
        page,
        limit,
        ..Default::default()
    };
    Ok(Json(order_service::list_orders(&db, filter).await?))
}

/// GET /api/orders/:id - Owner or admin; others get 404
pub async fn get_order(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    let viewer = Viewer {
        user_id: claims.user_id(),
        is_admin: claims.is_admin(),
    };
    Ok(Json(order_service::get_order(&db, viewer, id).await?))
}

/// POST /api/orders/:id/cancel - Pending orders only
pub async fn cancel_my_order(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        order_service::cancel_my_order(&db, claims.user_id(), id).await?,
    ))
}

/// GET /api/admin/orders
pub async fn list_orders(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<AdminOrdersQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = OrderFilter {
        user_id: params.user_id,
        status: params.status,
        search: params.search,
        from: params.from,
        to: params.to,
        page,
        limit,
    };
    Ok(Json(order_service::list_orders(&db, filter).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed, stock updated"),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn update_status(
    State(db): State<DatabaseConnection>,
    AdminClaims(admin): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        order_service::update_status(&db, admin.user_id(), id, payload.status).await?,
    ))
}
