//! Stock levels and movements (admin)

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::validation::page_window;
use crate::domain::{DomainError, TransactionKind};
use crate::infrastructure::auth::AdminClaims;
use crate::services::inventory_service::{
    self, CreateStockInput, StockFilter, TransactionFilter, TransactionInput,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListStockQuery {
    #[serde(default)]
    pub low_stock_only: bool,
    pub warehouse: Option<String>,
    pub book_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    pub stock_item_id: Option<i32>,
    pub kind: Option<TransactionKind>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStockRequest {
    pub reorder_level: i32,
}

pub async fn list_stock(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<ListStockQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = StockFilter {
        low_stock_only: params.low_stock_only,
        warehouse: params.warehouse,
        book_id: params.book_id,
        page,
        limit,
    };
    Ok(Json(inventory_service::list_stock(&db, filter).await?))
}

/// GET /api/inventory/low-stock - Rows with available <= reorder level
pub async fn low_stock(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(inventory_service::low_stock(&db).await?))
}

pub async fn get_stock(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(inventory_service::get_stock(&db, id).await?))
}

pub async fn create_stock_item(
    State(db): State<DatabaseConnection>,
    AdminClaims(admin): AdminClaims,
    Json(payload): Json<CreateStockInput>,
) -> Result<impl IntoResponse, DomainError> {
    let stock =
        inventory_service::create_stock_item(&db, payload, Some(admin.user_id())).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

pub async fn update_stock_item(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStockRequest>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        inventory_service::update_reorder_level(&db, id, payload.reorder_level).await?,
    ))
}

/// POST /api/inventory/:id/transactions - Inbound, outbound or adjustment
#[utoipa::path(
    post,
    path = "/api/inventory/{id}/transactions",
    params(("id" = i32, Path, description = "Stock item id")),
    request_body = TransactionInput,
    responses(
        (status = 201, description = "Movement recorded, updated stock returned"),
        (status = 400, description = "Invalid quantity"),
        (status = 409, description = "Would drop below reserved quantity")
    ),
    tag = "inventory"
)]
pub async fn record_transaction(
    State(db): State<DatabaseConnection>,
    AdminClaims(admin): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<TransactionInput>,
) -> Result<impl IntoResponse, DomainError> {
    let result =
        inventory_service::record_transaction(&db, id, payload, Some(admin.user_id())).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn list_transactions(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = TransactionFilter {
        stock_item_id: params.stock_item_id,
        kind: params.kind,
        page,
        limit,
    };
    Ok(Json(inventory_service::list_transactions(&db, filter).await?))
}

/// GET /api/inventory/:id/transactions - History of one stock row
pub async fn list_item_transactions(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = TransactionFilter {
        stock_item_id: Some(id),
        kind: params.kind,
        page,
        limit,
    };
    Ok(Json(inventory_service::list_transactions(&db, filter).await?))
}
