//! Admin dashboard statistics

use axum::{extract::State, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Query};
use crate::domain::DomainError;
use crate::infrastructure::auth::AdminClaims;
use crate::services::dashboard_service;

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    responses(
        (status = 200, description = "Counts, revenue and low-stock total"),
        (status = 403, description = "Administrator access required")
    ),
    tag = "dashboard"
)]
pub async fn summary(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(dashboard_service::summary(&db).await?))
}

/// GET /api/dashboard/revenue?days=30 - Zero-filled daily series
pub async fn revenue_by_day(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<RevenueQuery>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        dashboard_service::revenue_by_day(&db, params.days).await?,
    ))
}

pub async fn top_books(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(dashboard_service::top_books(&db, params.limit).await?))
}

pub async fn recent_orders(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        dashboard_service::recent_orders(&db, params.limit).await?,
    ))
}
