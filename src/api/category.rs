use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::DomainError;
use crate::domain::validation::page_window;
use crate::infrastructure::auth::AdminClaims;
use crate::services::category_service::{self, CategoryInput};

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    pub search: Option<String>,
    pub parent_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn list_categories(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    Ok(Json(
        category_service::list_categories(&db, params.search, params.parent_id, page, limit)
            .await?,
    ))
}

pub async fn get_category(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(category_service::get_category(&db, id).await?))
}

pub async fn create_category(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, DomainError> {
    let category = category_service::create_category(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        category_service::update_category(&db, id, payload).await?,
    ))
}

/// DELETE /api/categories/:id - Unlinks books and detaches subcategories
pub async fn delete_category(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    category_service::delete_category(&db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
