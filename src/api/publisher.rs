use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;

use super::author::SearchQuery;
use super::extract::{Json, Path, Query};
use crate::domain::DomainError;
use crate::domain::validation::page_window;
use crate::infrastructure::auth::AdminClaims;
use crate::services::publisher_service::{self, PublisherInput};

pub async fn list_publishers(
    State(db): State<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    Ok(Json(
        publisher_service::list_publishers(&db, params.search, page, limit).await?,
    ))
}

pub async fn get_publisher(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(publisher_service::get_publisher(&db, id).await?))
}

/// POST /api/publishers - 409 when the name is taken
pub async fn create_publisher(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Json(payload): Json<PublisherInput>,
) -> Result<impl IntoResponse, DomainError> {
    let publisher = publisher_service::create_publisher(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(publisher)))
}

pub async fn update_publisher(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<PublisherInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        publisher_service::update_publisher(&db, id, payload).await?,
    ))
}

/// DELETE /api/publishers/:id - 409 while books still reference it
pub async fn delete_publisher(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    publisher_service::delete_publisher(&db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
