use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::DomainError;
use crate::domain::validation::page_window;
use crate::infrastructure::auth::AdminClaims;
use crate::services::author_service::{self, AuthorInput};

/// `?search=&page=&limit=` for catalog listings
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Name contains
    pub search: Option<String>,
    /// 1-based page
    pub page: Option<u64>,
    /// Page size, at most 100
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/authors",
    responses((status = 200, description = "Page of authors")),
    tag = "catalog"
)]
pub async fn list_authors(
    State(db): State<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    Ok(Json(
        author_service::list_authors(&db, params.search, page, limit).await?,
    ))
}

pub async fn get_author(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(author_service::get_author(&db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/authors",
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created"),
        (status = 400, description = "Name is required")
    ),
    tag = "catalog"
)]
pub async fn create_author(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Json(payload): Json<AuthorInput>,
) -> Result<impl IntoResponse, DomainError> {
    let author = author_service::create_author(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<AuthorInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(author_service::update_author(&db, id, payload).await?))
}

pub async fn delete_author(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    author_service::delete_author(&db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
