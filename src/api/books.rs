use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::DomainError;
use crate::domain::validation::page_window;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{AdminClaims, Claims};
use crate::services::book_service::{self, BookFilter, BookInput};

/// Query parameters for listing books
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBooksQuery {
    /// Title or ISBN contains
    pub search: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Honoured for admins only; everyone else sees active books
    pub active: Option<bool>,
    /// `title_asc`, `title_desc`, `price_asc`, `price_desc` or `newest`
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /api/books - Filtered, sorted, paginated catalog
#[utoipa::path(
    get,
    path = "/api/books",
    responses((status = 200, description = "Page of books")),
    tag = "catalog"
)]
pub async fn list_books(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Query(params): Query<ListBooksQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let is_admin = claims.as_ref().is_some_and(Claims::is_admin);
    let (page, limit) = page_window(params.page, params.limit);

    let filter = BookFilter {
        search: params.search,
        author_id: params.author_id,
        category_id: params.category_id,
        publisher_id: params.publisher_id,
        min_price: params.min_price,
        max_price: params.max_price,
        active: if is_admin { params.active } else { Some(true) },
        sort: params.sort,
        page,
        limit,
    };
    Ok(Json(book_service::list_books(&db, filter).await?))
}

/// GET /api/books/:id - Book with authors, categories, images and stock
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book detail"),
        (status = 404, description = "Book not found")
    ),
    tag = "catalog"
)]
pub async fn get_book(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(book_service::get_book(&db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created"),
        (status = 400, description = "Invalid ISBN, title or references"),
        (status = 409, description = "ISBN already exists")
    ),
    tag = "catalog"
)]
pub async fn create_book(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Json(payload): Json<BookInput>,
) -> Result<impl IntoResponse, DomainError> {
    let book = book_service::create_book(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book replaced"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Book not found")
    ),
    tag = "catalog"
)]
pub async fn update_book(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<BookInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(book_service::update_book(&db, id, payload).await?))
}

/// DELETE /api/books/:id - Cascade delete, or deactivate when ordered
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Deleted or deactivated"),
        (status = 404, description = "Book not found")
    ),
    tag = "catalog"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    let outcome = book_service::delete_book(state.db(), state.storage.as_ref(), id).await?;
    Ok(Json(outcome))
}
