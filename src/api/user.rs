//! Admin user management

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::extract::{Json, Path, Query};
use crate::domain::validation::page_window;
use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::AdminClaims;
use crate::services::user_service::{self, UpdateUserInput, UserFilter};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /api/users
pub async fn list_users(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Query(params): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, DomainError> {
    let (page, limit) = page_window(params.page, params.limit);
    let filter = UserFilter {
        search: params.search,
        role: params.role,
        page,
        limit,
    };
    Ok(Json(user_service::list_users(&db, filter).await?))
}

pub async fn get_user(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(user_service::get_user(&db, id).await?))
}

/// PUT /api/users/:id - Change role, activation or profile fields
pub async fn update_user(
    State(db): State<DatabaseConnection>,
    AdminClaims(admin): AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(
        user_service::update_user(&db, admin.user_id(), id, payload).await?,
    ))
}

pub async fn delete_user(
    State(db): State<DatabaseConnection>,
    AdminClaims(admin): AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    user_service::delete_user(&db, admin.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
