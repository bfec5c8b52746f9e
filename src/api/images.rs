use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::DatabaseConnection;

use super::extract::{Json, Path};
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AdminClaims;
use crate::services::image_service::{self, UpdateImageInput, UploadedFile};

/// GET /api/books/:id/images - Ordered by display order
pub async fn list_images(
    State(db): State<DatabaseConnection>,
    Path(book_id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(image_service::list_images(&db, book_id).await?))
}

/// POST /api/books/:id/images - Multipart upload
///
/// Every part carrying a file name is treated as an image. An optional
/// `alt_text` text part applies to all uploaded files.
#[utoipa::path(
    post,
    path = "/api/books/{id}/images",
    params(("id" = i32, Path, description = "Book id")),
    request_body(content = String, content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 201, description = "Images stored"),
        (status = 400, description = "Not an image or too large"),
        (status = 404, description = "Book not found")
    ),
    tag = "images"
)]
pub async fn upload_images(
    State(state): State<AppState>,
    _admin: AdminClaims,
    Path(book_id): Path<i32>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, DomainError> {
    let mut files = Vec::new();
    let mut alt_text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(format!("Malformed upload: {}", e)))?
    {
        let file_name = field.file_name().map(str::to_string);
        let name = field.name().map(str::to_string);

        if file_name.is_none() && name.as_deref() == Some("alt_text") {
            alt_text = Some(
                field
                    .text()
                    .await
                    .map_err(|e| DomainError::validation(e.to_string()))?,
            );
            continue;
        }
        if file_name.is_none() && !matches!(name.as_deref(), Some("file" | "files")) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(format!("Failed to read upload: {}", e)))?;
        files.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let images = image_service::upload_images(
        state.db(),
        state.storage.as_ref(),
        state.max_upload_bytes,
        book_id,
        files,
        alt_text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(images)))
}

/// PUT /api/images/:id - Alt text and display order
pub async fn update_image(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateImageInput>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(image_service::update_image(&db, id, payload).await?))
}

/// PUT /api/images/:id/cover
#[utoipa::path(
    put,
    path = "/api/images/{id}/cover",
    params(("id" = i32, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image is now the cover"),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn set_cover(
    State(db): State<DatabaseConnection>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    Ok(Json(image_service::set_cover(&db, id).await?))
}

pub async fn delete_image(
    State(state): State<AppState>,
    _admin: AdminClaims,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, DomainError> {
    image_service::delete_image(state.db(), state.storage.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
