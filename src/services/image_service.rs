//! Book image service: uploads, ordering and cover selection
//!
//! Invariant: a book has at most one cover image, and whenever it has any
//! images exactly one of them is the cover.

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;

use crate::domain::storage::{ImageFormat, book_image_key};
use crate::domain::validation::optional_text;
use crate::domain::{DomainError, ObjectStorage};
use crate::models::book::Entity as Book;
use crate::models::book_image::{self, Entity as BookImage};
use crate::models::timestamp;

/// One file taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateImageInput {
    pub alt_text: Option<String>,
    pub display_order: Option<i32>,
}

struct Prepared {
    key: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

fn prepare(book_id: i32, file: UploadedFile, max_bytes: usize) -> Result<Prepared, DomainError> {
    let name = file.file_name.as_deref().unwrap_or("upload");
    if file.bytes.is_empty() {
        return Err(DomainError::validation(format!("File '{}' is empty", name)));
    }
    if file.bytes.len() > max_bytes {
        return Err(DomainError::validation(format!(
            "File '{}' exceeds the {} byte limit",
            name, max_bytes
        )));
    }
    let format = ImageFormat::detect(&file.bytes).ok_or_else(|| {
        DomainError::validation(format!(
            "File '{}' is not a supported image (JPEG, PNG, GIF, WebP)",
            name
        ))
    })?;

    Ok(Prepared {
        key: book_image_key(book_id, format),
        format,
        bytes: file.bytes,
    })
}

async fn discard(storage: &dyn ObjectStorage, keys: &[String]) {
    for key in keys {
        if let Err(e) = storage.delete(key).await {
            tracing::error!("Failed to clean up stored object {}: {}", key, e);
        }
    }
}

/// Store and register new images for a book.
///
/// All files are validated before anything is written. If storing or the
/// database insert fails, objects already written are removed again.
pub async fn upload_images(
    db: &DatabaseConnection,
    storage: &dyn ObjectStorage,
    max_bytes: usize,
    book_id: i32,
    files: Vec<UploadedFile>,
    alt_text: Option<String>,
) -> Result<Vec<book_image::Model>, DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("Book"));
    }
    if files.is_empty() {
        return Err(DomainError::validation("No image files uploaded"));
    }

    let prepared = files
        .into_iter()
        .map(|f| prepare(book_id, f, max_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    let mut stored: Vec<(String, String)> = Vec::with_capacity(prepared.len());
    for item in prepared {
        match storage
            .put(&item.key, item.bytes, item.format.content_type())
            .await
        {
            Ok(url) => stored.push((item.key, url)),
            Err(e) => {
                let keys: Vec<String> = stored.into_iter().map(|(k, _)| k).collect();
                discard(storage, &keys).await;
                return Err(e);
            }
        }
    }

    match insert_rows(db, book_id, &stored, optional_text(alt_text)).await {
        Ok(models) => {
            tracing::info!("Uploaded {} image(s) for book {}", models.len(), book_id);
            Ok(models)
        }
        Err(e) => {
            let keys: Vec<String> = stored.into_iter().map(|(k, _)| k).collect();
            discard(storage, &keys).await;
            Err(e)
        }
    }
}

async fn insert_rows(
    db: &DatabaseConnection,
    book_id: i32,
    stored: &[(String, String)],
    alt_text: Option<String>,
) -> Result<Vec<book_image::Model>, DomainError> {
    let txn = db.begin().await?;

    let existing = BookImage::find()
        .filter(book_image::Column::BookId.eq(book_id))
        .all(&txn)
        .await?;
    let mut next_order = existing
        .iter()
        .map(|img| img.display_order)
        .max()
        .map_or(0, |max| max + 1);
    let mut needs_cover = !existing.iter().any(|img| img.is_cover);

    let now = timestamp();
    let mut models = Vec::with_capacity(stored.len());
    for (key, url) in stored {
        let model = book_image::ActiveModel {
            book_id: Set(book_id),
            url: Set(url.clone()),
            storage_key: Set(key.clone()),
            alt_text: Set(alt_text.clone()),
            is_cover: Set(needs_cover),
            display_order: Set(next_order),
            created_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        needs_cover = false;
        next_order += 1;
        models.push(model);
    }

    txn.commit().await?;
    Ok(models)
}

pub async fn list_images(
    db: &DatabaseConnection,
    book_id: i32,
) -> Result<Vec<book_image::Model>, DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("Book"));
    }

    Ok(BookImage::find()
        .filter(book_image::Column::BookId.eq(book_id))
        .order_by_asc(book_image::Column::DisplayOrder)
        .order_by_asc(book_image::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_image<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<book_image::Model, DomainError> {
    BookImage::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Image"))
}

/// Make an image its book's cover, unsetting the previous cover.
pub async fn set_cover(db: &DatabaseConnection, id: i32) -> Result<book_image::Model, DomainError> {
    let txn = db.begin().await?;
    let image = get_image(&txn, id).await?;

    BookImage::update_many()
        .col_expr(book_image::Column::IsCover, Expr::value(false))
        .filter(book_image::Column::BookId.eq(image.book_id))
        .filter(book_image::Column::Id.ne(id))
        .exec(&txn)
        .await?;

    let mut active: book_image::ActiveModel = image.into();
    active.is_cover = Set(true);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!("Image {} is now the cover of book {}", id, updated.book_id);
    Ok(updated)
}

pub async fn update_image(
    db: &DatabaseConnection,
    id: i32,
    input: UpdateImageInput,
) -> Result<book_image::Model, DomainError> {
    let image = get_image(db, id).await?;

    let mut active: book_image::ActiveModel = image.into();
    if input.alt_text.is_some() {
        active.alt_text = Set(optional_text(input.alt_text));
    }
    if let Some(order) = input.display_order {
        if order < 0 {
            return Err(DomainError::validation("Display order cannot be negative"));
        }
        active.display_order = Set(order);
    }

    Ok(active.update(db).await?)
}

/// Delete an image row and its stored object.
///
/// When the cover is deleted, the first remaining image by display order
/// takes over.
pub async fn delete_image(
    db: &DatabaseConnection,
    storage: &dyn ObjectStorage,
    id: i32,
) -> Result<(), DomainError> {
    let txn = db.begin().await?;
    let image = get_image(&txn, id).await?;
    let (book_id, was_cover, key) = (image.book_id, image.is_cover, image.storage_key.clone());

    image.delete(&txn).await?;

    if was_cover
        && let Some(next) = BookImage::find()
            .filter(book_image::Column::BookId.eq(book_id))
            .order_by_asc(book_image::Column::DisplayOrder)
            .order_by_asc(book_image::Column::Id)
            .one(&txn)
            .await?
    {
        let mut active: book_image::ActiveModel = next.into();
        active.is_cover = Set(true);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(e) = storage.delete(&key).await {
        tracing::error!("Failed to remove stored image {}: {}", key, e);
    }

    tracing::info!("Deleted image {} of book {}", id, book_id);
    Ok(())
}
