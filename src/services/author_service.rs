//! Author Service

use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::validation::{optional_text, required_name};
use crate::models::author::{self, Entity as Author};
use crate::models::book_authors::{self, Entity as BookAuthor};
use crate::models::timestamp;

use super::{Page, fetch_page};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AuthorInput {
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: Option<String>,
}

pub async fn list_authors(
    db: &DatabaseConnection,
    search: Option<String>,
    page: u64,
    limit: u64,
) -> Result<Page<author::Model>, DomainError> {
    let mut query = Author::find();
    if let Some(search) = optional_text(search) {
        query = query.filter(author::Column::Name.contains(&search));
    }
    fetch_page(db, query.order_by_asc(author::Column::Name), page, limit).await
}

pub async fn get_author(db: &DatabaseConnection, id: i32) -> Result<author::Model, DomainError> {
    Author::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Author"))
}

pub async fn create_author(
    db: &DatabaseConnection,
    input: AuthorInput,
) -> Result<author::Model, DomainError> {
    let now = timestamp();
    let model = author::ActiveModel {
        name: Set(required_name("Author name", &input.name)?),
        biography: Set(optional_text(input.biography)),
        birth_date: Set(optional_text(input.birth_date)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created author {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_author(
    db: &DatabaseConnection,
    id: i32,
    input: AuthorInput,
) -> Result<author::Model, DomainError> {
    let existing = get_author(db, id).await?;

    let mut active: author::ActiveModel = existing.into();
    active.name = Set(required_name("Author name", &input.name)?);
    active.biography = Set(optional_text(input.biography));
    active.birth_date = Set(optional_text(input.birth_date));
    active.updated_at = Set(timestamp());

    Ok(active.update(db).await?)
}

/// Delete an author and unlink it from its books.
pub async fn delete_author(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let txn = db.begin().await?;

    BookAuthor::delete_many()
        .filter(book_authors::Column::AuthorId.eq(id))
        .exec(&txn)
        .await?;

    let result = Author::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Author"));
    }

    txn.commit().await?;
    tracing::info!("Deleted author {}", id);
    Ok(())
}
