//! Publisher Service

use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::validation::{optional_text, required_name};
use crate::models::book::{self, Entity as Book};
use crate::models::publisher::{self, Entity as Publisher};
use crate::models::timestamp;

use super::{Page, fetch_page};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PublisherInput {
    pub name: String,
    pub address: Option<String>,
    pub website: Option<String>,
}

pub async fn list_publishers(
    db: &DatabaseConnection,
    search: Option<String>,
    page: u64,
    limit: u64,
) -> Result<Page<publisher::Model>, DomainError> {
    let mut query = Publisher::find();
    if let Some(search) = optional_text(search) {
        query = query.filter(publisher::Column::Name.contains(&search));
    }
    fetch_page(db, query.order_by_asc(publisher::Column::Name), page, limit).await
}

pub async fn get_publisher(
    db: &DatabaseConnection,
    id: i32,
) -> Result<publisher::Model, DomainError> {
    Publisher::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Publisher"))
}

async fn ensure_unique_name(
    db: &DatabaseConnection,
    name: &str,
    except_id: Option<i32>,
) -> Result<(), DomainError> {
    let mut query = Publisher::find().filter(publisher::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(publisher::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(DomainError::conflict(format!(
            "Publisher '{}' already exists",
            name
        )));
    }
    Ok(())
}

pub async fn create_publisher(
    db: &DatabaseConnection,
    input: PublisherInput,
) -> Result<publisher::Model, DomainError> {
    let name = required_name("Publisher name", &input.name)?;
    ensure_unique_name(db, &name, None).await?;

    let now = timestamp();
    let model = publisher::ActiveModel {
        name: Set(name),
        address: Set(optional_text(input.address)),
        website: Set(optional_text(input.website)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created publisher {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_publisher(
    db: &DatabaseConnection,
    id: i32,
    input: PublisherInput,
) -> Result<publisher::Model, DomainError> {
    let existing = get_publisher(db, id).await?;
    let name = required_name("Publisher name", &input.name)?;
    ensure_unique_name(db, &name, Some(id)).await?;

    let mut active: publisher::ActiveModel = existing.into();
    active.name = Set(name);
    active.address = Set(optional_text(input.address));
    active.website = Set(optional_text(input.website));
    active.updated_at = Set(timestamp());

    Ok(active.update(db).await?)
}

/// Delete a publisher. Refused while books still reference it.
pub async fn delete_publisher(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let existing = get_publisher(db, id).await?;

    let books = Book::find()
        .filter(book::Column::PublisherId.eq(id))
        .count(db)
        .await?;
    if books > 0 {
        return Err(DomainError::conflict(format!(
            "Publisher still has {} book(s)",
            books
        )));
    }

    existing.delete(db).await?;
    tracing::info!("Deleted publisher {}", id);
    Ok(())
}
