//! Category Service
//!
//! Categories nest one level deep: a category's parent must be top-level,
//! and a category that has children cannot itself be given a parent.

use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::validation::{optional_text, required_name};
use crate::models::book_categories::{self, Entity as BookCategory};
use crate::models::category::{self, Entity as Category};
use crate::models::timestamp;

use super::{Page, fetch_page};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
}

pub async fn list_categories(
    db: &DatabaseConnection,
    search: Option<String>,
    parent_id: Option<i32>,
    page: u64,
    limit: u64,
) -> Result<Page<category::Model>, DomainError> {
    let mut query = Category::find();
    if let Some(search) = optional_text(search) {
        query = query.filter(category::Column::Name.contains(&search));
    }
    if let Some(parent_id) = parent_id {
        query = query.filter(category::Column::ParentId.eq(parent_id));
    }
    fetch_page(db, query.order_by_asc(category::Column::Name), page, limit).await
}

pub async fn get_category(
    db: &DatabaseConnection,
    id: i32,
) -> Result<category::Model, DomainError> {
    Category::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Category"))
}

async fn ensure_unique_name(
    db: &DatabaseConnection,
    name: &str,
    except_id: Option<i32>,
) -> Result<(), DomainError> {
    let mut query = Category::find().filter(category::Column::Name.eq(name));
    if let Some(id) = except_id {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(DomainError::conflict(format!(
            "Category '{}' already exists",
            name
        )));
    }
    Ok(())
}

async fn check_parent(
    db: &DatabaseConnection,
    id: Option<i32>,
    parent_id: Option<i32>,
) -> Result<(), DomainError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if Some(parent_id) == id {
        return Err(DomainError::validation("A category cannot be its own parent"));
    }

    let parent = Category::find_by_id(parent_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::validation(format!("Parent category {} does not exist", parent_id)))?;
    if parent.parent_id.is_some() {
        return Err(DomainError::validation(
            "Parent category must be a top-level category",
        ));
    }

    if let Some(id) = id {
        let children = Category::find()
            .filter(category::Column::ParentId.eq(id))
            .count(db)
            .await?;
        if children > 0 {
            return Err(DomainError::validation(
                "A category with subcategories cannot be nested",
            ));
        }
    }

    Ok(())
}

pub async fn create_category(
    db: &DatabaseConnection,
    input: CategoryInput,
) -> Result<category::Model, DomainError> {
    let name = required_name("Category name", &input.name)?;
    ensure_unique_name(db, &name, None).await?;
    check_parent(db, None, input.parent_id).await?;

    let now = timestamp();
    let model = category::ActiveModel {
        name: Set(name),
        description: Set(optional_text(input.description)),
        parent_id: Set(input.parent_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Created category {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_category(
    db: &DatabaseConnection,
    id: i32,
    input: CategoryInput,
) -> Result<category::Model, DomainError> {
    let existing = get_category(db, id).await?;
    let name = required_name("Category name", &input.name)?;
    ensure_unique_name(db, &name, Some(id)).await?;
    check_parent(db, Some(id), input.parent_id).await?;

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(optional_text(input.description));
    active.parent_id = Set(input.parent_id);
    active.updated_at = Set(timestamp());

    Ok(active.update(db).await?)
}

/// Delete a category, unlinking its books and promoting its children to top level.
pub async fn delete_category(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let txn = db.begin().await?;

    BookCategory::delete_many()
        .filter(book_categories::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;

    Category::update_many()
        .col_expr(
            category::Column::ParentId,
            sea_orm::sea_query::Expr::value(Option::<i32>::None),
        )
        .filter(category::Column::ParentId.eq(id))
        .exec(&txn)
        .await?;

    let result = Category::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Category"));
    }

    txn.commit().await?;
    tracing::info!("Deleted category {}", id);
    Ok(())
}
