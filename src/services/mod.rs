//! Services Layer
//!
//! Business logic extracted from HTTP handlers. Each service works on a
//! `DatabaseConnection` (plus the object store for images) and returns
//! `DomainError` so handlers stay thin.

pub mod address_service;
pub mod author_service;
pub mod book_service;
pub mod cart_service;
pub mod category_service;
pub mod chat_service;
pub mod dashboard_service;
pub mod image_service;
pub mod inventory_service;
pub mod order_service;
pub mod publisher_service;
pub mod user_service;
pub mod wishlist_service;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

use crate::domain::DomainError;

/// One page of a listing, with the total across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Run `query` for the 1-based `page`.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    query: Select<E>,
    page: u64,
    limit: u64,
) -> Result<Page<E::Model>, DomainError>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.saturating_sub(1)).await?;
    Ok(Page {
        items,
        total,
        page,
        limit,
    })
}
