//! Wishlist Service

use sea_orm::*;
use serde::Serialize;

use crate::domain::DomainError;
use crate::models::book::Entity as Book;
use crate::models::timestamp;
use crate::models::wishlist_item::{self, Entity as WishlistItem};

use super::book_service::{self, BookSummary};
use super::cart_service::{self, CartView};

#[derive(Debug, Clone, Serialize)]
pub struct WishlistEntry {
    pub id: i32,
    pub added_at: String,
    pub book: BookSummary,
}

pub async fn list_wishlist(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<WishlistEntry>, DomainError> {
    let rows = WishlistItem::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .order_by_desc(wishlist_item::Column::Id)
        .find_also_related(Book)
        .all(db)
        .await?;

    let (entries, books): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .filter_map(|(item, book)| book.map(|b| (item, b)))
        .unzip();
    let summaries = book_service::summarize(db, books).await?;

    Ok(entries
        .into_iter()
        .zip(summaries)
        .map(|(item, book)| WishlistEntry {
            id: item.id,
            added_at: item.created_at,
            book,
        })
        .collect())
}

/// Add a book; adding it twice returns the row that is already there.
pub async fn add_to_wishlist(
    db: &DatabaseConnection,
    user_id: i32,
    book_id: i32,
) -> Result<(wishlist_item::Model, bool), DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("Book"));
    }

    if let Some(existing) = WishlistItem::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .filter(wishlist_item::Column::BookId.eq(book_id))
        .one(db)
        .await?
    {
        return Ok((existing, false));
    }

    let model = wishlist_item::ActiveModel {
        user_id: Set(user_id),
        book_id: Set(book_id),
        created_at: Set(timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok((model, true))
}

pub async fn remove_from_wishlist(
    db: &DatabaseConnection,
    user_id: i32,
    book_id: i32,
) -> Result<(), DomainError> {
    let res = WishlistItem::delete_many()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .filter(wishlist_item::Column::BookId.eq(book_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(DomainError::not_found("Wishlist item"));
    }
    Ok(())
}

/// Put one unit of a wished-for book in the cart and drop the wish.
pub async fn move_to_cart(
    db: &DatabaseConnection,
    user_id: i32,
    book_id: i32,
) -> Result<CartView, DomainError> {
    let txn = db.begin().await?;

    let item = WishlistItem::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .filter(wishlist_item::Column::BookId.eq(book_id))
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Wishlist item"))?;

    cart_service::add_line(&txn, user_id, book_id, 1).await?;
    item.delete(&txn).await?;
    txn.commit().await?;

    cart_service::get_cart(db, user_id).await
}
