//! Cart Service - Per-user shopping cart and checkout
//!
//! Checkout turns some or all cart lines into an order and removes exactly
//! the lines that were ordered, all inside one transaction.

use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::DomainError;
use crate::domain::orders::{line_total, sum_cents};
use crate::domain::validation::check_quantity;
use crate::models::book::Entity as Book;
use crate::models::book_image::{self, Entity as BookImage};
use crate::models::cart_item::{self, Entity as CartItem};
use crate::models::timestamp;

use super::book_service::available_stock_by_book;
use super::order_service::{self, OrderDetail, OrderLineInput};

#[derive(Debug, Clone, Copy, Deserialize, utoipa::ToSchema)]
pub struct AddToCartInput {
    pub book_id: i32,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CheckoutInput {
    pub address_id: i32,
    /// Cart line ids to order; every line when absent or empty
    #[serde(default)]
    pub cart_item_ids: Option<Vec<i32>>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: i32,
    pub book_id: i32,
    pub title: String,
    pub unit_price_cents: i64,
    pub quantity: i32,
    pub line_total_cents: i64,
    pub cover_url: Option<String>,
    pub available_stock: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: i32,
    pub subtotal_cents: i64,
}

pub async fn get_cart(db: &DatabaseConnection, user_id: i32) -> Result<CartView, DomainError> {
    let rows = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .order_by_asc(cart_item::Column::Id)
        .find_also_related(Book)
        .all(db)
        .await?;

    let book_ids: Vec<i32> = rows.iter().map(|(item, _)| item.book_id).collect();
    let covers: HashMap<i32, String> = BookImage::find()
        .filter(book_image::Column::BookId.is_in(book_ids.clone()))
        .filter(book_image::Column::IsCover.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|img| (img.book_id, img.url))
        .collect();
    let stock = available_stock_by_book(db, book_ids).await?;

    let mut items = Vec::with_capacity(rows.len());
    for (item, book) in rows {
        let Some(book) = book else {
            continue;
        };
        items.push(CartLine {
            id: item.id,
            book_id: book.id,
            unit_price_cents: book.price_cents,
            quantity: item.quantity,
            line_total_cents: line_total(book.price_cents, item.quantity)?,
            cover_url: covers.get(&book.id).cloned(),
            available_stock: stock.get(&book.id).copied().unwrap_or(0),
            is_active: book.is_active,
            title: book.title,
        });
    }

    Ok(CartView {
        item_count: items.iter().fold(0, |acc, l| acc.saturating_add(l.quantity)),
        subtotal_cents: sum_cents(items.iter().map(|l| l.line_total_cents))?,
        items,
    })
}

/// Add `quantity` of a book, merging with an existing line.
pub async fn add_line<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    book_id: i32,
    quantity: i32,
) -> Result<cart_item::Model, DomainError> {
    check_quantity(quantity)?;

    let book = Book::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;
    if !book.is_active {
        return Err(DomainError::validation(format!(
            "'{}' is no longer available",
            book.title
        )));
    }

    let now = timestamp();
    let existing = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .filter(cart_item::Column::BookId.eq(book_id))
        .one(db)
        .await?;

    let model = match existing {
        Some(line) => {
            let merged = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| DomainError::validation("Quantity is too large"))?;
            line_total(book.price_cents, merged)?;
            let mut active: cart_item::ActiveModel = line.into();
            active.quantity = Set(merged);
            active.updated_at = Set(now);
            active.update(db).await?
        }
        None => {
            line_total(book.price_cents, quantity)?;
            cart_item::ActiveModel {
                user_id: Set(user_id),
                book_id: Set(book_id),
                quantity: Set(quantity),
                created_at: Set(now.clone()),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    Ok(model)
}

pub async fn add_to_cart(
    db: &DatabaseConnection,
    user_id: i32,
    input: AddToCartInput,
) -> Result<CartView, DomainError> {
    add_line(db, user_id, input.book_id, input.quantity).await?;
    get_cart(db, user_id).await
}

async fn owned_line(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
) -> Result<cart_item::Model, DomainError> {
    CartItem::find_by_id(item_id)
        .filter(cart_item::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Cart item"))
}

/// Set a line's quantity; zero removes the line.
pub async fn update_quantity(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
    quantity: i32,
) -> Result<CartView, DomainError> {
    if quantity < 0 {
        return Err(DomainError::validation("Quantity cannot be negative"));
    }

    let line = owned_line(db, user_id, item_id).await?;
    if quantity == 0 {
        line.delete(db).await?;
    } else {
        let book = Book::find_by_id(line.book_id)
            .one(db)
            .await?
            .ok_or_else(|| DomainError::not_found("Book"))?;
        line_total(book.price_cents, quantity)?;
        let mut active: cart_item::ActiveModel = line.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(timestamp());
        active.update(db).await?;
    }
    get_cart(db, user_id).await
}

pub async fn remove_item(
    db: &DatabaseConnection,
    user_id: i32,
    item_id: i32,
) -> Result<CartView, DomainError> {
    owned_line(db, user_id, item_id).await?.delete(db).await?;
    get_cart(db, user_id).await
}

pub async fn clear_cart(db: &DatabaseConnection, user_id: i32) -> Result<u64, DomainError> {
    let res = CartItem::delete_many()
        .filter(cart_item::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Order the selected cart lines (or all of them) and drop those lines.
pub async fn checkout(
    db: &DatabaseConnection,
    user_id: i32,
    input: CheckoutInput,
) -> Result<OrderDetail, DomainError> {
    let selected: Option<HashSet<i32>> = input
        .cart_item_ids
        .filter(|ids| !ids.is_empty())
        .map(|ids| ids.into_iter().collect());

    let txn = db.begin().await?;

    let lines = CartItem::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .order_by_asc(cart_item::Column::Id)
        .all(&txn)
        .await?;

    let chosen: Vec<cart_item::Model> = match &selected {
        Some(ids) => {
            let chosen: Vec<_> = lines.into_iter().filter(|l| ids.contains(&l.id)).collect();
            if chosen.len() != ids.len() {
                return Err(DomainError::validation(
                    "Some selected items are not in your cart",
                ));
            }
            chosen
        }
        None => lines,
    };
    if chosen.is_empty() {
        return Err(DomainError::validation("Your cart is empty"));
    }

    let order_lines: Vec<OrderLineInput> = chosen
        .iter()
        .map(|l| OrderLineInput {
            book_id: l.book_id,
            quantity: l.quantity,
        })
        .collect();

    let detail =
        order_service::place_order(&txn, user_id, input.address_id, &order_lines, input.note)
            .await?;

    CartItem::delete_many()
        .filter(cart_item::Column::Id.is_in(chosen.iter().map(|l| l.id).collect::<Vec<_>>()))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        "Checkout by user {} ordered {} cart line(s) as {}",
        user_id,
        chosen.len(),
        detail.order.order_number
    );
    Ok(detail)
}

