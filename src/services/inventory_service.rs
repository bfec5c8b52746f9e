//! Inventory Service - Stock rows, movements and order reservations
//!
//! Every change to `quantity` is written together with an
//! `inventory_transactions` row in the same database transaction.
//! Reservations only move `reserved_quantity` and are not logged.

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::validation::optional_text;
use crate::domain::{DomainError, TransactionKind};
use crate::models::book::{self, Entity as Book};
use crate::models::inventory_transaction::{self, Entity as InventoryTransaction};
use crate::models::stock_item::{self, Entity as StockItem};
use crate::models::timestamp;

use super::{Page, fetch_page};

pub const DEFAULT_WAREHOUSE: &str = "MAIN";

/// Stock row as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub item: stock_item::Model,
    pub available: i32,
    pub is_low: bool,
    pub book_title: Option<String>,
}

impl StockView {
    fn new(item: stock_item::Model, book_title: Option<String>) -> Self {
        let levels = item.levels();
        Self {
            available: levels.available(),
            is_low: levels.is_low(item.reorder_level),
            item,
            book_title,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct StockFilter {
    pub low_stock_only: bool,
    pub warehouse: Option<String>,
    pub book_id: Option<i32>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateStockInput {
    pub book_id: i32,
    pub warehouse: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub reorder_level: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TransactionInput {
    pub kind: TransactionKind,
    pub quantity: i32,
    pub reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub stock_item_id: Option<i32>,
    pub kind: Option<TransactionKind>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResult {
    pub transaction: inventory_transaction::Model,
    pub stock: StockView,
}

fn normalize_warehouse(raw: Option<String>) -> String {
    optional_text(raw)
        .map(|w| w.to_uppercase())
        .unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string())
}

async fn with_titles(
    db: &DatabaseConnection,
    items: Vec<stock_item::Model>,
) -> Result<Vec<StockView>, DomainError> {
    let book_ids: Vec<i32> = items.iter().map(|i| i.book_id).collect();
    let titles: HashMap<i32, String> = if book_ids.is_empty() {
        HashMap::new()
    } else {
        Book::find()
            .filter(book::Column::Id.is_in(book_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b.title))
            .collect()
    };

    Ok(items
        .into_iter()
        .map(|item| {
            let title = titles.get(&item.book_id).cloned();
            StockView::new(item, title)
        })
        .collect())
}

fn low_stock_condition() -> SimpleExpr {
    Expr::expr(
        Expr::col(stock_item::Column::Quantity)
            .sub(Expr::col(stock_item::Column::ReservedQuantity)),
    )
    .lte(Expr::col(stock_item::Column::ReorderLevel))
}

pub async fn list_stock(
    db: &DatabaseConnection,
    filter: StockFilter,
) -> Result<Page<StockView>, DomainError> {
    let mut query = StockItem::find();

    if filter.low_stock_only {
        query = query.filter(low_stock_condition());
    }
    if let Some(warehouse) = optional_text(filter.warehouse) {
        query = query.filter(stock_item::Column::Warehouse.eq(warehouse.to_uppercase()));
    }
    if let Some(book_id) = filter.book_id {
        query = query.filter(stock_item::Column::BookId.eq(book_id));
    }

    let page = fetch_page(
        db,
        query.order_by_asc(stock_item::Column::Id),
        filter.page,
        filter.limit,
    )
    .await?;

    let items = with_titles(db, page.items).await?;
    Ok(Page {
        items,
        total: page.total,
        page: page.page,
        limit: page.limit,
    })
}

/// All stock rows at or below their reorder level.
pub async fn low_stock(db: &DatabaseConnection) -> Result<Vec<StockView>, DomainError> {
    let items = StockItem::find()
        .filter(low_stock_condition())
        .order_by_asc(stock_item::Column::Id)
        .all(db)
        .await?;
    with_titles(db, items).await
}

pub async fn count_low_stock(db: &DatabaseConnection) -> Result<u64, DomainError> {
    Ok(StockItem::find()
        .filter(low_stock_condition())
        .count(db)
        .await?)
}

async fn find_item<C: ConnectionTrait>(db: &C, id: i32) -> Result<stock_item::Model, DomainError> {
    StockItem::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Stock item"))
}

pub async fn get_stock(db: &DatabaseConnection, id: i32) -> Result<StockView, DomainError> {
    let item = find_item(db, id).await?;
    let title = Book::find_by_id(item.book_id).one(db).await?.map(|b| b.title);
    Ok(StockView::new(item, title))
}

pub async fn create_stock_item(
    db: &DatabaseConnection,
    input: CreateStockInput,
    created_by: Option<i32>,
) -> Result<StockView, DomainError> {
    if input.quantity < 0 {
        return Err(DomainError::validation("Initial quantity cannot be negative"));
    }
    if input.reorder_level < 0 {
        return Err(DomainError::validation("Reorder level cannot be negative"));
    }

    let warehouse = normalize_warehouse(input.warehouse);
    let txn = db.begin().await?;

    let book = Book::find_by_id(input.book_id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::validation(format!("Book {} does not exist", input.book_id)))?;

    let duplicate = StockItem::find()
        .filter(stock_item::Column::BookId.eq(input.book_id))
        .filter(stock_item::Column::Warehouse.eq(&warehouse))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(DomainError::conflict(format!(
            "Book {} already has a stock item in warehouse {}",
            input.book_id, warehouse
        )));
    }

    let now = timestamp();
    let mut item = stock_item::ActiveModel {
        book_id: Set(input.book_id),
        warehouse: Set(warehouse),
        quantity: Set(0),
        reserved_quantity: Set(0),
        reorder_level: Set(input.reorder_level),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if input.quantity > 0 {
        let (_, updated) = apply_movement(
            &txn,
            item,
            TransactionKind::Inbound,
            input.quantity,
            None,
            Some("Initial stock".to_string()),
            created_by,
        )
        .await?;
        item = updated;
    }

    txn.commit().await?;
    tracing::info!(
        "Created stock item {} for book {} in {}",
        item.id,
        item.book_id,
        item.warehouse
    );
    Ok(StockView::new(item, Some(book.title)))
}

pub async fn update_reorder_level(
    db: &DatabaseConnection,
    id: i32,
    reorder_level: i32,
) -> Result<StockView, DomainError> {
    if reorder_level < 0 {
        return Err(DomainError::validation("Reorder level cannot be negative"));
    }
    let item = find_item(db, id).await?;

    let mut active: stock_item::ActiveModel = item.into();
    active.reorder_level = Set(reorder_level);
    active.updated_at = Set(timestamp());
    active.update(db).await?;

    get_stock(db, id).await
}

/// Apply a movement to a stock row and log it. Runs on the caller's connection.
async fn apply_movement<C: ConnectionTrait>(
    db: &C,
    item: stock_item::Model,
    kind: TransactionKind,
    quantity: i32,
    reference: Option<String>,
    note: Option<String>,
    created_by: Option<i32>,
) -> Result<(inventory_transaction::Model, stock_item::Model), DomainError> {
    let before = item.quantity;
    let after = item.levels().apply(kind, quantity)?;
    let now = timestamp();

    let mut active: stock_item::ActiveModel = item.into();
    active.quantity = Set(after);
    active.updated_at = Set(now.clone());
    let updated = active.update(db).await?;

    let logged = inventory_transaction::ActiveModel {
        stock_item_id: Set(updated.id),
        kind: Set(kind.as_str().to_string()),
        quantity: Set(quantity),
        quantity_before: Set(before),
        quantity_after: Set(after),
        reference: Set(optional_text(reference)),
        note: Set(optional_text(note)),
        created_by: Set(created_by),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok((logged, updated))
}

pub async fn record_transaction(
    db: &DatabaseConnection,
    stock_item_id: i32,
    input: TransactionInput,
    created_by: Option<i32>,
) -> Result<TransactionResult, DomainError> {
    let txn = db.begin().await?;
    let item = find_item(&txn, stock_item_id).await?;

    let (transaction, updated) = apply_movement(
        &txn,
        item,
        input.kind,
        input.quantity,
        input.reference,
        input.note,
        created_by,
    )
    .await?;
    txn.commit().await?;

    tracing::info!(
        "Stock item {}: {} {} ({} -> {})",
        stock_item_id,
        transaction.kind,
        transaction.quantity,
        transaction.quantity_before,
        transaction.quantity_after
    );

    let title = Book::find_by_id(updated.book_id).one(db).await?.map(|b| b.title);
    Ok(TransactionResult {
        transaction,
        stock: StockView::new(updated, title),
    })
}

pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: TransactionFilter,
) -> Result<Page<inventory_transaction::Model>, DomainError> {
    let mut query = InventoryTransaction::find();
    if let Some(id) = filter.stock_item_id {
        query = query.filter(inventory_transaction::Column::StockItemId.eq(id));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(inventory_transaction::Column::Kind.eq(kind.as_str()));
    }

    fetch_page(
        db,
        query.order_by_desc(inventory_transaction::Column::Id),
        filter.page,
        filter.limit,
    )
    .await
}

async fn rows_for_book<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
) -> Result<Vec<stock_item::Model>, DomainError> {
    Ok(StockItem::find()
        .filter(stock_item::Column::BookId.eq(book_id))
        .order_by_asc(stock_item::Column::Id)
        .all(db)
        .await?)
}

/// Hold `quantity` units of a book for an order, spreading across warehouses.
pub async fn reserve<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
    title: &str,
    quantity: i32,
) -> Result<(), DomainError> {
    let rows = rows_for_book(db, book_id).await?;
    let available: i64 = rows
        .iter()
        .map(|r| i64::from(r.levels().available().max(0)))
        .sum();
    if available < i64::from(quantity) {
        return Err(DomainError::conflict(format!(
            "Insufficient stock for '{}': {} available, {} requested",
            title, available, quantity
        )));
    }

    let mut remaining = quantity;
    for row in rows {
        if remaining == 0 {
            break;
        }
        let take = row.levels().available().max(0).min(remaining);
        if take == 0 {
            continue;
        }
        remaining -= take;

        let reserved = row.reserved_quantity + take;
        let mut active: stock_item::ActiveModel = row.into();
        active.reserved_quantity = Set(reserved);
        active.updated_at = Set(timestamp());
        active.update(db).await?;
    }

    Ok(())
}

/// Return previously reserved units to the available pool.
pub async fn release<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
    quantity: i32,
) -> Result<(), DomainError> {
    let mut remaining = quantity;
    for row in rows_for_book(db, book_id).await? {
        if remaining == 0 {
            break;
        }
        let take = row.reserved_quantity.min(remaining);
        if take == 0 {
            continue;
        }
        remaining -= take;

        let reserved = row.reserved_quantity - take;
        let mut active: stock_item::ActiveModel = row.into();
        active.reserved_quantity = Set(reserved);
        active.updated_at = Set(timestamp());
        active.update(db).await?;
    }

    if remaining > 0 {
        tracing::warn!(
            "Released {} fewer units than requested for book {}",
            remaining,
            book_id
        );
    }
    Ok(())
}

/// Turn a reservation into an outbound movement when an order ships.
pub async fn ship_reserved<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
    quantity: i32,
    reference: &str,
    created_by: Option<i32>,
) -> Result<(), DomainError> {
    let mut remaining = quantity;
    for row in rows_for_book(db, book_id).await? {
        if remaining == 0 {
            break;
        }
        let take = row.reserved_quantity.min(remaining);
        if take == 0 {
            continue;
        }
        remaining -= take;

        // Drop the hold first so the outbound check sees the units as free
        let reserved = row.reserved_quantity - take;
        let mut active: stock_item::ActiveModel = row.into();
        active.reserved_quantity = Set(reserved);
        let released = active.update(db).await?;

        apply_movement(
            db,
            released,
            TransactionKind::Outbound,
            take,
            Some(reference.to_string()),
            Some("Order shipped".to_string()),
            created_by,
        )
        .await?;
    }

    if remaining > 0 {
        return Err(DomainError::conflict(format!(
            "Book {} has {} fewer reserved units than the order requires",
            book_id, remaining
        )));
    }
    Ok(())
}
