//! Order Service - Placement, lifecycle and stock effects
//!
//! Stock moves with the order status:
//! - placing an order reserves stock
//! - cancelling releases the reservation
//! - shipping converts the reservation into an outbound movement

use chrono::{NaiveDate, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::domain::orders::{generate_order_number, line_total, shipping_fee, sum_cents};
use crate::domain::validation::{check_quantity, optional_text};
use crate::domain::{DomainError, OrderStatus};
use crate::models::book::{self, Entity as Book};
use crate::models::order::{self, Entity as Order};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::timestamp;

use super::{Page, address_service, fetch_page, inventory_service};

#[derive(Debug, Clone, Copy, Deserialize, utoipa::ToSchema)]
pub struct OrderLineInput {
    pub book_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderInput {
    pub address_id: i32,
    pub items: Vec<OrderLineInput>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub user_id: Option<i32>,
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// Who is asking: owners see their own orders, admins see all.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    pub user_id: i32,
    pub is_admin: bool,
}

/// Merge duplicate lines and reject empty orders or non-positive quantities.
pub fn merge_lines(lines: &[OrderLineInput]) -> Result<BTreeMap<i32, i32>, DomainError> {
    if lines.is_empty() {
        return Err(DomainError::validation("An order needs at least one item"));
    }

    let mut merged: BTreeMap<i32, i32> = BTreeMap::new();
    for line in lines {
        check_quantity(line.quantity)?;
        let entry = merged.entry(line.book_id).or_insert(0);
        *entry = entry
            .checked_add(line.quantity)
            .ok_or_else(|| DomainError::validation("Quantity is too large"))?;
    }
    Ok(merged)
}

/// Place an order inside the caller's transaction.
pub async fn place_order<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    address_id: i32,
    lines: &[OrderLineInput],
    note: Option<String>,
) -> Result<OrderDetail, DomainError> {
    let merged = merge_lines(lines)?;

    let address = address_service::get_owned(db, user_id, address_id)
        .await
        .map_err(|e| match e {
            DomainError::NotFound(_) => DomainError::validation(format!(
                "Address {} is not one of your addresses",
                address_id
            )),
            other => other,
        })?;

    let books: HashMap<i32, book::Model> = Book::find()
        .filter(book::Column::Id.is_in(merged.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let mut line_totals = BTreeMap::new();
    for (book_id, quantity) in &merged {
        let book = books
            .get(book_id)
            .filter(|b| b.is_active)
            .ok_or_else(|| DomainError::validation(format!("Book {} is not available", book_id)))?;
        line_totals.insert(*book_id, line_total(book.price_cents, *quantity)?);
    }
    let subtotal = sum_cents(line_totals.values().copied())?;
    let shipping = shipping_fee(subtotal);
    let total = sum_cents([subtotal, shipping])?;

    for (book_id, quantity) in &merged {
        if let Some(book) = books.get(book_id) {
            inventory_service::reserve(db, book.id, &book.title, *quantity).await?;
        }
    }

    let now = timestamp();

    let mut order_number = generate_order_number(Utc::now());
    while Order::find()
        .filter(order::Column::OrderNumber.eq(&order_number))
        .one(db)
        .await?
        .is_some()
    {
        order_number = generate_order_number(Utc::now());
    }

    let order = order::ActiveModel {
        order_number: Set(order_number),
        user_id: Set(user_id),
        address_id: Set(Some(address.id)),
        ship_recipient: Set(address.recipient_name.clone()),
        ship_phone: Set(address.phone.clone()),
        ship_address: Set(address.formatted()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        subtotal_cents: Set(subtotal),
        shipping_cents: Set(shipping),
        total_cents: Set(total),
        note: Set(optional_text(note)),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut items = Vec::with_capacity(merged.len());
    for (book_id, quantity) in merged {
        // Presence checked in the pricing loop above
        let (Some(book), Some(line_total_cents)) = (books.get(&book_id), line_totals.get(&book_id))
        else {
            continue;
        };
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            book_id: Set(book_id),
            title: Set(book.title.clone()),
            quantity: Set(quantity),
            unit_price_cents: Set(book.price_cents),
            line_total_cents: Set(*line_total_cents),
            ..Default::default()
        }
        .insert(db)
        .await?;
        items.push(item);
    }

    tracing::info!(
        "Order {} placed by user {}: {} line(s), total {}",
        order.order_number,
        user_id,
        items.len(),
        order.total_cents
    );

    Ok(OrderDetail { order, items })
}

pub async fn create_order(
    db: &DatabaseConnection,
    user_id: i32,
    input: CreateOrderInput,
) -> Result<OrderDetail, DomainError> {
    let txn = db.begin().await?;
    let detail = place_order(&txn, user_id, input.address_id, &input.items, input.note).await?;
    txn.commit().await?;
    Ok(detail)
}

async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
) -> Result<Vec<order_item::Model>, DomainError> {
    Ok(OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_order(
    db: &DatabaseConnection,
    viewer: Viewer,
    id: i32,
) -> Result<OrderDetail, DomainError> {
    let order = Order::find_by_id(id)
        .one(db)
        .await?
        .filter(|o| viewer.is_admin || o.user_id == viewer.user_id)
        .ok_or_else(|| DomainError::not_found("Order"))?;
    let items = load_items(db, id).await?;
    Ok(OrderDetail { order, items })
}

/// Parse a `YYYY-MM-DD` bound into the timestamp prefix it compares against.
fn day_start(raw: &str, field: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("{} must be a date like 2024-01-31", field)))
}

pub async fn list_orders(
    db: &DatabaseConnection,
    filter: OrderFilter,
) -> Result<Page<order::Model>, DomainError> {
    let mut query = Order::find();

    if let Some(user_id) = filter.user_id {
        query = query.filter(order::Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(order::Column::Status.eq(status.as_str()));
    }
    if let Some(search) = optional_text(filter.search) {
        query = query.filter(
            Condition::any()
                .add(order::Column::OrderNumber.contains(&search))
                .add(order::Column::ShipRecipient.contains(&search)),
        );
    }
    if let Some(from) = optional_text(filter.from) {
        let from = day_start(&from, "from")?;
        query = query.filter(order::Column::CreatedAt.gte(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = optional_text(filter.to) {
        let end = day_start(&to, "to")?
            .succ_opt()
            .ok_or_else(|| DomainError::validation("to is out of range"))?;
        query = query.filter(order::Column::CreatedAt.lt(end.format("%Y-%m-%d").to_string()));
    }

    fetch_page(
        db,
        query.order_by_desc(order::Column::Id),
        filter.page,
        filter.limit,
    )
    .await
}

async fn transition<C: ConnectionTrait>(
    db: &C,
    order: order::Model,
    next: OrderStatus,
    actor: Option<i32>,
) -> Result<order::Model, DomainError> {
    let current = order.status()?;
    let next = current.transition(next)?;
    let items = load_items(db, order.id).await?;

    match next {
        OrderStatus::Cancelled => {
            for item in &items {
                inventory_service::release(db, item.book_id, item.quantity).await?;
            }
        }
        OrderStatus::Shipped => {
            for item in &items {
                inventory_service::ship_reserved(
                    db,
                    item.book_id,
                    item.quantity,
                    &order.order_number,
                    actor,
                )
                .await?;
            }
        }
        OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Delivered => {}
    }

    let number = order.order_number.clone();
    let mut active: order::ActiveModel = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(timestamp());
    let updated = active.update(db).await?;

    tracing::info!("Order {}: {} -> {}", number, current, next);
    Ok(updated)
}

/// Admin status change.
pub async fn update_status(
    db: &DatabaseConnection,
    admin_id: i32,
    id: i32,
    next: OrderStatus,
) -> Result<OrderDetail, DomainError> {
    let txn = db.begin().await?;
    let order = Order::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Order"))?;

    let updated = transition(&txn, order, next, Some(admin_id)).await?;
    let items = load_items(&txn, id).await?;
    txn.commit().await?;

    Ok(OrderDetail {
        order: updated,
        items,
    })
}

/// Customers may cancel their own orders while they are still pending.
pub async fn cancel_my_order(
    db: &DatabaseConnection,
    user_id: i32,
    id: i32,
) -> Result<OrderDetail, DomainError> {
    let txn = db.begin().await?;
    let order = Order::find_by_id(id)
        .filter(order::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Order"))?;

    if order.status()? != OrderStatus::Pending {
        return Err(DomainError::validation(
            "Only pending orders can be cancelled; contact support",
        ));
    }

    let updated = transition(&txn, order, OrderStatus::Cancelled, Some(user_id)).await?;
    let items = load_items(&txn, id).await?;
    txn.commit().await?;

    Ok(OrderDetail {
        order: updated,
        items,
    })
}
