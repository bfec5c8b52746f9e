//! Dashboard Service - Admin statistics
//!
//! Revenue figures never include cancelled orders.

use chrono::{Days, NaiveDate, Utc};
use sea_orm::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{DomainError, OrderStatus, Role};
use crate::models::author::Entity as Author;
use crate::models::book::Entity as Book;
use crate::models::category::Entity as Category;
use crate::models::order::{self, Entity as Order};
use crate::models::order_item::Entity as OrderItem;
use crate::models::publisher::Entity as Publisher;
use crate::models::user::{self, Entity as User};

use super::inventory_service;

pub const DEFAULT_REVENUE_DAYS: u32 = 30;
pub const MAX_REVENUE_DAYS: u32 = 365;
pub const DEFAULT_TOP_BOOKS: u64 = 5;
pub const DEFAULT_RECENT_ORDERS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub books: u64,
    pub authors: u64,
    pub publishers: u64,
    pub categories: u64,
    pub customers: u64,
    pub orders: u64,
    pub orders_by_status: BTreeMap<&'static str, u64>,
    pub total_revenue_cents: i64,
    pub low_stock_items: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: String,
    pub orders: u64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopBook {
    pub book_id: i32,
    pub title: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

pub async fn summary(db: &DatabaseConnection) -> Result<DashboardSummary, DomainError> {
    let mut orders_by_status = BTreeMap::new();
    let mut orders = 0;
    for status in OrderStatus::ALL {
        let count = Order::find()
            .filter(order::Column::Status.eq(status.as_str()))
            .count(db)
            .await?;
        orders += count;
        orders_by_status.insert(status.as_str(), count);
    }

    let totals: Vec<i64> = Order::find()
        .select_only()
        .column(order::Column::TotalCents)
        .filter(order::Column::Status.ne(OrderStatus::Cancelled.as_str()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(DashboardSummary {
        books: Book::find().count(db).await?,
        authors: Author::find().count(db).await?,
        publishers: Publisher::find().count(db).await?,
        categories: Category::find().count(db).await?,
        customers: User::find()
            .filter(user::Column::Role.eq(Role::Customer.as_str()))
            .count(db)
            .await?,
        orders,
        orders_by_status,
        total_revenue_cents: totals.into_iter().fold(0, i64::saturating_add),
        low_stock_items: inventory_service::count_low_stock(db).await?,
    })
}

/// Build a contiguous `days`-long series ending at `today` from
/// `(created_at, total_cents)` pairs.
pub fn bucket_by_day(today: NaiveDate, days: u32, orders: &[(String, i64)]) -> Vec<DailyRevenue> {
    let days = days.clamp(1, MAX_REVENUE_DAYS);
    let start = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(today);

    let mut buckets: BTreeMap<String, (u64, i64)> = start
        .iter_days()
        .take(days as usize)
        .map(|d| (d.format("%Y-%m-%d").to_string(), (0, 0)))
        .collect();

    for (created_at, total) in orders {
        let Some(day) = created_at.get(..10) else {
            continue;
        };
        if let Some(bucket) = buckets.get_mut(day) {
            bucket.0 += 1;
            bucket.1 = bucket.1.saturating_add(*total);
        }
    }

    buckets
        .into_iter()
        .map(|(date, (orders, revenue_cents))| DailyRevenue {
            date,
            orders,
            revenue_cents,
        })
        .collect()
}

pub async fn revenue_by_day(
    db: &DatabaseConnection,
    days: Option<u32>,
) -> Result<Vec<DailyRevenue>, DomainError> {
    let days = days.unwrap_or(DEFAULT_REVENUE_DAYS).clamp(1, MAX_REVENUE_DAYS);
    let today = Utc::now().date_naive();
    let start = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(today);

    let rows: Vec<(String, i64)> = Order::find()
        .select_only()
        .column(order::Column::CreatedAt)
        .column(order::Column::TotalCents)
        .filter(order::Column::Status.ne(OrderStatus::Cancelled.as_str()))
        .filter(order::Column::CreatedAt.gte(start.format("%Y-%m-%d").to_string()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(bucket_by_day(today, days, &rows))
}

/// Best sellers by units over non-cancelled orders.
pub async fn top_books(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<TopBook>, DomainError> {
    let limit = limit.unwrap_or(DEFAULT_TOP_BOOKS).clamp(1, 50) as usize;

    let items = OrderItem::find()
        .inner_join(Order)
        .filter(order::Column::Status.ne(OrderStatus::Cancelled.as_str()))
        .all(db)
        .await?;

    let mut by_book: HashMap<i32, TopBook> = HashMap::new();
    for item in items {
        let entry = by_book.entry(item.book_id).or_insert_with(|| TopBook {
            book_id: item.book_id,
            title: item.title.clone(),
            quantity_sold: 0,
            revenue_cents: 0,
        });
        entry.quantity_sold += i64::from(item.quantity);
        entry.revenue_cents = entry.revenue_cents.saturating_add(item.line_total_cents);
    }

    let mut ranked: Vec<TopBook> = by_book.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity_sold
            .cmp(&a.quantity_sold)
            .then(b.revenue_cents.cmp(&a.revenue_cents))
            .then(a.book_id.cmp(&b.book_id))
    });
    ranked.truncate(limit);
    Ok(ranked)
}

pub async fn recent_orders(
    db: &DatabaseConnection,
    limit: Option<u64>,
) -> Result<Vec<order::Model>, DomainError> {
    let limit = limit.unwrap_or(DEFAULT_RECENT_ORDERS).clamp(1, 100);
    Ok(Order::find()
        .order_by_desc(order::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}
