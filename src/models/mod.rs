pub mod address;
pub mod author;
pub mod book;
pub mod book_authors;
pub mod book_categories;
pub mod book_image;
pub mod cart_item;
pub mod category;
pub mod inventory_transaction;
pub mod order;
pub mod order_item;
pub mod publisher;
pub mod stock_item;
pub mod user;
pub mod wishlist_item;

use chrono::{SecondsFormat, Utc};

/// Current time as stored in every `created_at` / `updated_at` column.
///
/// Fixed-width UTC so that string comparison matches chronological order.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
