pub mod address;
pub mod auth;
pub mod author;
pub mod books;
pub mod cart;
pub mod category;
pub mod chat;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod images;
pub mod inventory;
pub mod order;
pub mod publisher;
pub mod user;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::infrastructure::AppState;

/// Multipart bodies may carry several files of `max_upload_bytes` each.
const MAX_FILES_PER_UPLOAD: usize = 10;

pub fn api_router(state: AppState) -> Router {
    let upload_limit = state
        .max_upload_bytes
        .saturating_mul(MAX_FILES_PER_UPLOAD)
        .saturating_add(64 * 1024);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me).put(auth::update_me))
        .route("/auth/password", put(auth::change_password))
        // Users (admin)
        .route("/users", get(user::list_users))
        .route(
            "/users/:id",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        // Catalog
        .route(
            "/authors",
            get(author::list_authors).post(author::create_author),
        )
        .route(
            "/authors/:id",
            get(author::get_author)
                .put(author::update_author)
                .delete(author::delete_author),
        )
        .route(
            "/publishers",
            get(publisher::list_publishers).post(publisher::create_publisher),
        )
        .route(
            "/publishers/:id",
            get(publisher::get_publisher)
                .put(publisher::update_publisher)
                .delete(publisher::delete_publisher),
        )
        .route(
            "/categories",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/categories/:id",
            get(category::get_category)
                .put(category::update_category)
                .delete(category::delete_category),
        )
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Images
        .route(
            "/books/:id/images",
            get(images::list_images)
                .post(images::upload_images)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/images/:id",
            put(images::update_image).delete(images::delete_image),
        )
        .route("/images/:id/cover", put(images::set_cover))
        // Inventory (admin)
        .route(
            "/inventory",
            get(inventory::list_stock).post(inventory::create_stock_item),
        )
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route("/inventory/transactions", get(inventory::list_transactions))
        .route(
            "/inventory/:id",
            get(inventory::get_stock).put(inventory::update_stock_item),
        )
        .route(
            "/inventory/:id/transactions",
            get(inventory::list_item_transactions).post(inventory::record_transaction),
        )
        // Addresses
        .route(
            "/addresses",
            get(address::list_addresses).post(address::create_address),
        )
        .route(
            "/addresses/:id",
            put(address::update_address).delete(address::delete_address),
        )
        .route("/addresses/:id/default", put(address::set_default))
        // Cart & checkout
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_to_cart))
        .route(
            "/cart/items/:id",
            put(cart::update_quantity).delete(cart::remove_item),
        )
        .route("/cart/checkout", post(cart::checkout))
        // Orders
        .route("/orders", get(order::list_my_orders).post(order::create_order))
        .route("/orders/:id", get(order::get_order))
        .route("/orders/:id/cancel", post(order::cancel_my_order))
        .route("/admin/orders", get(order::list_orders))
        .route("/admin/orders/:id/status", put(order::update_status))
        // Wishlist
        .route(
            "/wishlist",
            get(wishlist::list_wishlist).post(wishlist::add_to_wishlist),
        )
        .route("/wishlist/:book_id", axum::routing::delete(wishlist::remove))
        .route(
            "/wishlist/:book_id/move-to-cart",
            post(wishlist::move_to_cart),
        )
        // Dashboard (admin)
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/dashboard/revenue", get(dashboard::revenue_by_day))
        .route("/dashboard/top-books", get(dashboard::top_books))
        .route("/dashboard/recent-orders", get(dashboard::recent_orders))
        // Chatbot
        .route("/chat", post(chat::chat_handler))
        .with_state(state)
}

