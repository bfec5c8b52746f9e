use crate::api;
use crate::domain::{OrderStatus, Role, TransactionKind};
use crate::services::{
    address_service, author_service, book_service, cart_service, category_service, chat_service,
    image_service, inventory_service, order_service, publisher_service, user_service,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::register,
        api::auth::login,
        api::author::list_authors,
        api::author::create_author,
        api::books::list_books,
        api::books::get_book,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::images::upload_images,
        api::images::set_cover,
        api::inventory::record_transaction,
        api::cart::checkout,
        api::order::create_order,
        api::order::update_status,
        api::dashboard::summary,
        api::chat::chat_handler,
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            TransactionKind,
            user_service::RegisterInput,
            user_service::UpdateUserInput,
            user_service::UpdateProfileInput,
            api::auth::LoginRequest,
            api::auth::ChangePasswordRequest,
            author_service::AuthorInput,
            publisher_service::PublisherInput,
            category_service::CategoryInput,
            book_service::BookInput,
            image_service::UpdateImageInput,
            inventory_service::CreateStockInput,
            inventory_service::TransactionInput,
            api::inventory::UpdateStockRequest,
            address_service::AddressInput,
            cart_service::AddToCartInput,
            cart_service::CheckoutInput,
            api::cart::UpdateQuantityRequest,
            order_service::OrderLineInput,
            order_service::CreateOrderInput,
            api::order::UpdateStatusRequest,
            api::wishlist::AddWishlistRequest,
            chat_service::ChatRequest,
        )
    ),
    tags(
        (name = "bookstore", description = "Bookstore API"),
        (name = "auth", description = "Registration and sign-in"),
        (name = "catalog", description = "Books, authors, publishers and categories"),
        (name = "images", description = "Book images"),
        (name = "inventory", description = "Stock levels and movements"),
        (name = "orders", description = "Checkout and order lifecycle"),
        (name = "dashboard", description = "Admin statistics"),
        (name = "chat", description = "Shopping assistant")
    )
)]
pub struct ApiDoc;
