//! Demo catalog for local development (`SEED_DEMO=1` or `--seed`)

use sea_orm::*;

use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::hash_password;
use crate::models::book::Entity as Book;
use crate::models::timestamp;
use crate::models::user;
use crate::services::author_service::{self, AuthorInput};
use crate::services::book_service::{self, BookInput};
use crate::services::category_service::{self, CategoryInput};
use crate::services::inventory_service::{self, CreateStockInput};
use crate::services::publisher_service::{self, PublisherInput};

pub const DEMO_ADMIN_EMAIL: &str = "admin@bookstore.local";
pub const DEMO_CUSTOMER_EMAIL: &str = "customer@bookstore.local";

struct DemoBook {
    title: &'static str,
    isbn: &'static str,
    price_cents: i64,
    author: usize,
    category: usize,
    stock: i32,
}

const AUTHORS: [&str; 3] = ["J.R.R. Tolkien", "Isaac Asimov", "Frank Herbert"];
const CATEGORIES: [&str; 3] = ["Fantasy", "Science Fiction", "Classics"];

const BOOKS: [DemoBook; 4] = [
    DemoBook {
        title: "The Hobbit",
        isbn: "978-0-261-10221-7",
        price_cents: 1_290,
        author: 0,
        category: 0,
        stock: 25,
    },
    DemoBook {
        title: "The Lord of the Rings",
        isbn: "978-0-261-10325-2",
        price_cents: 3_490,
        author: 0,
        category: 2,
        stock: 12,
    },
    DemoBook {
        title: "Foundation",
        isbn: "978-0-553-29335-7",
        price_cents: 990,
        author: 1,
        category: 1,
        stock: 3,
    },
    DemoBook {
        title: "Dune",
        isbn: "978-0-441-17271-9",
        price_cents: 1_190,
        author: 2,
        category: 1,
        stock: 40,
    },
];

async fn ensure_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    full_name: &str,
    role: Role,
) -> Result<(), DomainError> {
    let now = timestamp();
    let model = user::ActiveModel {
        email: Set(email.to_owned()),
        full_name: Set(full_name.to_owned()),
        password_hash: Set(hash_password(password)?),
        role: Set(role.as_str().to_owned()),
        is_active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    user::Entity::insert(model)
        .on_conflict(
            sea_query::OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Insert demo accounts and, on an empty catalog, a handful of books with stock.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DomainError> {
    ensure_user(db, DEMO_ADMIN_EMAIL, "admin123", "Store Admin", Role::Admin).await?;
    ensure_user(
        db,
        DEMO_CUSTOMER_EMAIL,
        "customer123",
        "Demo Customer",
        Role::Customer,
    )
    .await?;

    if Book::find().count(db).await? > 0 {
        tracing::info!("Catalog already populated, skipping demo books");
        return Ok(());
    }

    let publisher = publisher_service::create_publisher(
        db,
        PublisherInput {
            name: "Demo Classics Press".to_owned(),
            address: None,
            website: None,
        },
    )
    .await?;

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for name in AUTHORS {
        let author = author_service::create_author(
            db,
            AuthorInput {
                name: name.to_owned(),
                biography: None,
                birth_date: None,
            },
        )
        .await?;
        author_ids.push(author.id);
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = category_service::create_category(
            db,
            CategoryInput {
                name: name.to_owned(),
                description: None,
                parent_id: None,
            },
        )
        .await?;
        category_ids.push(category.id);
    }

    for demo in &BOOKS {
        let detail = book_service::create_book(
            db,
            BookInput {
                title: demo.title.to_owned(),
                isbn: demo.isbn.to_owned(),
                description: None,
                price_cents: demo.price_cents,
                publication_date: None,
                page_count: None,
                language: Some("en".to_owned()),
                publisher_id: Some(publisher.id),
                author_ids: vec![author_ids[demo.author]],
                category_ids: vec![category_ids[demo.category]],
                is_active: Some(true),
            },
        )
        .await?;

        inventory_service::create_stock_item(
            db,
            CreateStockInput {
                book_id: detail.book.id,
                warehouse: None,
                quantity: demo.stock,
                reorder_level: 5,
            },
            None,
        )
        .await?;
    }

    tracing::info!("Seeded {} demo books", BOOKS.len());
    Ok(())
}
