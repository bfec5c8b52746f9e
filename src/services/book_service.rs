//! Book Service - Catalog operations on books and their associations
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::Query;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::validation::{normalize_isbn, optional_text, required_name};
use crate::domain::{DomainError, ObjectStorage};
use crate::models::author::{self, Entity as Author};
use crate::models::book::{self, Entity as Book};
use crate::models::book_authors::{self, Entity as BookAuthor};
use crate::models::book_categories::{self, Entity as BookCategory};
use crate::models::book_image::{self, Entity as BookImage};
use crate::models::cart_item::{self, Entity as CartItem};
use crate::models::category::{self, Entity as Category};
use crate::models::inventory_transaction::{self, Entity as InventoryTransaction};
use crate::models::order_item::{self, Entity as OrderItem};
use crate::models::publisher::{self, Entity as Publisher};
use crate::models::stock_item::{self, Entity as StockItem};
use crate::models::timestamp;
use crate::models::wishlist_item::{self, Entity as WishlistItem};

use super::Page;

/// Payload for create and full update.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct BookInput {
    pub title: String,
    pub isbn: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: i64,
    pub publication_date: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    pub publisher_id: Option<i32>,
    #[serde(default)]
    pub author_ids: Vec<i32>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
    pub is_active: Option<bool>,
}

/// Filter parameters for listing books
#[derive(Debug, Default, Clone)]
pub struct BookFilter {
    pub search: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<i32>,
    pub publisher_id: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub active: Option<bool>,
    pub sort: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// Row of a book listing
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub publisher: Option<String>,
    pub authors: Vec<String>,
    pub cover_url: Option<String>,
    pub available_stock: i32,
}

/// Full book view with every association
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: book::Model,
    pub authors: Vec<author::Model>,
    pub categories: Vec<category::Model>,
    pub publisher: Option<publisher::Model>,
    pub images: Vec<book_image::Model>,
    pub cover_url: Option<String>,
    pub available_stock: i32,
}

/// What `delete_book` actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Book and all dependent rows were removed
    Deleted { images_removed: usize },
    /// Book appears in orders, so it was only deactivated
    Deactivated,
}

pub async fn list_books(
    db: &DatabaseConnection,
    filter: BookFilter,
) -> Result<Page<BookSummary>, DomainError> {
    tracing::debug!("List books - filter: {:?}", filter);

    let mut query = Book::find();

    if let Some(search) = optional_text(filter.search.clone()) {
        let isbn_fragment: String = search.chars().filter(|c| *c != '-').collect();
        query = query.filter(
            Condition::any()
                .add(book::Column::Title.contains(&search))
                .add(book::Column::Isbn.contains(&isbn_fragment)),
        );
    }

    if let Some(author_id) = filter.author_id {
        query = query.filter(
            book::Column::Id.in_subquery(
                Query::select()
                    .column(book_authors::Column::BookId)
                    .from(BookAuthor)
                    .and_where(book_authors::Column::AuthorId.eq(author_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(category_id) = filter.category_id {
        query = query.filter(
            book::Column::Id.in_subquery(
                Query::select()
                    .column(book_categories::Column::BookId)
                    .from(BookCategory)
                    .and_where(book_categories::Column::CategoryId.eq(category_id))
                    .to_owned(),
            ),
        );
    }

    if let Some(publisher_id) = filter.publisher_id {
        query = query.filter(book::Column::PublisherId.eq(publisher_id));
    }
    if let Some(min) = filter.min_price {
        query = query.filter(book::Column::PriceCents.gte(min));
    }
    if let Some(max) = filter.max_price {
        query = query.filter(book::Column::PriceCents.lte(max));
    }
    if let Some(active) = filter.active {
        query = query.filter(book::Column::IsActive.eq(active));
    }

    query = match filter.sort.as_deref() {
        Some("title_desc") => query.order_by_desc(book::Column::Title),
        Some("price_asc") => query.order_by_asc(book::Column::PriceCents),
        Some("price_desc") => query.order_by_desc(book::Column::PriceCents),
        Some("newest") => query.order_by_desc(book::Column::CreatedAt),
        _ => query.order_by_asc(book::Column::Title),
    };
    // Stable ordering between pages
    query = query.order_by_asc(book::Column::Id);

    let page = super::fetch_page(db, query, filter.page, filter.limit).await?;
    let summaries = summarize(db, page.items).await?;

    Ok(Page {
        items: summaries,
        total: page.total,
        page: page.page,
        limit: page.limit,
    })
}

/// Attach author names, publisher, cover and stock to a batch of books.
pub async fn summarize(
    db: &DatabaseConnection,
    books: Vec<book::Model>,
) -> Result<Vec<BookSummary>, DomainError> {
    if books.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = books.iter().map(|b| b.id).collect();

    let mut authors_by_book: HashMap<i32, Vec<String>> = HashMap::new();
    for (link, author) in BookAuthor::find()
        .filter(book_authors::Column::BookId.is_in(ids.clone()))
        .order_by_asc(book_authors::Column::Position)
        .find_also_related(Author)
        .all(db)
        .await?
    {
        if let Some(author) = author {
            authors_by_book
                .entry(link.book_id)
                .or_default()
                .push(author.name);
        }
    }

    let covers: HashMap<i32, String> = BookImage::find()
        .filter(book_image::Column::BookId.is_in(ids.clone()))
        .filter(book_image::Column::IsCover.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|img| (img.book_id, img.url))
        .collect();

    let stock = available_stock_by_book(db, ids).await?;

    let publisher_ids: BTreeSet<i32> = books.iter().filter_map(|b| b.publisher_id).collect();
    let publishers: HashMap<i32, String> = if publisher_ids.is_empty() {
        HashMap::new()
    } else {
        Publisher::find()
            .filter(publisher::Column::Id.is_in(publisher_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    };

    Ok(books
        .into_iter()
        .map(|b| BookSummary {
            authors: authors_by_book.remove(&b.id).unwrap_or_default(),
            cover_url: covers.get(&b.id).cloned(),
            available_stock: stock.get(&b.id).copied().unwrap_or(0),
            publisher: b.publisher_id.and_then(|id| publishers.get(&id).cloned()),
            id: b.id,
            title: b.title,
            isbn: b.isbn,
            price_cents: b.price_cents,
            is_active: b.is_active,
        })
        .collect())
}

/// Sum of `quantity - reserved_quantity` across warehouses, per book.
pub async fn available_stock_by_book<C: ConnectionTrait>(
    db: &C,
    book_ids: Vec<i32>,
) -> Result<HashMap<i32, i32>, DomainError> {
    let mut totals = HashMap::new();
    for item in StockItem::find()
        .filter(stock_item::Column::BookId.is_in(book_ids))
        .all(db)
        .await?
    {
        let total = totals.entry(item.book_id).or_insert(0i32);
        *total = total.saturating_add(item.levels().available());
    }
    Ok(totals)
}

pub async fn get_book(db: &DatabaseConnection, id: i32) -> Result<BookDetail, DomainError> {
    let book = Book::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    let authors = book
        .find_related(Author)
        .order_by_asc(book_authors::Column::Position)
        .all(db)
        .await?;
    let categories = book.find_related(Category).all(db).await?;
    let publisher = match book.publisher_id {
        Some(pid) => Publisher::find_by_id(pid).one(db).await?,
        None => None,
    };
    let images = BookImage::find()
        .filter(book_image::Column::BookId.eq(id))
        .order_by_asc(book_image::Column::DisplayOrder)
        .order_by_asc(book_image::Column::Id)
        .all(db)
        .await?;
    let cover_url = images.iter().find(|img| img.is_cover).map(|img| img.url.clone());
    let available_stock = available_stock_by_book(db, vec![id])
        .await?
        .get(&id)
        .copied()
        .unwrap_or(0);

    Ok(BookDetail {
        book,
        authors,
        categories,
        publisher,
        images,
        cover_url,
        available_stock,
    })
}

/// Validated, normalised form of a `BookInput`.
struct CleanBook {
    title: String,
    isbn: String,
    description: Option<String>,
    price_cents: i64,
    publication_date: Option<String>,
    page_count: Option<i32>,
    language: Option<String>,
    publisher_id: Option<i32>,
    author_ids: Vec<i32>,
    category_ids: Vec<i32>,
    is_active: bool,
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    input: BookInput,
    except_id: Option<i32>,
) -> Result<CleanBook, DomainError> {
    let title = required_name("Title", &input.title)?;
    let isbn = normalize_isbn(&input.isbn)?;

    if input.price_cents < 0 {
        return Err(DomainError::validation("Price cannot be negative"));
    }
    if let Some(pages) = input.page_count
        && pages <= 0
    {
        return Err(DomainError::validation("Page count must be positive"));
    }

    let mut duplicate = Book::find().filter(book::Column::Isbn.eq(&isbn));
    if let Some(id) = except_id {
        duplicate = duplicate.filter(book::Column::Id.ne(id));
    }
    if duplicate.one(db).await?.is_some() {
        return Err(DomainError::conflict(format!(
            "A book with ISBN {} already exists",
            isbn
        )));
    }

    if let Some(pid) = input.publisher_id
        && Publisher::find_by_id(pid).one(db).await?.is_none()
    {
        return Err(DomainError::validation(format!(
            "Publisher {} does not exist",
            pid
        )));
    }

    // Dedupe, keeping the credited order
    let mut seen = BTreeSet::new();
    let author_ids: Vec<i32> = input
        .author_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();
    if !author_ids.is_empty() {
        let found = Author::find()
            .filter(author::Column::Id.is_in(author_ids.clone()))
            .count(db)
            .await?;
        if found as usize != author_ids.len() {
            return Err(DomainError::validation("One or more authors do not exist"));
        }
    }

    let category_ids: Vec<i32> = input
        .category_ids
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !category_ids.is_empty() {
        let found = Category::find()
            .filter(category::Column::Id.is_in(category_ids.clone()))
            .count(db)
            .await?;
        if found as usize != category_ids.len() {
            return Err(DomainError::validation(
                "One or more categories do not exist",
            ));
        }
    }

    Ok(CleanBook {
        title,
        isbn,
        description: optional_text(input.description),
        price_cents: input.price_cents,
        publication_date: optional_text(input.publication_date),
        page_count: input.page_count,
        language: optional_text(input.language),
        publisher_id: input.publisher_id,
        author_ids,
        category_ids,
        is_active: input.is_active.unwrap_or(true),
    })
}

async fn replace_links<C: ConnectionTrait>(
    db: &C,
    book_id: i32,
    author_ids: &[i32],
    category_ids: &[i32],
) -> Result<(), DomainError> {
    BookAuthor::delete_many()
        .filter(book_authors::Column::BookId.eq(book_id))
        .exec(db)
        .await?;
    BookCategory::delete_many()
        .filter(book_categories::Column::BookId.eq(book_id))
        .exec(db)
        .await?;

    if !author_ids.is_empty() {
        BookAuthor::insert_many(author_ids.iter().zip(0..).map(|(&author_id, position)| {
            book_authors::ActiveModel {
                book_id: Set(book_id),
                author_id: Set(author_id),
                position: Set(position),
            }
        }))
        .exec_without_returning(db)
        .await?;
    }

    if !category_ids.is_empty() {
        BookCategory::insert_many(category_ids.iter().map(|&category_id| {
            book_categories::ActiveModel {
                book_id: Set(book_id),
                category_id: Set(category_id),
            }
        }))
        .exec_without_returning(db)
        .await?;
    }

    Ok(())
}

pub async fn create_book(
    db: &DatabaseConnection,
    input: BookInput,
) -> Result<BookDetail, DomainError> {
    let txn = db.begin().await?;
    let clean = validate(&txn, input, None).await?;

    let now = timestamp();
    let model = book::ActiveModel {
        title: Set(clean.title),
        isbn: Set(clean.isbn),
        description: Set(clean.description),
        price_cents: Set(clean.price_cents),
        publication_date: Set(clean.publication_date),
        page_count: Set(clean.page_count),
        language: Set(clean.language),
        publisher_id: Set(clean.publisher_id),
        is_active: Set(clean.is_active),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_links(&txn, model.id, &clean.author_ids, &clean.category_ids).await?;
    txn.commit().await?;

    tracing::info!("Created book {} ({})", model.id, model.isbn);
    get_book(db, model.id).await
}

/// Full replacement of a book's fields and associations.
pub async fn update_book(
    db: &DatabaseConnection,
    id: i32,
    input: BookInput,
) -> Result<BookDetail, DomainError> {
    let txn = db.begin().await?;

    let existing = Book::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;
    let clean = validate(&txn, input, Some(id)).await?;

    let mut active: book::ActiveModel = existing.into();
    active.title = Set(clean.title);
    active.isbn = Set(clean.isbn);
    active.description = Set(clean.description);
    active.price_cents = Set(clean.price_cents);
    active.publication_date = Set(clean.publication_date);
    active.page_count = Set(clean.page_count);
    active.language = Set(clean.language);
    active.publisher_id = Set(clean.publisher_id);
    active.is_active = Set(clean.is_active);
    active.updated_at = Set(timestamp());
    active.update(&txn).await?;

    replace_links(&txn, id, &clean.author_ids, &clean.category_ids).await?;
    txn.commit().await?;

    tracing::info!("Updated book {}", id);
    get_book(db, id).await
}

/// Delete a book and everything hanging off it.
///
/// Books that appear in any order are deactivated instead so order history
/// keeps resolving. Stored image objects are removed after the database
/// commit; a failure there is logged and leaves an orphaned object only.
pub async fn delete_book(
    db: &DatabaseConnection,
    storage: &dyn ObjectStorage,
    id: i32,
) -> Result<DeleteOutcome, DomainError> {
    let txn = db.begin().await?;

    let existing = Book::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    let ordered = OrderItem::find()
        .filter(order_item::Column::BookId.eq(id))
        .count(&txn)
        .await?;
    if ordered > 0 {
        let mut active: book::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(timestamp());
        active.update(&txn).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!("Book {} has order history; deactivated instead of deleted", id);
        return Ok(DeleteOutcome::Deactivated);
    }

    let images = BookImage::find()
        .filter(book_image::Column::BookId.eq(id))
        .all(&txn)
        .await?;

    let stock_ids: Vec<i32> = StockItem::find()
        .filter(stock_item::Column::BookId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    if !stock_ids.is_empty() {
        InventoryTransaction::delete_many()
            .filter(inventory_transaction::Column::StockItemId.is_in(stock_ids))
            .exec(&txn)
            .await?;
    }
    StockItem::delete_many()
        .filter(stock_item::Column::BookId.eq(id))
        .exec(&txn)
        .await?;
    CartItem::delete_many()
        .filter(cart_item::Column::BookId.eq(id))
        .exec(&txn)
        .await?;
    WishlistItem::delete_many()
        .filter(wishlist_item::Column::BookId.eq(id))
        .exec(&txn)
        .await?;
    BookImage::delete_many()
        .filter(book_image::Column::BookId.eq(id))
        .exec(&txn)
        .await?;
    replace_links(&txn, id, &[], &[]).await?;
    existing.delete(&txn).await?;

    txn.commit().await?;

    for image in &images {
        if let Err(e) = storage.delete(&image.storage_key).await {
            tracing::error!("Failed to remove stored image {}: {}", image.storage_key, e);
        }
    }

    tracing::info!("Deleted book {} with {} image(s)", id, images.len());
    Ok(DeleteOutcome::Deleted {
        images_removed: images.len(),
    })
}
