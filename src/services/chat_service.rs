//! Chat Service - Keyword-driven shopping assistant
//!
//! Intents are matched on keywords, not understood. The parser is pure so it
//! can be tested without a database.

use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

use crate::domain::DomainError;
use crate::models::book::{self, Entity as Book};
use crate::models::order::{self, Entity as Order};

use super::{book_service, dashboard_service};

const SEARCH_RESULTS: u64 = 5;
/// Best sellers considered before dropping withdrawn books
const RANKED_CANDIDATES: u64 = 50;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub intent: &'static str,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Search(String),
    /// Order number as typed, upper-cased; `None` when the message has none
    OrderStatus(Option<String>),
    Recommend,
    Help,
    Unknown,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Search(_) => "search",
            Intent::OrderStatus(_) => "order_status",
            Intent::Recommend => "recommend",
            Intent::Help => "help",
            Intent::Unknown => "unknown",
        }
    }
}

fn words(message: &str) -> Vec<String> {
    message
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn order_number_in(message: &str) -> Option<String> {
    message
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !(c.is_alphanumeric() || c == '-')))
        .find(|w| w.to_ascii_lowercase().starts_with("ord-") && w.len() > 4)
        .map(str::to_ascii_uppercase)
}

/// Strip the leading search verb and filler words, keeping the terms.
fn search_terms(message: &str) -> String {
    const FILLER: &[&str] = &[
        "search", "find", "for", "look", "looking", "me", "a", "book", "books", "about",
    ];
    message
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty() && !FILLER.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_intent(message: &str) -> Intent {
    let words = words(message);
    let has = |w: &str| words.iter().any(|x| x == w);

    let number = order_number_in(message);
    if number.is_some() || (has("order") && (has("status") || has("track") || has("where"))) {
        return Intent::OrderStatus(number);
    }
    if has("search") || has("find") || has("looking") {
        return Intent::Search(search_terms(message));
    }
    if ["recommend", "recommendation", "suggest", "bestseller", "popular"]
        .iter()
        .any(|&w| has(w))
    {
        return Intent::Recommend;
    }
    if has("help") {
        return Intent::Help;
    }
    if has("hello") || has("hi") || has("hey") || has("bonjour") {
        return Intent::Greeting;
    }
    Intent::Unknown
}

const HELP_TEXT: &str = "You can ask me to 'search dune', 'recommend something', \
or 'order status ORD-20240101-ABC123'.";

/// Answer a message. `user_id` is present for signed-in callers.
pub async fn respond(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    message: &str,
) -> Result<ChatReply, DomainError> {
    if message.trim().is_empty() {
        return Err(DomainError::validation("Message cannot be empty"));
    }

    let intent = parse_intent(message);
    let name = intent.name();
    let (reply, data) = match intent {
        Intent::Greeting => (
            "Hello! I can help you find books, suggest a read, or check an order.".to_string(),
            None,
        ),
        Intent::Help => (HELP_TEXT.to_string(), None),
        Intent::Unknown => (
            format!("Sorry, I didn't get that. {}", HELP_TEXT),
            None,
        ),
        Intent::Search(terms) if terms.is_empty() => {
            ("What would you like to search for?".to_string(), None)
        }
        Intent::Search(terms) => search(db, &terms).await?,
        Intent::Recommend => recommend(db).await?,
        Intent::OrderStatus(number) => order_status(db, user_id, number).await?,
    };

    Ok(ChatReply {
        reply,
        intent: name,
        data,
    })
}

async fn search(db: &DatabaseConnection, terms: &str) -> Result<(String, Option<Value>), DomainError> {
    let books = Book::find()
        .filter(book::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(book::Column::Title.contains(terms))
                .add(book::Column::Isbn.contains(terms))
                .add(book::Column::Description.contains(terms)),
        )
        .order_by_asc(book::Column::Title)
        .limit(SEARCH_RESULTS)
        .all(db)
        .await?;

    if books.is_empty() {
        return Ok((format!("I couldn't find any books matching '{}'.", terms), None));
    }

    let summaries = book_service::summarize(db, books).await?;
    let reply = format!("Here is what I found for '{}':", terms);
    Ok((reply, Some(json!({ "books": summaries }))))
}

async fn recommend(db: &DatabaseConnection) -> Result<(String, Option<Value>), DomainError> {
    let ranked = dashboard_service::top_books(db, Some(RANKED_CANDIDATES)).await?;
    let on_sale: HashSet<i32> = Book::find()
        .filter(book::Column::Id.is_in(ranked.iter().map(|t| t.book_id).collect::<Vec<_>>()))
        .filter(book::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();
    let top: Vec<_> = ranked
        .into_iter()
        .filter(|t| on_sale.contains(&t.book_id))
        .take(SEARCH_RESULTS as usize)
        .collect();
    if !top.is_empty() {
        return Ok((
            "These are our best sellers right now:".to_string(),
            Some(json!({ "books": top })),
        ));
    }

    let newest = Book::find()
        .filter(book::Column::IsActive.eq(true))
        .order_by_desc(book::Column::Id)
        .limit(SEARCH_RESULTS)
        .all(db)
        .await?;
    if newest.is_empty() {
        return Ok(("The shelves are empty for now, come back soon!".to_string(), None));
    }
    let summaries = book_service::summarize(db, newest).await?;
    Ok((
        "Nothing has sold yet, so here are our newest arrivals:".to_string(),
        Some(json!({ "books": summaries })),
    ))
}

async fn order_status(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    number: Option<String>,
) -> Result<(String, Option<Value>), DomainError> {
    let Some(user_id) = user_id else {
        return Ok(("Please sign in so I can look up your orders.".to_string(), None));
    };
    let Some(number) = number else {
        return Ok((
            "Which order? Give me its number, like ORD-20240101-ABC123.".to_string(),
            None,
        ));
    };

    let found = Order::find()
        .filter(order::Column::OrderNumber.eq(&number))
        .filter(order::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    Ok(match found {
        Some(o) => (
            format!("Order {} is {}.", o.order_number, o.status),
            Some(json!({
                "order_number": o.order_number,
                "status": o.status,
                "total_cents": o.total_cents,
            })),
        ),
        None => (format!("I couldn't find order {} on your account.", number), None),
    })
}
