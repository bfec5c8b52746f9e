mod common;

use axum::http::StatusCode;
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

async fn place(app: &TestApp, token: &str, address_id: i64, book_id: i64, quantity: i32) -> Value {
    let (status, order) = app
        .post(
            "/api/orders",
            Some(token),
            json!({ "address_id": address_id, "items": [{ "book_id": book_id, "quantity": quantity }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    order
}

#[tokio::test]
async fn test_revenue_excludes_cancelled_orders() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let dune = app.create_book(&admin, "Dune", "9780441172719", 2000).await;
    let emma = app.create_book(&admin, "Emma", "0306406152", 1000).await;
    app.stock(&admin, dune, 20).await;
    app.stock(&admin, emma, 20).await;
    let address_id = app.address(&customer).await;

    let kept = place(&app, &customer, address_id, dune, 2).await;
    let cancelled = place(&app, &customer, address_id, emma, 5).await;
    app.post(
        &format!("/api/orders/{}/cancel", cancelled["id"]),
        Some(&customer),
        json!({}),
    )
    .await;

    let (status, summary) = app.get("/api/dashboard/summary", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["books"], 2);
    assert_eq!(summary["customers"], 1);
    assert_eq!(summary["orders"], 2);
    assert_eq!(summary["orders_by_status"]["pending"], 1);
    assert_eq!(summary["orders_by_status"]["cancelled"], 1);
    assert_eq!(summary["total_revenue_cents"], kept["total_cents"]);

    let (status, series) = app
        .get("/api/dashboard/revenue?days=7", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    let series = series.as_array().unwrap();
    assert_eq!(series.len(), 7);
    let today = series.last().unwrap();
    assert_eq!(today["orders"], 1);
    assert_eq!(today["revenue_cents"], kept["total_cents"]);
    assert!(series[..6].iter().all(|d| d["orders"] == 0));

    let (_, top) = app.get("/api/dashboard/top-books", Some(&admin)).await;
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["book_id"], dune);
    assert_eq!(top[0]["quantity_sold"], 2);

    let (_, recent) = app
        .get("/api/dashboard/recent-orders?limit=1", Some(&admin))
        .await;
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["id"], cancelled["id"]);
}

#[tokio::test]
async fn test_dashboard_is_admin_only() {
    let app = spawn_app().await;
    let (_, customer) = app.admin_and_customer().await;

    for uri in [
        "/api/dashboard/summary",
        "/api/dashboard/revenue",
        "/api/dashboard/top-books",
        "/api/dashboard/recent-orders",
    ] {
        let (status, _) = app.get(uri, Some(&customer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_low_stock_count_in_summary() {
    let app = spawn_app().await;
    let (admin, _) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 2000).await;
    app.stock(&admin, book_id, 1).await;

    let (_, summary) = app.get("/api/dashboard/summary", Some(&admin)).await;
    assert_eq!(summary["low_stock_items"], 1);
}

#[tokio::test]
async fn test_chat_search_and_recommend() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let dune = app.create_book(&admin, "Dune", "9780441172719", 2000).await;
    app.create_book(&admin, "Emma", "0306406152", 1000).await;

    let (status, reply) = app
        .post("/api/chat", None, json!({ "message": "find dune" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["intent"], "search");
    let books = reply["data"]["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["id"], dune);

    // Nothing sold yet: newest arrivals first
    let (_, reply) = app
        .post("/api/chat", Some(&customer), json!({ "message": "Can you recommend something?" }))
        .await;
    assert_eq!(reply["intent"], "recommend");
    assert_eq!(reply["data"]["books"][0]["title"], "Emma");

    let (status, _) = app
        .post("/api/chat", None, json!({ "message": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_order_status_is_scoped_to_caller() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 2000).await;
    app.stock(&admin, book_id, 5).await;
    let address_id = app.address(&customer).await;
    let order = place(&app, &customer, address_id, book_id, 1).await;
    let number = order["order_number"].as_str().unwrap();
    let message = json!({ "message": format!("Where is {}?", number.to_lowercase()) });

    let (_, reply) = app.post("/api/chat", Some(&customer), message.clone()).await;
    assert_eq!(reply["intent"], "order_status");
    assert_eq!(reply["data"]["status"], "pending");

    // Anonymous callers are asked to sign in
    let (_, reply) = app.post("/api/chat", None, message.clone()).await;
    assert_eq!(reply["intent"], "order_status");
    assert!(reply["data"].is_null());

    // Another account cannot see it
    let (stranger, _) = app.register("stranger@test.local").await;
    let (_, reply) = app.post("/api/chat", Some(&stranger), message).await;
    assert!(reply["data"].is_null());
}

#[tokio::test]
async fn test_recommend_skips_withdrawn_best_sellers() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let dune = app.create_book(&admin, "Dune", "9780441172719", 2000).await;
    let emma = app.create_book(&admin, "Emma", "0306406152", 1000).await;
    app.stock(&admin, dune, 5).await;
    app.stock(&admin, emma, 5).await;
    let address_id = app.address(&customer).await;
    place(&app, &customer, address_id, dune, 3).await;
    place(&app, &customer, address_id, emma, 1).await;

    let message = json!({ "message": "Can you recommend something?" });
    let (_, reply) = app.post("/api/chat", None, message.clone()).await;
    assert_eq!(reply["data"]["books"][0]["book_id"], dune);

    // Ordered books are only deactivated on delete
    let (_, outcome) = app
        .delete(&format!("/api/books/{}", dune), Some(&admin))
        .await;
    assert_eq!(outcome["outcome"], "deactivated");

    let (_, reply) = app.post("/api/chat", None, message).await;
    assert_eq!(reply["intent"], "recommend");
    let books = reply["data"]["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["book_id"], emma);
}
