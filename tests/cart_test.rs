mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_adding_same_book_merges_lines() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;

    let (status, cart) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": book_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", cart);
    let (_, cart) = app
        .post(
            "/api/cart/items",
            Some(&customer),
            json!({ "book_id": book_id, "quantity": 2 }),
        )
        .await;

    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["subtotal_cents"], 5997);

    let (status, _) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": 999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_quantity_zero_removes_line() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let first = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let second = app.create_book(&admin, "Emma", "0306406152", 500).await;

    app.post("/api/cart/items", Some(&customer), json!({ "book_id": first }))
        .await;
    let (_, cart) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": second }))
        .await;
    let first_line = cart["items"][0]["id"].as_i64().unwrap();
    let second_line = cart["items"][1]["id"].as_i64().unwrap();

    let (status, cart) = app
        .put(
            &format!("/api/cart/items/{}", second_line),
            Some(&customer),
            json!({ "quantity": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotal_cents"], 1999 + 2000);

    let (status, _) = app
        .put(
            &format!("/api/cart/items/{}", second_line),
            Some(&customer),
            json!({ "quantity": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = app
        .put(
            &format!("/api/cart/items/{}", first_line),
            Some(&customer),
            json!({ "quantity": 0 }),
        )
        .await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["book_id"], second);

    // Lines belong to their owner
    let (status, _) = app
        .delete(&format!("/api/cart/items/{}", second_line), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, cleared) = app.delete("/api/cart", Some(&customer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["removed"], 1);
}

#[tokio::test]
async fn test_inactive_book_cannot_be_added() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let (_, book) = app
        .post(
            "/api/books",
            Some(&admin),
            json!({
                "title": "Withdrawn",
                "isbn": "9780441172719",
                "price_cents": 100,
                "is_active": false
            }),
        )
        .await;

    let (status, _) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": book["id"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_checkout_keeps_unselected_lines() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let first = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let second = app.create_book(&admin, "Emma", "0306406152", 500).await;
    app.stock(&admin, first, 5).await;
    app.stock(&admin, second, 5).await;
    let address_id = app.address(&customer).await;

    app.post(
        "/api/cart/items",
        Some(&customer),
        json!({ "book_id": first, "quantity": 2 }),
    )
    .await;
    let (_, cart) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": second }))
        .await;
    let first_line = cart["items"][0]["id"].clone();

    let (status, order) = app
        .post(
            "/api/cart/checkout",
            Some(&customer),
            json!({ "address_id": address_id, "cart_item_ids": [first_line], "note": "Gift wrap" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["book_id"], first);
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["note"], "Gift wrap");

    let (_, cart) = app.get("/api/cart", Some(&customer)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["book_id"], second);

    // A line that is no longer in the cart
    let (status, _) = app
        .post(
            "/api/cart/checkout",
            Some(&customer),
            json!({ "address_id": address_id, "cart_item_ids": [first_line] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Everything that is left
    let (status, _) = app
        .post(
            "/api/cart/checkout",
            Some(&customer),
            json!({ "address_id": address_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/cart/checkout",
            Some(&customer),
            json!({ "address_id": address_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    app.stock(&admin, book_id, 1).await;
    let address_id = app.address(&customer).await;

    app.post(
        "/api/cart/items",
        Some(&customer),
        json!({ "book_id": book_id, "quantity": 3 }),
    )
    .await;

    let (status, _) = app
        .post(
            "/api/cart/checkout",
            Some(&customer),
            json!({ "address_id": address_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, cart) = app.get("/api/cart", Some(&customer)).await;
    assert_eq!(cart["item_count"], 3);
    assert_eq!(cart["items"][0]["available_stock"], 1);
}

#[tokio::test]
async fn test_wishlist_add_is_idempotent_and_moves_to_cart() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;

    let (status, _) = app
        .post("/api/wishlist", Some(&customer), json!({ "book_id": book_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/api/wishlist", Some(&customer), json!({ "book_id": book_id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, wishlist) = app.get("/api/wishlist", Some(&customer)).await;
    let entries = wishlist.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["title"], "Dune");

    let (status, cart) = app
        .post(
            &format!("/api/wishlist/{}/move-to-cart", book_id),
            Some(&customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["book_id"], book_id);
    assert_eq!(cart["items"][0]["quantity"], 1);

    let (_, wishlist) = app.get("/api/wishlist", Some(&customer)).await;
    assert!(wishlist.as_array().unwrap().is_empty());

    let (status, _) = app
        .post(
            &format!("/api/wishlist/{}/move-to-cart", book_id),
            Some(&customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_remove() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;

    let (status, _) = app
        .post("/api/wishlist", Some(&customer), json!({ "book_id": 999 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.post("/api/wishlist", Some(&customer), json!({ "book_id": book_id }))
        .await;
    let uri = format!("/api/wishlist/{}", book_id);
    let (status, _) = app.delete(&uri, Some(&customer)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete(&uri, Some(&customer)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
