mod common;

use axum::http::StatusCode;
use common::{TestApp, spawn_app};
use serde_json::{Value, json};

struct Shop {
    app: TestApp,
    admin: String,
    customer: String,
    book_id: i64,
    stock_id: i64,
    address_id: i64,
}

// One book at 19.99 with 10 units in stock and a customer address
async fn shop() -> Shop {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let stock_id = app.stock(&admin, book_id, 10).await;
    let address_id = app.address(&customer).await;
    Shop {
        app,
        admin,
        customer,
        book_id,
        stock_id,
        address_id,
    }
}

impl Shop {
    async fn order(&self, quantity: i32) -> (StatusCode, Value) {
        self.app
            .post(
                "/api/orders",
                Some(&self.customer),
                json!({
                    "address_id": self.address_id,
                    "items": [{ "book_id": self.book_id, "quantity": quantity }]
                }),
            )
            .await
    }

    async fn stock(&self) -> Value {
        let (status, stock) = self
            .app
            .get(&format!("/api/inventory/{}", self.stock_id), Some(&self.admin))
            .await;
        assert_eq!(status, StatusCode::OK);
        stock
    }

    async fn set_status(&self, order_id: &Value, status: &str) -> (StatusCode, Value) {
        self.app
            .put(
                &format!("/api/admin/orders/{}/status", order_id),
                Some(&self.admin),
                json!({ "status": status }),
            )
            .await
    }
}

#[tokio::test]
async fn test_order_reserves_stock_and_snapshots_address() {
    let shop = shop().await;

    let (status, order) = shop.order(3).await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["status"], "pending");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(order["ship_recipient"], "Ada Lovelace");
    assert_eq!(order["items"][0]["title"], "Dune");
    assert_eq!(order["items"][0]["unit_price_cents"], 1999);
    assert_eq!(order["subtotal_cents"], 5997);

    let stock = shop.stock().await;
    assert_eq!(stock["quantity"], 10);
    assert_eq!(stock["reserved_quantity"], 3);
    assert_eq!(stock["available"], 7);

    // The snapshot survives edits to the address book
    let (status, _) = shop
        .app
        .put(
            &format!("/api/addresses/{}", shop.address_id),
            Some(&shop.customer),
            json!({
                "recipient_name": "Charles Babbage",
                "phone": "+44 20 7946 0001",
                "line1": "1 Dorset Street",
                "city": "London",
                "country": "UK"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, again) = shop
        .app
        .get(&format!("/api/orders/{}", order["id"]), Some(&shop.customer))
        .await;
    assert_eq!(again["ship_recipient"], "Ada Lovelace");
}

#[tokio::test]
async fn test_shipping_fee_waived_at_threshold() {
    let shop = shop().await;

    let (_, small) = shop.order(1).await;
    assert_eq!(small["shipping_cents"], 3000);
    assert_eq!(small["total_cents"], 4999);

    let expensive = shop
        .app
        .create_book(&shop.admin, "Folio Edition", "0306406152", 15_000)
        .await;
    shop.app.stock(&shop.admin, expensive, 5).await;
    let (status, big) = shop
        .app
        .post(
            "/api/orders",
            Some(&shop.customer),
            json!({
                "address_id": shop.address_id,
                "items": [
                    { "book_id": expensive, "quantity": 1 },
                    { "book_id": expensive, "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Duplicate lines are merged
    assert_eq!(big["items"].as_array().unwrap().len(), 1);
    assert_eq!(big["items"][0]["quantity"], 2);
    assert_eq!(big["subtotal_cents"], 30_000);
    assert_eq!(big["shipping_cents"], 0);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_nothing_behind() {
    let shop = shop().await;
    let second = shop
        .app
        .create_book(&shop.admin, "Dune Messiah", "0306406152", 999)
        .await;
    shop.app.stock(&shop.admin, second, 1).await;

    let (status, body) = shop
        .app
        .post(
            "/api/orders",
            Some(&shop.customer),
            json!({
                "address_id": shop.address_id,
                "items": [
                    { "book_id": shop.book_id, "quantity": 2 },
                    { "book_id": second, "quantity": 5 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));

    // The first line's reservation was rolled back with the order
    assert_eq!(shop.stock().await["reserved_quantity"], 0);
    let (_, mine) = shop.app.get("/api/orders", Some(&shop.customer)).await;
    assert_eq!(mine["total"], 0);
}

#[tokio::test]
async fn test_order_input_validation() {
    let shop = shop().await;

    let (status, _) = shop.order(0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .app
        .post(
            "/api/orders",
            Some(&shop.customer),
            json!({ "address_id": shop.address_id, "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Someone else's address
    let admin_address = shop.app.address(&shop.admin).await;
    let (status, _) = shop
        .app
        .post(
            "/api/orders",
            Some(&shop.customer),
            json!({
                "address_id": admin_address,
                "items": [{ "book_id": shop.book_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .app
        .post(
            "/api/orders",
            Some(&shop.customer),
            json!({
                "address_id": shop.address_id,
                "items": [{ "book_id": 999, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_releases_reservation() {
    let shop = shop().await;
    let (_, order) = shop.order(4).await;
    assert_eq!(shop.stock().await["reserved_quantity"], 4);

    let (status, cancelled) = shop
        .app
        .post(
            &format!("/api/orders/{}/cancel", order["id"]),
            Some(&shop.customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", cancelled);
    assert_eq!(cancelled["status"], "cancelled");

    let stock = shop.stock().await;
    assert_eq!(stock["reserved_quantity"], 0);
    assert_eq!(stock["quantity"], 10);

    // Already cancelled
    let (status, _) = shop
        .app
        .post(
            &format!("/api/orders/{}/cancel", order["id"]),
            Some(&shop.customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_cannot_cancel_confirmed_order() {
    let shop = shop().await;
    let (_, order) = shop.order(1).await;

    let (status, _) = shop.set_status(&order["id"], "confirmed").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = shop
        .app
        .post(
            &format!("/api/orders/{}/cancel", order["id"]),
            Some(&shop.customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Admins still can
    let (status, body) = shop.set_status(&order["id"], "cancelled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(shop.stock().await["reserved_quantity"], 0);
}

#[tokio::test]
async fn test_shipping_turns_reservation_into_outbound() {
    let shop = shop().await;
    let (_, order) = shop.order(3).await;

    let (status, _) = shop.set_status(&order["id"], "confirmed").await;
    assert_eq!(status, StatusCode::OK);
    let (status, shipped) = shop.set_status(&order["id"], "shipped").await;
    assert_eq!(status, StatusCode::OK, "{}", shipped);
    assert_eq!(shipped["status"], "shipped");

    let stock = shop.stock().await;
    assert_eq!(stock["quantity"], 7);
    assert_eq!(stock["reserved_quantity"], 0);

    let (_, history) = shop
        .app
        .get(
            &format!("/api/inventory/{}/transactions?kind=outbound", shop.stock_id),
            Some(&shop.admin),
        )
        .await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["quantity"], 3);
    assert_eq!(history["items"][0]["reference"], order["order_number"]);

    let (status, delivered) = shop.set_status(&order["id"], "delivered").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["status"], "delivered");
    // Delivery does not touch stock again
    assert_eq!(shop.stock().await["quantity"], 7);
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let shop = shop().await;
    let (_, order) = shop.order(1).await;

    let (status, _) = shop.set_status(&order["id"], "shipped").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = shop.set_status(&order["id"], "delivered").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    shop.set_status(&order["id"], "cancelled").await;
    let (status, _) = shop.set_status(&order["id"], "confirmed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop.set_status(&json!(999), "confirmed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orders_are_private_to_their_owner() {
    let shop = shop().await;
    let (_, order) = shop.order(1).await;
    let (stranger, _) = shop.app.register("stranger@test.local").await;

    let uri = format!("/api/orders/{}", order["id"]);
    let (status, _) = shop.app.get(&uri, Some(&stranger)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = shop.app.get(&uri, Some(&shop.admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, mine) = shop.app.get("/api/orders", Some(&stranger)).await;
    assert_eq!(mine["total"], 0);

    let (status, _) = shop.app.get("/api/admin/orders", Some(&shop.customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_order_filters() {
    let shop = shop().await;
    let (_, first) = shop.order(1).await;
    shop.order(2).await;
    shop.set_status(&first["id"], "confirmed").await;

    let (_, all) = shop.app.get("/api/admin/orders", Some(&shop.admin)).await;
    assert_eq!(all["total"], 2);

    let (_, confirmed) = shop
        .app
        .get("/api/admin/orders?status=confirmed", Some(&shop.admin))
        .await;
    assert_eq!(confirmed["total"], 1);
    assert_eq!(confirmed["items"][0]["id"], first["id"]);

    let number = first["order_number"].as_str().unwrap();
    let (_, found) = shop
        .app
        .get(&format!("/api/admin/orders?search={}", number), Some(&shop.admin))
        .await;
    assert_eq!(found["total"], 1);

    let (status, _) = shop
        .app
        .get("/api/admin/orders?from=not-a-date", Some(&shop.admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// `(quantity, reserved_quantity)` of each stock row
async fn levels(app: &TestApp, admin: &str, rows: [i64; 2]) -> Vec<(i64, i64)> {
    let mut out = Vec::new();
    for id in rows {
        let (_, row) = app.get(&format!("/api/inventory/{}", id), Some(admin)).await;
        out.push((
            row["quantity"].as_i64().unwrap(),
            row["reserved_quantity"].as_i64().unwrap(),
        ));
    }
    out
}

async fn order_four(app: &TestApp, customer: &str, address_id: i64, book_id: i64) -> Value {
    let (status, order) = app
        .post(
            "/api/orders",
            Some(customer),
            json!({ "address_id": address_id, "items": [{ "book_id": book_id, "quantity": 4 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    order
}

#[tokio::test]
async fn test_reservation_spreads_across_warehouses() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let main_id = app.stock(&admin, book_id, 2).await;
    let (status, east) = app
        .post(
            "/api/inventory",
            Some(&admin),
            json!({ "book_id": book_id, "warehouse": "east", "quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", east);
    let east_id = east["id"].as_i64().unwrap();
    let address_id = app.address(&customer).await;

    let rows = [main_id, east_id];

    // Rows are drained in id order
    let first = order_four(&app, &customer, address_id, book_id).await;
    assert_eq!(levels(&app, &admin, rows).await, vec![(2, 2), (3, 2)]);

    let (status, _) = app
        .post(&format!("/api/orders/{}/cancel", first["id"]), Some(&customer), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(levels(&app, &admin, rows).await, vec![(2, 0), (3, 0)]);

    let second = order_four(&app, &customer, address_id, book_id).await;
    for status in ["confirmed", "shipped"] {
        let (code, body) = app
            .put(
                &format!("/api/admin/orders/{}/status", second["id"]),
                Some(&admin),
                json!({ "status": status }),
            )
            .await;
        assert_eq!(code, StatusCode::OK, "{}", body);
    }
    assert_eq!(levels(&app, &admin, rows).await, vec![(0, 0), (1, 0)]);

    // One outbound movement per warehouse row
    for (id, shipped) in [(main_id, 2), (east_id, 2)] {
        let (_, history) = app
            .get(
                &format!("/api/inventory/{}/transactions?kind=outbound", id),
                Some(&admin),
            )
            .await;
        assert_eq!(history["total"], 1);
        assert_eq!(history["items"][0]["quantity"], shipped);
    }

    let (status, _) = app
        .post(
            "/api/orders",
            Some(&customer),
            json!({ "address_id": address_id, "items": [{ "book_id": book_id, "quantity": 2 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_order_totals_that_overflow_are_rejected() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app
        .create_book(&admin, "Priceless", "9780441172719", i64::MAX / 2 + 1)
        .await;
    let address_id = app.address(&customer).await;

    let (status, body) = app
        .post(
            "/api/cart/items",
            Some(&customer),
            json!({ "book_id": book_id, "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, _) = app
        .post(
            "/api/orders",
            Some(&customer),
            json!({ "address_id": address_id, "items": [{ "book_id": book_id, "quantity": 2 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A single copy still fits
    let (status, cart) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": book_id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotal_cents"], i64::MAX / 2 + 1);
}
