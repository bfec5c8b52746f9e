mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_initial_stock_is_logged_as_inbound() {
    let app = spawn_app().await;
    let (admin, _) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let stock_id = app.stock(&admin, book_id, 7).await;

    let (status, stock) = app
        .get(&format!("/api/inventory/{}", stock_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["quantity"], 7);
    assert_eq!(stock["available"], 7);
    assert_eq!(stock["warehouse"], "MAIN");
    assert_eq!(stock["book_title"], "Dune");

    let (_, history) = app
        .get(
            &format!("/api/inventory/{}/transactions", stock_id),
            Some(&admin),
        )
        .await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["kind"], "inbound");
    assert_eq!(history["items"][0]["quantity_before"], 0);
    assert_eq!(history["items"][0]["quantity_after"], 7);

    // One row per book and warehouse
    let (status, _) = app
        .post(
            "/api/inventory",
            Some(&admin),
            json!({ "book_id": book_id, "warehouse": "main", "quantity": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_movements_update_quantity() {
    let app = spawn_app().await;
    let (admin, _) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let stock_id = app.stock(&admin, book_id, 10).await;
    let uri = format!("/api/inventory/{}/transactions", stock_id);

    let (status, result) = app
        .post(&uri, Some(&admin), json!({ "kind": "outbound", "quantity": 4 }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", result);
    assert_eq!(result["stock"]["quantity"], 6);

    let (status, result) = app
        .post(&uri, Some(&admin), json!({ "kind": "inbound", "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(result["stock"]["quantity"], 8);

    // Adjustment is an absolute stocktake count
    let (status, result) = app
        .post(
            &uri,
            Some(&admin),
            json!({ "kind": "adjustment", "quantity": 3, "note": "Stocktake" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(result["stock"]["quantity"], 3);
    assert_eq!(result["transaction"]["quantity_before"], 8);
    assert_eq!(result["transaction"]["note"], "Stocktake");

    let (status, _) = app
        .post(&uri, Some(&admin), json!({ "kind": "inbound", "quantity": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, history) = app
        .get("/api/inventory/transactions?kind=outbound", Some(&admin))
        .await;
    assert_eq!(history["total"], 1);
}

#[tokio::test]
async fn test_outbound_cannot_dip_into_reserved_units() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let book_id = app.create_book(&admin, "Dune", "9780441172719", 1999).await;
    let stock_id = app.stock(&admin, book_id, 5).await;
    let address_id = app.address(&customer).await;

    let (status, _) = app
        .post(
            "/api/orders",
            Some(&customer),
            json!({ "address_id": address_id, "items": [{ "book_id": book_id, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/inventory/{}/transactions", stock_id);
    let (status, _) = app
        .post(&uri, Some(&admin), json!({ "kind": "outbound", "quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(&uri, Some(&admin), json!({ "kind": "adjustment", "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, result) = app
        .post(&uri, Some(&admin), json!({ "kind": "outbound", "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(result["stock"]["quantity"], 3);
    assert_eq!(result["stock"]["reserved_quantity"], 3);
    assert_eq!(result["stock"]["available"], 0);
}

#[tokio::test]
async fn test_low_stock_report() {
    let app = spawn_app().await;
    let (admin, customer) = app.admin_and_customer().await;
    let plenty = app.create_book(&admin, "Plenty", "9780441172719", 1000).await;
    let scarce = app.create_book(&admin, "Scarce", "0306406152", 1000).await;
    app.stock(&admin, plenty, 50).await;
    let scarce_stock = app.stock(&admin, scarce, 2).await;

    let (status, low) = app.get("/api/inventory/low-stock", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    let low = low.as_array().unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["id"], scarce_stock);
    assert_eq!(low[0]["is_low"], true);

    let (_, page) = app
        .get("/api/inventory?low_stock_only=true", Some(&admin))
        .await;
    assert_eq!(page["total"], 1);

    // Raising the reorder level pulls the other row in
    let (_, all) = app
        .get(&format!("/api/inventory?book_id={}", plenty), Some(&admin))
        .await;
    let plenty_stock = all["items"][0]["id"].as_i64().unwrap();
    let (status, _) = app
        .put(
            &format!("/api/inventory/{}", plenty_stock),
            Some(&admin),
            json!({ "reorder_level": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, low) = app.get("/api/inventory/low-stock", Some(&admin)).await;
    assert_eq!(low.as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/inventory/low-stock", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
