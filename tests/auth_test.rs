mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, doc) = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/orders"].is_object());
}

#[tokio::test]
async fn test_first_account_is_admin() {
    let app = spawn_app().await;

    let (status, first) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "  Owner@Shop.Example ", "password": "secret123", "full_name": "Owner" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["user"]["role"], "admin");
    assert_eq!(first["user"]["email"], "owner@shop.example");
    assert!(first["user"].get("password_hash").is_none());

    let (_, second) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "reader@shop.example", "password": "secret123", "full_name": "Reader" }),
        )
        .await;
    assert_eq!(second["user"]["role"], "customer");
}

#[tokio::test]
async fn test_register_validation() {
    let app = spawn_app().await;
    app.register("taken@test.local").await;

    let cases = [
        json!({ "email": "taken@test.local", "password": "secret123", "full_name": "Dup" }),
        json!({ "email": "not-an-email", "password": "secret123", "full_name": "Bad" }),
        json!({ "email": "short@test.local", "password": "12345", "full_name": "Short" }),
        json!({ "email": "blank@test.local", "password": "secret123", "full_name": "   " }),
    ];
    let expected = [
        StatusCode::CONFLICT,
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
        StatusCode::BAD_REQUEST,
    ];
    for (payload, want) in cases.into_iter().zip(expected) {
        let (status, body) = app.post("/api/auth/register", None, payload).await;
        assert_eq!(status, want, "{}", body);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_login_and_profile() {
    let app = spawn_app().await;
    app.register("ada@test.local").await;

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ada@test.local", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@test.local", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ADA@test.local", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@test.local");

    let (status, me) = app
        .put(
            "/api/auth/me",
            Some(&token),
            json!({ "full_name": "Ada King", "phone": "+44 1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], "Ada King");
}

#[tokio::test]
async fn test_change_password() {
    let app = spawn_app().await;
    let (token, _) = app.register("ada@test.local").await;

    let (status, _) = app
        .put(
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": "nope-nope", "new_password": "another123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            "/api/auth/password",
            Some(&token),
            json!({ "current_password": "secret123", "new_password": "another123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ada@test.local", "password": "another123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bad_tokens_are_rejected() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_administration() {
    let app = spawn_app().await;
    let (admin, admin_id) = app.register("admin@test.local").await;
    let (customer, customer_id) = app.register("customer@test.local").await;

    let (status, _) = app.get("/api/users", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = app.get("/api/users?role=customer", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["total"], 1);

    // Admins cannot lock themselves out
    let (status, _) = app
        .put(
            &format!("/api/users/{}", admin_id),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .delete(&format!("/api/users/{}", admin_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Disabled accounts cannot sign in
    let (status, user) = app
        .put(
            &format!("/api/users/{}", customer_id),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["is_active"], false);
    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "customer@test.local", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/api/users/{}", customer_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/api/users/{}", customer_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_addresses_default_handling() {
    let app = spawn_app().await;
    let (_, customer) = app.admin_and_customer().await;

    let first = app.address(&customer).await;
    let second = app.address(&customer).await;

    let (_, list) = app.get("/api/addresses", Some(&customer)).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    // The first address becomes the default automatically
    let default_ids: Vec<i64> = list
        .iter()
        .filter(|a| a["is_default"] == true)
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(default_ids, vec![first]);

    let (status, _) = app
        .put(
            &format!("/api/addresses/{}/default", second),
            Some(&customer),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = app.get("/api/addresses", Some(&customer)).await;
    let default_ids: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["is_default"] == true)
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(default_ids, vec![second]);
}

#[tokio::test]
async fn test_tokens_follow_the_stored_account() {
    let app = spawn_app().await;
    let (admin, _) = app.register("admin@test.local").await;
    let (customer, customer_id) = app.register("customer@test.local").await;
    let (clerk, clerk_id) = app.register("clerk@test.local").await;

    let (status, _) = app.get("/api/cart", Some(&customer)).await;
    assert_eq!(status, StatusCode::OK);

    // Deactivation applies to tokens already issued
    app.put(
        &format!("/api/users/{}", customer_id),
        Some(&admin),
        json!({ "is_active": false }),
    )
    .await;
    let (status, body) = app.get("/api/cart", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    // So does promotion
    let (status, _) = app.get("/api/users", Some(&clerk)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    app.put(
        &format!("/api/users/{}", clerk_id),
        Some(&admin),
        json!({ "role": "admin" }),
    )
    .await;
    let (status, _) = app.get("/api/users", Some(&clerk)).await;
    assert_eq!(status, StatusCode::OK);

    // A deleted account's token no longer authenticates
    let (status, _) = app
        .delete(&format!("/api/users/{}", customer_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .post("/api/cart/items", Some(&customer), json!({ "book_id": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_single_label_email_domain_is_accepted() {
    let app = spawn_app().await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "ops@localhost", "password": "secret123", "full_name": "Ops" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
}
