#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bookstore::auth::JwtKeys;
use bookstore::db;
use bookstore::infrastructure::AppState;
use bookstore::infrastructure::storage::MemoryStorage;
use bookstore::server::{RouterOptions, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

pub const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
pub const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
}

// Helper to create a router over a fresh in-memory database
pub async fn spawn_app() -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let storage = Arc::new(MemoryStorage::new());
    let state = AppState::new(db, storage.clone(), JwtKeys::new("test-secret", 1))
        .with_max_upload_bytes(1024);
    let router = build_router(state.clone(), &RouterOptions::default());
    TestApp {
        router,
        state,
        storage,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(req).await.unwrap();
        read_json(response).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Multipart upload of `(file_name, bytes)` parts under the `files` field.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        files: &[(&str, &[u8])],
    ) -> (StatusCode, Value) {
        let boundary = "bookstore-test-boundary";
        let mut body = Vec::new();
        for (name, bytes) in files {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                    name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let response = self.router.clone().oneshot(req).await.unwrap();
        read_json(response).await
    }

    /// Register an account and return `(token, user_id)`.
    pub async fn register(&self, email: &str) -> (String, i64) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "password": "secret123", "full_name": "Test User" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    /// First account on a fresh database is the administrator.
    pub async fn admin_and_customer(&self) -> (String, String) {
        let (admin, _) = self.register("admin@test.local").await;
        let (customer, _) = self.register("customer@test.local").await;
        (admin, customer)
    }

    pub async fn create_book(&self, admin: &str, title: &str, isbn: &str, price_cents: i64) -> i64 {
        let (status, body) = self
            .post(
                "/api/books",
                Some(admin),
                json!({ "title": title, "isbn": isbn, "price_cents": price_cents }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create book failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Stock row in the default warehouse; returns the stock item id.
    pub async fn stock(&self, admin: &str, book_id: i64, quantity: i32) -> i64 {
        let (status, body) = self
            .post(
                "/api/inventory",
                Some(admin),
                json!({ "book_id": book_id, "quantity": quantity, "reorder_level": 2 }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create stock failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    pub async fn address(&self, token: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/addresses",
                Some(token),
                json!({
                    "recipient_name": "Ada Lovelace",
                    "phone": "+44 20 7946 0000",
                    "line1": "12 St James's Square",
                    "city": "London",
                    "postal_code": "SW1Y 4JH",
                    "country": "UK"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create address failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
