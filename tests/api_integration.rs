//! End-to-end tests for the HTTP surface: auth flow, role gating, the
//! cached inventory read path, and order round-trips.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use logitrack_backend::{
    auth::{JwtHandler, UserStore},
    config::Config,
    create_router, seed,
    store::Db,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    db: Arc<Db>,
    _db_file: NamedTempFile,
}

fn spawn_app() -> TestApp {
    let db_file = NamedTempFile::new().unwrap();
    let db_path = db_file.path().to_str().unwrap().to_string();

    let config = Config {
        jwt_secret: "integration-test-secret".to_string(),
        jwt_issuer: "logitrack".to_string(),
        db_path: db_path.clone(),
        bind_addr: "127.0.0.1:0".to_string(),
        admin_email: "admin@logitrack.com".to_string(),
        admin_password: "AdminPass123!".to_string(),
        seed_demo_data: false,
    };

    let db = Arc::new(Db::new(&db_path).unwrap());
    let users = Arc::new(UserStore::new(&db_path).unwrap());
    let jwt = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.jwt_issuer.clone(),
    ));

    seed::run(&config, &db, &users).unwrap();

    let router = create_router(db.clone(), users.clone(), jwt);

    TestApp {
        router,
        db,
        _db_file: db_file,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn manager_token(app: &TestApp) -> String {
    let (status, body) = login(app, "admin@logitrack.com", "AdminPass123!").await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Register an account, confirm it via the returned link, and log in.
async fn register_confirmed_user(app: &TestApp, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = body["confirmationLink"].as_str().unwrap().to_string();

    let (status, _) = send(app, Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(app, email, password).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check_is_public() {
    let app = spawn_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_invalid_tokens() {
    let app = spawn_app();

    let (status, _) = send(&app, Method::GET, "/api/inventory", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/inventory",
        Some("garbage.token.here"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_gates_login_on_email_confirmation() {
    let app = spawn_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "samir@example.com", "password": "UserPass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = body["confirmationLink"].as_str().unwrap().to_string();

    // Cannot log in before confirming
    let (status, body) = login(&app, "samir@example.com", "UserPass123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email not confirmed.");

    // Confirm via the returned link, then retry the same link: both succeed
    let (status, _) = send(&app, Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &link, None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = login(&app, "samir@example.com", "UserPass123!").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn invalid_confirmation_token_does_not_confirm() {
    let app = spawn_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "samir@example.com", "password": "UserPass123!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let link = body["confirmationLink"].as_str().unwrap().to_string();
    let bad_link = format!("{}wrong", link);

    let (status, _) = send(&app, Method::GET, &bad_link, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Account stays gated
    let (status, body) = login(&app, "samir@example.com", "UserPass123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email not confirmed.");
}

#[tokio::test]
async fn confirmation_for_unknown_user_is_not_found() {
    let app = spawn_app();
    let uri = format!(
        "/api/auth/confirmemail?userId={}&token=whatever",
        uuid::Uuid::new_v4()
    );
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let app = spawn_app();
    let payload = json!({ "email": "samir@example.com", "password": "UserPass123!" });

    let (status, _) = send(&app, Method::POST, "/api/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn weak_password_rejected_with_all_violations() {
    let app = spawn_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": "samir@example.com", "password": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Too short, no uppercase, no digit, no symbol
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn login_rejections_are_indistinguishable() {
    let app = spawn_app();
    register_confirmed_user(&app, "samir@example.com", "UserPass123!").await;

    let (wrong_pw_status, wrong_pw_body) =
        login(&app, "samir@example.com", "WrongPass123!").await;
    let (no_user_status, no_user_body) = login(&app, "nobody@example.com", "UserPass123!").await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);
}

#[tokio::test]
async fn inventory_writes_require_manager_role() {
    let app = spawn_app();
    let user_token = register_confirmed_user(&app, "samir@example.com", "UserPass123!").await;
    let admin_token = manager_token(&app).await;

    let item = json!({ "name": "Pallet Jack", "quantity": 12, "location": "Warehouse A" });

    // Plain user: 403, distinct from unauthenticated
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&user_token),
        Some(item.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Manager: 201
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&admin_token),
        Some(item),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["itemId"].as_i64().unwrap();

    // Deleting is gated too
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/inventory/{item_id}"),
        Some(&user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/inventory/{item_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_inventory_payload_rejected() {
    let app = spawn_app();
    let admin_token = manager_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&admin_token),
        Some(json!({ "name": "", "quantity": -1, "location": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn inventory_listing_is_cached_until_mutation() {
    let app = spawn_app();
    let admin_token = manager_token(&app).await;

    // First read populates the cache
    let (status, first) = send(&app, Method::GET, "/api/inventory", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.db.list_reads(), 1);

    // Second read within the TTL is served from cache: identical data,
    // no persistence read
    let (status, second) = send(&app, Method::GET, "/api/inventory", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(app.db.list_reads(), 1);

    // A successful POST invalidates eagerly, well inside the TTL window
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&admin_token),
        Some(json!({ "name": "Forklift", "quantity": 3, "location": "Warehouse B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, third) = send(&app, Method::GET, "/api/inventory", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.db.list_reads(), 2);
    assert_eq!(third.as_array().unwrap().len(), 1);

    // DELETE invalidates as well
    let item_id = third[0]["itemId"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/inventory/{item_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, fourth) = send(&app, Method::GET, "/api/inventory", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.db.list_reads(), 3);
    assert!(fourth.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn order_round_trip_with_cascade_delete() {
    let app = spawn_app();
    let admin_token = manager_token(&app).await;
    let user_token = register_confirmed_user(&app, "samir@example.com", "UserPass123!").await;

    // Manager stocks two items
    let (_, a) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&admin_token),
        Some(json!({ "name": "Pallet Jack", "quantity": 12, "location": "Warehouse A" })),
    )
    .await;
    let (_, b) = send(
        &app,
        Method::POST,
        "/api/inventory",
        Some(&admin_token),
        Some(json!({ "name": "Forklift", "quantity": 3, "location": "Warehouse B" })),
    )
    .await;
    let a_id = a["itemId"].as_i64().unwrap();
    let b_id = b["itemId"].as_i64().unwrap();

    // Order creation only requires authentication; unknown ids are dropped
    let (status, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&user_token),
        Some(json!({
            "customerName": "Samir",
            "items": [ { "itemId": a_id }, { "itemId": b_id }, { "itemId": 9999 } ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["orderId"].as_i64().unwrap();

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["itemId"].as_i64().unwrap(), a_id);
    assert_eq!(items[0]["name"], "Pallet Jack");
    assert_eq!(items[0]["quantity"], 12);
    assert_eq!(items[0]["location"], "Warehouse A");
    assert_eq!(items[1]["itemId"].as_i64().unwrap(), b_id);

    // Readable by any authenticated identity
    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{order_id}"),
        Some(&user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["customerName"], "Samir");

    let (status, _) = send(&app, Method::GET, "/api/orders/9999", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deletion is manager-gated and cascades to the attached items
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_id}"),
        Some(&user_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(app.db.get_inventory_item(a_id).unwrap().is_none());
    assert!(app.db.get_inventory_item(b_id).unwrap().is_none());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{order_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
