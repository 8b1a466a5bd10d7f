mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new().await;

    let (status, wrong_password) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Same message either way; the response does not leak which part failed.
    assert_eq!(wrong_password["message"], unknown_user["message"]);
}

#[tokio::test]
async fn read_only_role_cannot_write_or_see_users() {
    let app = TestApp::new().await;
    let token = app.token_for("user@example.com").await;

    let (status, _) = app.get("/api/products", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/api/products",
            &token,
            json!({ "name": "X", "price": "1.00", "stock": 1, "sku": "S", "category": "c" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(body["status"], "error");

    // The `user` role has no grant on the users module at all.
    let (status, _) = app.get("/api/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/logs", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn manager_can_create_users_but_not_delete_them() {
    let app = TestApp::new().await;
    let token = app.token_for("manager@example.com").await;

    let (status, body) = app
        .post(
            "/api/users",
            &token,
            json!({
                "name": "New Hire",
                "email": "hire@example.com",
                "password": "password123!",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["role"], "user");
    // Password hashes never serialize.
    assert!(body["data"].get("password_hash").is_none());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.delete(&format!("/api/users/{id}"), &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin_token().await;
    let (status, _) = app.delete(&format!("/api/users/{id}"), &admin).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn me_expands_manage_into_explicit_actions() {
    let app = TestApp::new().await;
    let token = app.token_for("manager@example.com").await;

    let (status, body) = app.get("/api/users/me", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "manager");

    let orders = &body["data"]["permissions"]["orders"];
    assert_eq!(orders["allowed"], true);
    let actions = orders["actions"].as_array().unwrap();
    for action in ["create", "read", "update", "delete"] {
        assert!(actions.iter().any(|a| a == action), "missing {action}");
    }
    assert!(!actions.iter().any(|a| a == "manage"));

    // Explicit grants pass through untouched.
    let users = &body["data"]["permissions"]["users"];
    let actions = users["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 3);
    assert!(!actions.iter().any(|a| a == "delete"));
}

#[tokio::test]
async fn duplicate_emails_conflict() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .post(
            "/api/users",
            &token,
            json!({
                "name": "Clone",
                "email": "manager@example.com",
                "password": "password123!",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn revoked_tokens_stop_working() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, _) = app.get("/api/orders", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post_empty("/api/auth/logout", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/orders", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_a_working_pair() {
    let app = TestApp::new().await;

    let (_, login) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "password123!" })),
        )
        .await;
    let refresh_token = login["data"]["refresh_token"].as_str().unwrap();

    let (status, refreshed) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{refreshed}");
    let access = refreshed["data"]["access_token"].as_str().unwrap();

    let (status, _) = app.get("/api/orders", access).await;
    assert_eq!(status, StatusCode::OK);

    // A refresh token is not an access token.
    let (status, _) = app.get("/api/orders", refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_returns_named_tokens_and_sanitized_user() {
    let app = TestApp::new().await;

    let (status, login) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "admin@example.com", "password": "password123!" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{login}");

    let data = &login["data"];
    assert!(data.is_object(), "login data must be an object: {data}");
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["user"]["email"], "admin@example.com");
    assert_eq!(data["user"]["role"], "superadmin");
    assert!(data["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn audit_trail_captures_actions_with_actor_snapshot() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;
    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;

    let (status, body) = app.get("/api/logs?entity=order", &token).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["data"].as_array().unwrap();
    assert!(entries.len() >= 2, "expected create + accept entries");
    // Newest first.
    assert_eq!(entries[0]["action"], "accept");
    assert_eq!(entries[0]["user_email"], "admin@example.com");
    assert_eq!(entries[0]["user_role"], "superadmin");

    let (_, filtered) = app.get("/api/logs?entity=order&action=create", &token).await;
    let filtered = filtered["data"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["entity_id"], order.to_string());
}

#[tokio::test]
async fn unknown_role_is_denied_everywhere() {
    let app = TestApp::new().await;
    app.seed_user("Ghost", "ghost@example.com", "phantom").await;
    let token = app.token_for("ghost@example.com").await;

    for uri in ["/api/orders", "/api/products", "/api/dashboard/stats"] {
        let (status, _) = app.get(uri, &token).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn dashboard_fields_filter_by_role() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_product(&admin, "Low Stock", "5.00", 2).await;

    let (_, admin_stats) = app.get("/api/dashboard/stats", &admin).await;
    assert!(admin_stats["data"]["revenue"].is_string());
    assert!(admin_stats["data"]["total_users"].is_u64());
    assert_eq!(admin_stats["data"]["low_stock_count"], 1);

    let manager = app.token_for("manager@example.com").await;
    let (_, manager_stats) = app.get("/api/dashboard/stats", &manager).await;
    assert!(manager_stats["data"].get("revenue").is_none());
    assert!(manager_stats["data"].get("total_users").is_none());
    assert_eq!(manager_stats["data"]["low_stock_count"], 1);

    let user = app.token_for("user@example.com").await;
    let (_, user_stats) = app.get("/api/dashboard/stats", &user).await;
    assert!(user_stats["data"].get("revenue").is_none());
    assert!(user_stats["data"].get("low_stock_count").is_none());
    assert!(user_stats["data"]["total_orders"].is_u64());
}

#[tokio::test]
async fn role_assignment_rides_on_the_user_resource() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let target = app.seed_user("Floater", "floater@example.com", "user").await;

    let (status, body) = app
        .post(
            &format!("/api/users/{}/role", target.id),
            &admin,
            json!({ "role": "manager" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["role"], "manager");

    // Permission documents are replaced through POST as well.
    let (status, _) = app
        .post(
            "/api/roles/user/permissions",
            &admin,
            json!({ "permissions": { "orders": ["read"] } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Managers administer users but may not move anyone between roles.
    let manager = app.token_for("manager@example.com").await;
    let (status, _) = app
        .post(
            &format!("/api/users/{}/role", target.id),
            &manager,
            json!({ "role": "superadmin" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
