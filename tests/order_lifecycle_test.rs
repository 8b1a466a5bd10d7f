mod common;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn accept_creates_processing_task_and_stamps_acceptance() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "19.99", 50).await;
    let order = app.create_order(&token, product, 3).await;

    let (status, body) = app
        .post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "accepted");
    assert!(body["data"]["accepted_at"].is_string());

    let (status, tasks) = app.get("/api/tasks", &token).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks["data"].as_array().unwrap().clone();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task_type"], "order_processing");
    assert_eq!(tasks[0]["order_id"], order.to_string());
    assert_eq!(tasks[0]["assigned_to"], "Super Admin");
}

#[tokio::test]
async fn accept_refused_past_pending_without_partial_task() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, _) = app
        .post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("accepted"), "{message}");

    // The failed second accept must not have produced another task.
    let (_, tasks) = app.get("/api/tasks", &token).await;
    assert_eq!(tasks["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reject_removes_the_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, _) = app
        .post(
            &format!("/api/orders/{order}/reject"),
            &token,
            json!({ "reason": "out of stock" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/orders/{order}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reject_has_no_status_precondition() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, _) = app
        .post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    // Acceptance does not shield an order from rejection.
    let (status, _) = app
        .post(
            &format!("/api/orders/{order}/reject"),
            &token,
            json!({ "reason": "customer backed out" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/orders/{order}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn version_counts_mutations_and_guards_stale_updates() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;

    let (_, body) = app.get(&format!("/api/orders/{order}"), &token).await;
    assert_eq!(body["data"]["version"], 1);

    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    let (_, body) = app.get(&format!("/api/orders/{order}"), &token).await;
    assert_eq!(body["data"]["version"], 2);

    // A writer holding the pre-accept copy is refused.
    let (status, _) = app
        .put(
            &format!("/api/orders/{order}"),
            &token,
            json!({ "customer_name": "Stale Writer", "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .put(
            &format!("/api/orders/{order}"),
            &token,
            json!({ "customer_name": "Fresh Writer", "version": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["version"], 3);
}

#[tokio::test]
async fn history_replays_the_lifecycle_oldest_first() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "5.00", 10).await;
    let order = app.create_order(&token, product, 1).await;
    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    app.post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
        .await;

    let (status, body) = app
        .get(&format!("/api/orders/{order}/history"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let actions: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, ["create", "accept", "switch_to_do"]);

    let (status, _) = app
        .get(&format!("/api/orders/{}/history", uuid::Uuid::new_v4()), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversion_allocates_sequential_monthly_do_numbers() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;

    let today = Utc::now();
    let prefix = format!(
        "DO-{:04}{:02}{:02}",
        today.year(),
        today.month(),
        today.day()
    );

    for expected in ["0001", "0002", "0003"] {
        let order = app.create_order(&token, product, 2).await;
        app.post_empty(&format!("/api/orders/{order}/accept"), &token)
            .await;
        let (status, body) = app
            .post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let do_number = body["data"]["delivery_order"]["do_number"].as_str().unwrap();
        assert_eq!(do_number, format!("{prefix}-{expected}"));
        assert_eq!(body["data"]["order"]["status"], "processing");
    }
}

#[tokio::test]
async fn conversion_requires_an_accepted_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, body) = app
        .post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // No delivery order was written and no number burned.
    let (_, dos) = app.get("/api/orders/delivery", &token).await;
    assert!(dos["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn conversion_snapshots_items_and_links_back() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "12.50", 100).await;
    let order = app.create_order(&token, product, 4).await;
    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;

    let (_, body) = app
        .post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
        .await;
    let do_id = body["data"]["delivery_order"]["id"].as_str().unwrap();
    assert_eq!(
        body["data"]["order"]["delivery_order_id"].as_str().unwrap(),
        do_id
    );

    let (status, detail) = app
        .get(&format!("/api/orders/delivery/{do_id}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = detail["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 4);
    assert_eq!(detail["data"]["customer_name"], "Acme Corp");
    assert_eq!(detail["data"]["status"], "pending");
    // PO reference is derived from the order id, uppercase hex tail.
    let po_number = detail["data"]["po_number"].as_str().unwrap();
    assert!(po_number.starts_with("PO-"));
    assert_eq!(po_number.len(), 9);
}

#[tokio::test]
async fn delivered_delivery_order_completes_the_source_order() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;
    let order = app.create_order(&token, product, 1).await;
    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    let (_, body) = app
        .post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
        .await;
    let do_id = body["data"]["delivery_order"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            &format!("/api/orders/delivery/{do_id}/status"),
            &token,
            json!({ "status": "delivered" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "delivered");

    let (_, order_body) = app.get(&format!("/api/orders/{order}"), &token).await;
    assert_eq!(order_body["data"]["status"], "completed");
    assert!(order_body["data"]["completed_at"].is_string());
}

#[tokio::test]
async fn advance_status_walks_forward_and_stamps_delivery() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;
    let order = app.create_order(&token, product, 1).await;
    app.post_empty(&format!("/api/orders/{order}/accept"), &token)
        .await;
    app.post_empty(&format!("/api/orders/{order}/switch-to-do"), &token)
        .await;

    let (status, body) = app
        .post(
            &format!("/api/orders/{order}/advance-status"),
            &token,
            json!({ "status": "shipping" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "shipping");

    // Backward move is refused.
    let (status, _) = app
        .post(
            &format!("/api/orders/{order}/advance-status"),
            &token,
            json!({ "status": "preparing_do" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .post(
            &format!("/api/orders/{order}/advance-status"),
            &token,
            json!({ "status": "delivered" }),
        )
        .await;
    assert!(body["data"]["delivery_date"].is_string());
    assert_eq!(
        body["data"]["invoice_url"].as_str().unwrap(),
        format!("/invoices/SO-{order}.pdf")
    );
}

#[tokio::test]
async fn advance_status_rejects_non_fulfillment_targets() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, _) = app
        .post(
            &format!("/api/orders/{order}/advance-status"),
            &token,
            json!({ "status": "accepted" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_blocked_once_terminal() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "10.00", 100).await;
    let order = app.create_order(&token, product, 1).await;

    let (status, _) = app
        .post_empty(&format!("/api/orders/{order}/cancel"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_empty(&format!("/api/orders/{order}/cancel"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn order_total_uses_current_product_prices() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Widget", "7.25", 100).await;
    let order = app.create_order(&token, product, 4).await;

    let (_, body) = app.get(&format!("/api/orders/{order}"), &token).await;
    // Decimal scale is not preserved through storage, so compare values.
    let total: Decimal = body["data"]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, Decimal::new(29, 0));
    let items = body["data"]["items"].as_array().unwrap();
    let price: Decimal = items[0]["price"].as_str().unwrap().parse().unwrap();
    assert_eq!(price, Decimal::new(725, 2));
}

#[tokio::test]
async fn creating_an_order_with_unknown_product_fails() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .post(
            "/api/orders",
            &token,
            json!({
                "customer_name": "Acme Corp",
                "items": [{ "product_id": uuid::Uuid::new_v4(), "quantity": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, orders) = app.get("/api/orders", &token).await;
    assert!(orders["data"].as_array().unwrap().is_empty());
}
