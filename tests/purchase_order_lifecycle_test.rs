mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

async fn create_po(app: &TestApp, token: &str, product: Uuid) -> (Uuid, serde_json::Value) {
    let (status, body) = app
        .post(
            "/api/purchase-orders",
            token,
            json!({
                "items": [{ "product_id": product, "quantity": 5 }],
                "delivery_date": (Utc::now() + Duration::days(14)).to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap();
    (id, body)
}

#[tokio::test]
async fn creation_synthesizes_picking_and_packing_tasks() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "100.00", 10).await;

    let before = Utc::now();
    let (po, body) = create_po(&app, &token, product).await;
    assert_eq!(body["data"]["status"], "pending");

    let tasks = body["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    let types: Vec<&str> = tasks
        .iter()
        .map(|t| t["task_type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"picking"));
    assert!(types.contains(&"packing"));
    for task in tasks {
        assert_eq!(task["assigned_to"], "Unassigned");
        assert_eq!(task["purchase_order_id"], po.to_string());
        let due = DateTime::parse_from_rfc3339(task["due_date"].as_str().unwrap()).unwrap();
        let offset_days = if task["task_type"] == "picking" { 1 } else { 2 };
        let expected = before + Duration::days(offset_days);
        let delta = (due.with_timezone(&Utc) - expected).num_seconds().abs();
        assert!(delta < 60, "due date off by {delta}s");
    }

    let (status, listed) = app
        .get(&format!("/api/purchase-orders/{po}/tasks"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn shipping_is_gated_on_delivery_order_creation() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "100.00", 10).await;
    let (po, _) = create_po(&app, &token, product).await;

    app.post_empty(&format!("/api/purchase-orders/{po}/approve"), &token)
        .await;

    let (status, body) = app
        .post(
            &format!("/api/purchase-orders/{po}/advance-status"),
            &token,
            json!({ "status": "shipping" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .post_empty(&format!("/api/purchase-orders/{po}/create-do"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["do_created"], true);

    // Only once.
    let (status, _) = app
        .post_empty(&format!("/api/purchase-orders/{po}/create-do"), &token)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            &format!("/api/purchase-orders/{po}/advance-status"),
            &token,
            json!({ "status": "shipping" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "shipping");
}

#[tokio::test]
async fn invoice_requires_delivery_and_is_stable() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "100.00", 10).await;
    let (po, _) = create_po(&app, &token, product).await;

    let (status, _) = app
        .post_empty(&format!("/api/purchase-orders/{po}/generate-invoice"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post_empty(&format!("/api/purchase-orders/{po}/approve"), &token)
        .await;
    app.post_empty(&format!("/api/purchase-orders/{po}/create-do"), &token)
        .await;
    app.post(
        &format!("/api/purchase-orders/{po}/advance-status"),
        &token,
        json!({ "status": "shipping" }),
    )
    .await;
    app.post(
        &format!("/api/purchase-orders/{po}/advance-status"),
        &token,
        json!({ "status": "delivered" }),
    )
    .await;

    let expected = format!("/invoices/PO-{po}.pdf");
    let (status, first) = app
        .post_empty(&format!("/api/purchase-orders/{po}/generate-invoice"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["data"]["invoice_url"].as_str().unwrap(), expected);

    let (status, second) = app
        .post_empty(&format!("/api/purchase-orders/{po}/generate-invoice"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["invoice_url"].as_str().unwrap(), expected);
}

#[tokio::test]
async fn cancellation_window_closes_after_shipping() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "50.00", 10).await;

    // Pending cancels cleanly and stays cancelled.
    let (pending_po, _) = create_po(&app, &token, product).await;
    let (status, body) = app
        .post_empty(&format!("/api/purchase-orders/{pending_po}/cancel"), &token)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    let (status, _) = app
        .post_empty(&format!("/api/purchase-orders/{pending_po}/approve"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Delivered refuses cancellation.
    let (po, _) = create_po(&app, &token, product).await;
    app.post_empty(&format!("/api/purchase-orders/{po}/approve"), &token)
        .await;
    app.post_empty(&format!("/api/purchase-orders/{po}/create-do"), &token)
        .await;
    app.post(
        &format!("/api/purchase-orders/{po}/advance-status"),
        &token,
        json!({ "status": "shipping" }),
    )
    .await;
    app.post(
        &format!("/api/purchase-orders/{po}/advance-status"),
        &token,
        json!({ "status": "delivered" }),
    )
    .await;

    let (status, body) = app
        .post_empty(&format!("/api/purchase-orders/{po}/cancel"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn rejection_records_reason_and_reviewer() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "50.00", 10).await;
    let (po, _) = create_po(&app, &token, product).await;

    let (status, body) = app
        .post(
            &format!("/api/purchase-orders/{po}/reject"),
            &token,
            json!({ "reason": "supplier discontinued" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["rejection_reason"], "supplier discontinued");
    assert!(body["data"]["rejected_at"].is_string());
    assert!(body["data"]["rejected_by"].is_string());

    // Terminal; approval is no longer possible.
    let (status, _) = app
        .post_empty(&format!("/api/purchase-orders/{po}/approve"), &token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn totals_follow_current_product_prices() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let product = app.create_product(&token, "Pallet", "10.00", 10).await;
    let (po, body) = create_po(&app, &token, product).await;
    // Decimal scale is not preserved through storage, so compare values.
    let total: Decimal = body["data"]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, Decimal::new(50, 0));

    // Line quantity 5 at the new price.
    app.put(
        &format!("/api/products/{product}"),
        &token,
        json!({ "price": "12.00" }),
    )
    .await;
    let (_, body) = app.get(&format!("/api/purchase-orders/{po}"), &token).await;
    let total: Decimal = body["data"]["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, Decimal::new(60, 0));
}

#[tokio::test]
async fn unknown_purchase_order_is_404() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;
    let missing = Uuid::new_v4();
    let (status, _) = app
        .get(&format!("/api/purchase-orders/{missing}"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .get(&format!("/api/purchase-orders/{missing}/tasks"), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
