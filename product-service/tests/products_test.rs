mod common;

use common::{FailingStore, InMemoryStore, TestApp};
use serde_json::{json, Value};
use std::sync::Arc;

const REQUIRED_FIELDS: &str = "ASIN and Cost are required fields.";
const SERVER_ERROR: &str = "An error occurred on the server.";

#[tokio::test]
async fn create_product_with_minimal_payload() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app.post_product(json!({ "asin": "B000123", "cost": 9.99 })).await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Product created successfully!");
    assert_eq!(body["data"]["asin"], "B000123");
    assert_eq!(body["data"]["cost"], 9.99);
    assert_eq!(body["data"]["title"], "No Title Provided");
    assert_eq!(body["data"]["upc"], Value::Null);
    assert_eq!(body["data"]["sku"], Value::Null);
    assert_eq!(body["data"]["createdAt"], body["data"]["updatedAt"]);

    let stored = store.get("B000123").expect("Product was not stored");
    assert_eq!(stored.cost, 9.99);
    assert_eq!(stored.title, "No Title Provided");
    assert_eq!(stored.upc, None);
    assert_eq!(stored.sku, None);
}

#[tokio::test]
async fn create_product_with_all_fields() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app
        .post_product(json!({
            "asin": "B07XJ8C8F5",
            "upc": "012345678905",
            "sku": "WIDGET-RED",
            "title": "Red Widget",
            "cost": "4.25"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["data"]["upc"], "012345678905");
    assert_eq!(body["data"]["sku"], "WIDGET-RED");
    assert_eq!(body["data"]["title"], "Red Widget");
    assert_eq!(body["data"]["cost"], 4.25);

    let stored = store.get("B07XJ8C8F5").expect("Product was not stored");
    assert_eq!(stored.cost, 4.25);
}

#[tokio::test]
async fn missing_asin_is_rejected() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app.post_product(json!({ "cost": 5 })).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "success": false, "message": REQUIRED_FIELDS }));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn missing_cost_is_rejected() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app.post_product(json!({ "asin": "X1" })).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "success": false, "message": REQUIRED_FIELDS }));
    assert!(store.get("X1").is_none());
}

#[tokio::test]
async fn rejected_payloads_never_write() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    for payload in [
        json!({}),
        json!({ "asin": "", "cost": 1 }),
        json!({ "asin": "X1", "cost": null }),
        json!({ "asin": null, "cost": 1 }),
        json!({ "asin": "X1", "cost": "twelve" }),
        json!(["X1", 1]),
    ] {
        let response = app.post_product(payload.clone()).await;
        assert_eq!(response.status().as_u16(), 400, "payload = {}", payload);
    }

    assert_eq!(store.writes(), 0);
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn uncoercible_cost_reports_its_own_message() {
    let app = TestApp::spawn(Arc::new(InMemoryStore::default())).await;

    let response = app
        .post_product(json!({ "asin": "X1", "cost": "twelve" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Cost must be a valid number.");
}

#[tokio::test]
async fn zero_cost_is_a_valid_cost() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app.post_product(json!({ "asin": "FREEBIE", "cost": 0 })).await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["data"]["cost"], 0);
    assert_eq!(store.get("FREEBIE").map(|p| p.cost), Some(0.0));
}

#[tokio::test]
async fn resubmitting_replaces_the_record_and_resets_timestamps() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;
    let payload = json!({
        "asin": "B000123",
        "sku": "OLD-SKU",
        "title": "Widget",
        "cost": 9.99
    });

    let first = app.post_product(payload.clone()).await;
    assert_eq!(first.status().as_u16(), 201);
    let first: Value = first.json().await.expect("Failed to parse JSON");

    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;

    let second = app.post_product(payload).await;
    assert_eq!(second.status().as_u16(), 201);
    let second: Value = second.json().await.expect("Failed to parse JSON");

    assert_ne!(first["data"]["createdAt"], second["data"]["createdAt"]);
    assert_eq!(second["data"]["createdAt"], second["data"]["updatedAt"]);
    assert_eq!(store.len(), 1);
    assert_eq!(store.writes(), 2);

    // A later write without `sku` drops it: no merge with the old record.
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    let third = app
        .post_product(json!({ "asin": "B000123", "cost": 11 }))
        .await;
    assert_eq!(third.status().as_u16(), 201);

    let stored = store.get("B000123").expect("Product was not stored");
    assert_eq!(stored.sku, None);
    assert_eq!(stored.title, "No Title Provided");
    assert_eq!(stored.cost, 11.0);
}

#[tokio::test]
async fn concurrent_writes_all_succeed() {
    let store = Arc::new(InMemoryStore::default());
    let app = Arc::new(TestApp::spawn(store.clone()).await);

    let mut handles = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.post_product(json!({ "asin": format!("ASIN-{}", i % 5), "cost": i }))
                .await
                .status()
                .as_u16()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.expect("Task panicked"), 201);
    }

    assert_eq!(store.writes(), 20);
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn database_failure_returns_generic_error() {
    let app = TestApp::spawn(Arc::new(FailingStore)).await;

    let response = app.post_product(json!({ "asin": "B000123", "cost": 9.99 })).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!({ "success": false, "message": SERVER_ERROR }));
}

#[tokio::test]
async fn malformed_json_returns_generic_error() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app.post_raw("{\"asin\": \"B000123\", \"cost\": ").await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], SERVER_ERROR);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn empty_body_is_a_validation_error() {
    let app = TestApp::spawn(Arc::new(InMemoryStore::default())).await;

    let response = app.post_raw("").await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["message"], REQUIRED_FIELDS);
}

#[tokio::test]
async fn whitespace_asin_and_title_are_stored_verbatim() {
    let store = Arc::new(InMemoryStore::default());
    let app = TestApp::spawn(store.clone()).await;

    let response = app
        .post_product(json!({ "asin": "   ", "cost": 1, "title": "  " }))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let stored = store.get("   ").expect("Product was not stored");
    assert_eq!(stored.title, "  ");
}
