//! In-process scenario tests for the order endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` against the in-memory stores and
//! drives it via `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // oneshot
use uuid::Uuid;

use odk_daemon::{routes, state::AppState};
use odk_testkit::{product, MemCatalog, MemOrders};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_state() -> (Arc<AppState<MemCatalog, MemOrders>>, MemCatalog, MemOrders) {
    let catalog = MemCatalog::new();
    let orders = MemOrders::new();
    let st = Arc::new(AppState::new(catalog.clone(), orders.clone()));
    (st, catalog, orders)
}

fn router(st: &Arc<AppState<MemCatalog, MemOrders>>) -> axum::Router {
    routes::build_router(Arc::clone(st))
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn post_order(body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

fn order_body(product_id: Uuid, quantity: i64) -> serde_json::Value {
    json!({
        "buyer_name": "Ana",
        "payment_method": "cash",
        "lines": [{ "product_id": product_id, "quantity": quantity }],
    })
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let (st, _, _) = make_state();
    let req = Request::builder()
        .method("GET")
        .uri("/v1/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router(&st), req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "odk-daemon");
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_order_persists_and_reserves_stock() {
    let (st, catalog, orders) = make_state();
    let p = product("espresso", 500, 10);
    let pid = p.product_id;
    catalog.insert(p);

    let (status, body) = call(router(&st), post_order(order_body(pid, 3))).await;
    assert_eq!(status, StatusCode::CREATED);

    let json = parse_json(body);
    assert_eq!(json["order"]["total"], 1500);
    assert_eq!(json["lines"][0]["quantity"], 3);
    assert_eq!(json["lines"][0]["unit_price"], 500);
    assert!(json["order"]["order_number"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));

    assert_eq!(orders.count(), 1);
    assert_eq!(catalog.stock_of(pid), Some(7));
}

#[tokio::test]
async fn shortfall_is_rejected_with_no_side_effects() {
    let (st, catalog, orders) = make_state();
    let p = product("espresso", 500, 2);
    let pid = p.product_id;
    catalog.insert(p);

    let (status, body) = call(router(&st), post_order(order_body(pid, 3))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json = parse_json(body);
    assert_eq!(json["kind"], "insufficient_stock");
    let msg = json["error"].as_str().unwrap();
    assert!(msg.contains("espresso"), "message names the product: {msg}");
    assert!(msg.contains('2'), "message states availability: {msg}");

    assert_eq!(orders.count(), 0, "rejected order must not persist");
    assert_eq!(catalog.stock_of(pid), Some(2), "stock must be untouched");
}

#[tokio::test]
async fn unknown_product_is_404() {
    let (st, _, orders) = make_state();

    let (status, body) = call(router(&st), post_order(order_body(Uuid::new_v4(), 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse_json(body)["kind"], "not_found");
    assert_eq!(orders.count(), 0);
}

#[tokio::test]
async fn transfer_without_proof_is_a_validation_error() {
    let (st, catalog, orders) = make_state();
    let p = product("espresso", 500, 10);
    let pid = p.product_id;
    catalog.insert(p);

    let body = json!({
        "buyer_name": "Ana",
        "payment_method": "transfer",
        "lines": [{ "product_id": pid, "quantity": 1 }],
    });
    let (status, body) = call(router(&st), post_order(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(body)["kind"], "validation");
    assert_eq!(orders.count(), 0);
}

#[tokio::test]
async fn blank_buyer_name_is_a_validation_error() {
    let (st, catalog, _) = make_state();
    let p = product("espresso", 500, 10);
    let pid = p.product_id;
    catalog.insert(p);

    let body = json!({
        "buyer_name": "   ",
        "payment_method": "cash",
        "lines": [{ "product_id": pid, "quantity": 1 }],
    });
    let (status, body) = call(router(&st), post_order(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(body)["kind"], "validation");
}

#[tokio::test]
async fn multi_line_total_sums_subtotals() {
    let (st, catalog, _) = make_state();
    let a = product("espresso", 500, 10);
    let b = product("croissant", 350, 10);
    let (a_id, b_id) = (a.product_id, b.product_id);
    catalog.insert(a);
    catalog.insert(b);

    let body = json!({
        "buyer_name": "Ana",
        "payment_method": "cash",
        "lines": [
            { "product_id": a_id, "quantity": 2 },
            { "product_id": b_id, "quantity": 3 },
        ],
    });
    let (status, body) = call(router(&st), post_order(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let json = parse_json(body);
    assert_eq!(json["order"]["total"], 2 * 500 + 3 * 350);
    assert_eq!(json["lines"].as_array().unwrap().len(), 2);
}
