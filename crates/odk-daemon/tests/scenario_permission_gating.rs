//! In-process scenario tests for the permission gates on the staff surface.
//!
//! Every staff route must answer 401 when the caller cannot be identified
//! and 403 when the decoded claim snapshot lacks the required permission.
//! The storefront creation route stays ungated.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // oneshot
use uuid::Uuid;

use odk_auth::perm;
use odk_daemon::{routes, state::AppState};
use odk_testkit::{bearer_token, product, MemCatalog, MemOrders};

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

fn get(uri: &str, token: Option<&str>) -> Request<axum::body::Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(axum::body::Body::empty()).unwrap()
}

/// Place one cash order for `quantity` units and return its order id.
async fn seed_order(
    st: &Arc<AppState<MemCatalog, MemOrders>>,
    catalog: &MemCatalog,
    quantity: i64,
) -> Uuid {
    let p = product("espresso", 500, 50);
    let pid = p.product_id;
    catalog.insert(p);

    let body = json!({
        "buyer_name": "Ana",
        "payment_method": "cash",
        "lines": [{ "product_id": pid, "quantity": quantity }],
    });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let (status, body) = call(router(st), req).await;
    assert_eq!(status, StatusCode::CREATED);
    parse_json(body)["order"]["order_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap()
}

// ---------------------------------------------------------------------------
// 401 / 403 discrimination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_without_a_token_is_401() {
    let (st, _, _) = make_state();
    let (status, body) = call(router(&st), get("/v1/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse_json(body)["kind"], "unauthenticated");
}

#[tokio::test]
async fn garbage_bearer_is_401_not_403() {
    let (st, _, _) = make_state();
    let (status, _) = call(router(&st), get("/v1/orders", Some("not-a-token!!"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_without_view_permission_is_403_naming_it() {
    let (st, _, _) = make_state();
    let token = bearer_token(&[perm::EDIT_ORDERS]);
    let (status, body) = call(router(&st), get("/v1/orders", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let json = parse_json(body);
    assert_eq!(json["kind"], "forbidden");
    assert!(json["error"].as_str().unwrap().contains("view_orders"));
}

#[tokio::test]
async fn listing_with_view_permission_is_200() {
    let (st, catalog, _) = make_state();
    seed_order(&st, &catalog, 1).await;

    let token = bearer_token(&[perm::VIEW_ORDERS]);
    let (status, body) = call(router(&st), get("/v1/orders", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body).as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetching_one_order_requires_view_orders() {
    let (st, catalog, _) = make_state();
    let id = seed_order(&st, &catalog, 2).await;
    let uri = format!("/v1/orders/{id}");

    let (status, _) = call(router(&st), get(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = bearer_token(&[perm::VIEW_ORDERS]);
    let (status, body) = call(router(&st), get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["order"]["order_id"], id.to_string());
}

#[tokio::test]
async fn fetching_an_unknown_order_is_404() {
    let (st, _, _) = make_state();
    let token = bearer_token(&[perm::VIEW_ORDERS]);
    let uri = format!("/v1/orders/{}", Uuid::new_v4());
    let (status, body) = call(router(&st), get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse_json(body)["kind"], "not_found");
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/:id/status
// ---------------------------------------------------------------------------

fn patch_status(id: Uuid, token: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("PATCH")
        .uri(format!("/v1/orders/{id}/status"))
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn status_patch_requires_edit_orders() {
    let (st, catalog, _) = make_state();
    let id = seed_order(&st, &catalog, 1).await;

    let viewer = bearer_token(&[perm::VIEW_ORDERS]);
    let (status, body) = call(router(&st), patch_status(id, &viewer, json!({"paid": true}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(parse_json(body)["error"]
        .as_str()
        .unwrap()
        .contains("edit_orders"));
}

#[tokio::test]
async fn status_patch_applies_only_named_flags() {
    let (st, catalog, _) = make_state();
    let id = seed_order(&st, &catalog, 1).await;
    let editor = bearer_token(&[perm::EDIT_ORDERS]);

    let (status, body) = call(
        router(&st),
        patch_status(id, &editor, json!({"paid": true, "ready": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["paid"], true);
    assert_eq!(json["ready"], true);
    assert_eq!(json["delivered"], false);

    // Omitted flags keep their value; flags can also be cleared.
    let (status, body) = call(router(&st), patch_status(id, &editor, json!({"ready": false}))).await;
    assert_eq!(status, StatusCode::OK);
    let json = parse_json(body);
    assert_eq!(json["paid"], true);
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn status_patch_on_unknown_order_is_404() {
    let (st, _, _) = make_state();
    let editor = bearer_token(&[perm::EDIT_ORDERS]);
    let (status, _) = call(
        router(&st),
        patch_status(Uuid::new_v4(), &editor, json!({"paid": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// DELETE /v1/orders/:id
// ---------------------------------------------------------------------------

fn delete_req(id: Uuid, token: Option<&str>) -> Request<axum::body::Body> {
    let mut b = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/orders/{id}"));
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(axum::body::Body::empty()).unwrap()
}

#[tokio::test]
async fn deletion_requires_delete_orders() {
    let (st, catalog, orders) = make_state();
    let id = seed_order(&st, &catalog, 1).await;

    let editor = bearer_token(&[perm::EDIT_ORDERS]);
    let (status, _) = call(router(&st), delete_req(id, Some(&editor))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(orders.count(), 1, "forbidden delete must not remove");

    let deleter = bearer_token(&[perm::DELETE_ORDERS]);
    let (status, _) = call(router(&st), delete_req(id, Some(&deleter))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(orders.count(), 0);
}

#[tokio::test]
async fn deleting_twice_is_404_and_leaves_stock_alone() {
    let (st, catalog, _) = make_state();
    let p = product("espresso", 500, 50);
    let pid = p.product_id;
    catalog.insert(p);

    let body = json!({
        "buyer_name": "Ana",
        "payment_method": "cash",
        "lines": [{ "product_id": pid, "quantity": 3 }],
    });
    let req = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let (status, body) = call(router(&st), req).await;
    assert_eq!(status, StatusCode::CREATED);
    let id: Uuid = parse_json(body)["order"]["order_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let deleter = bearer_token(&[perm::DELETE_ORDERS]);
    let (status, _) = call(router(&st), delete_req(id, Some(&deleter))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(router(&st), delete_req(id, Some(&deleter))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deletion is bookkeeping, not an undo: reserved stock stays consumed.
    assert_eq!(catalog.stock_of(pid), Some(47));
}
