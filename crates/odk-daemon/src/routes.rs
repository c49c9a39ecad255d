//! Axum router and all HTTP handlers for odk-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.  All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.
//!
//! # Permission gates
//!
//! Order creation is the public storefront surface and is ungated. Every
//! staff surface decodes the bearer claims first (401 on failure) and then
//! evaluates the required permission against the snapshot (403 on a miss):
//!
//! | route                        | permission      |
//! |------------------------------|-----------------|
//! | `GET /v1/orders`             | `view_orders`   |
//! | `GET /v1/orders/:id`         | `view_orders`   |
//! | `PATCH /v1/orders/:id/status`| `edit_orders`   |
//! | `DELETE /v1/orders/:id`      | `delete_orders` |

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{error, info};
use uuid::Uuid;

use odk_auth::{perm, AuthError, Claims};
use odk_intake::{CatalogStore, IntakeError, OrderRequest, OrderStore};
use odk_schemas::StatusPatch;

use crate::{
    api_types::{ApiErrorBody, HealthResponse},
    auth::claims_from_headers,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router<C, O>(state: Arc<AppState<C, O>>) -> Router
where
    C: CatalogStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
{
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/:id", get(get_order).delete(delete_order_route))
        .route("/v1/orders/:id/status", patch(patch_status))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn error_body(kind: &str, message: impl Into<String>) -> Json<ApiErrorBody> {
    Json(ApiErrorBody {
        kind: kind.to_string(),
        error: message.into(),
    })
}

/// 401 for unauthenticated, 403 for forbidden. Messages are safe to echo.
fn auth_error_response(err: AuthError) -> Response {
    let status = match err {
        AuthError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
    };
    let kind = match err {
        AuthError::Unauthenticated { .. } => "unauthenticated",
        AuthError::Forbidden { .. } => "forbidden",
    };
    (status, error_body(kind, err.to_string())).into_response()
}

/// Map the intake taxonomy onto HTTP. Internal failures are logged with
/// their full chain and answered with an opaque body.
fn intake_error_response(err: IntakeError) -> Response {
    match &err {
        IntakeError::Validation(_) | IntakeError::InsufficientStock { .. } => {
            (StatusCode::BAD_REQUEST, error_body(err.kind(), err.to_string())).into_response()
        }
        IntakeError::ProductNotFound { .. } => {
            (StatusCode::NOT_FOUND, error_body(err.kind(), err.to_string())).into_response()
        }
        IntakeError::Internal(source) => {
            error!(error = ?source, "order intake failed internally");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("internal", "internal error"),
            )
                .into_response()
        }
    }
}

/// Storage plumbing failure on a staff read/mutate path.
fn storage_error_response(context: &str, source: anyhow::Error) -> Response {
    error!(error = ?source, "{context} failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_body("internal", "internal error"),
    )
        .into_response()
}

fn order_not_found(order_id: Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        error_body("not_found", format!("order {order_id} not found")),
    )
        .into_response()
}

/// Decode claims and evaluate one required permission in a single step.
fn gate(headers: &HeaderMap, permission: &str) -> Result<Claims, Response> {
    let claims = claims_from_headers(headers).map_err(auth_error_response)?;
    claims
        .require(permission)
        .map_err(auth_error_response)?;
    Ok(claims)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health<C, O>(State(st): State<Arc<AppState<C, O>>>) -> impl IntoResponse
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

/// Public storefront surface: no bearer required.
pub(crate) async fn create_order<C, O>(
    State(st): State<Arc<AppState<C, O>>>,
    Json(req): Json<OrderRequest>,
) -> Response
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    match st.intake.create_order(&req).await {
        Ok(detail) => (StatusCode::CREATED, Json(detail)).into_response(),
        Err(err) => intake_error_response(err),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

pub(crate) async fn list_orders<C, O>(
    State(st): State<Arc<AppState<C, O>>>,
    headers: HeaderMap,
) -> Response
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    if let Err(resp) = gate(&headers, perm::VIEW_ORDERS) {
        return resp;
    }
    match st.orders.list_orders().await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => storage_error_response("order listing", e),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/orders/:id
// ---------------------------------------------------------------------------

pub(crate) async fn get_order<C, O>(
    State(st): State<Arc<AppState<C, O>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Response
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    if let Err(resp) = gate(&headers, perm::VIEW_ORDERS) {
        return resp;
    }
    match st.orders.fetch_order(order_id).await {
        Ok(Some(detail)) => (StatusCode::OK, Json(detail)).into_response(),
        Ok(None) => order_not_found(order_id),
        Err(e) => storage_error_response("order fetch", e),
    }
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/:id/status
// ---------------------------------------------------------------------------

/// Apply any subset of the three status flags. Flags are independent; no
/// sequencing between paid/ready/delivered is enforced. Omitted fields keep
/// their current value. Responds with the complete post-update flag set.
pub(crate) async fn patch_status<C, O>(
    State(st): State<Arc<AppState<C, O>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(body): Json<StatusPatch>,
) -> Response
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    let claims = match gate(&headers, perm::EDIT_ORDERS) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match st.orders.update_status(order_id, body).await {
        Ok(Some(flags)) => {
            info!(
                %order_id,
                by = %claims.username,
                paid = flags.paid,
                ready = flags.ready,
                delivered = flags.delivered,
                "order status updated"
            );
            (StatusCode::OK, Json(flags)).into_response()
        }
        Ok(None) => order_not_found(order_id),
        Err(e) => storage_error_response("order status update", e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/orders/:id
// ---------------------------------------------------------------------------

/// Removes the order and (by cascade) its line items. Stock is **not**
/// restored: reservations are consumption, and deletion is bookkeeping, not
/// an undo.
pub(crate) async fn delete_order_route<C, O>(
    State(st): State<Arc<AppState<C, O>>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Response
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    let claims = match gate(&headers, perm::DELETE_ORDERS) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match st.orders.delete_order(order_id).await {
        Ok(true) => {
            info!(%order_id, by = %claims.username, "order deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => order_not_found(order_id),
        Err(e) => storage_error_response("order deletion", e),
    }
}
