//! Request and response types for the odk-daemon HTTP endpoints.
//!
//! Domain payloads (`OrderRequest`, `OrderDetail`, `StatusPatch`) are the
//! serde types from `odk-intake` / `odk-schemas` used directly; no parallel
//! wire structs are maintained. This module holds only what the HTTP layer
//! adds on top. No business logic lives here.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// Uniform failure body: a machine-readable kind from the error taxonomy
/// ("validation" | "not_found" | "insufficient_stock" | "unauthenticated" |
/// "forbidden" | "internal") plus a human-readable message. Internal
/// failures carry detail in the server log only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub kind: String,
    pub error: String,
}
