//! Shared runtime state for odk-daemon.
//!
//! `AppState` is generic over the store seams so the same router runs
//! against Postgres in `main.rs` and against the in-memory doubles in the
//! scenario tests. Handlers receive `State<Arc<AppState<C, O>>>` from Axum.

use serde::Serialize;

use odk_intake::{CatalogStore, OrderStore, PurchaseIntake};

/// Static build metadata included in the health response.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Shared across all Axum handlers behind an `Arc`.
pub struct AppState<C, O> {
    /// The order-creation choke point.
    pub intake: PurchaseIntake<C, O>,
    /// Direct read/mutate access for the staff order surface.
    pub orders: O,
    pub build: BuildInfo,
}

impl<C, O> AppState<C, O>
where
    C: CatalogStore + Clone,
    O: OrderStore + Clone,
{
    pub fn new(catalog: C, orders: O) -> Self {
        Self {
            intake: PurchaseIntake::new(catalog, orders.clone()),
            orders,
            build: BuildInfo {
                service: "odk-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}
