//! Storage trait seams for the intake pipeline.
//!
//! The coordinator and ledger are generic over these traits. `odk-db`
//! implements them against PostgreSQL; `odk-testkit` provides in-memory
//! doubles for tests. Futures carry an explicit `+ Send` bound so generic
//! callers (the axum handlers in `odk-daemon`) stay spawnable.

use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use odk_schemas::{OrderDetail, PaymentMethod, Product, StatusFlags, StatusPatch};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// New-order rows
// ---------------------------------------------------------------------------

/// Line item ready for insertion. Snapshots are already taken; `subtotal`
/// equals `quantity * unit_price` and is never recomputed by the store.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub subtotal: i64,
}

/// Fully validated order ready for insertion. The store writes the header
/// and every line as one atomic unit — all rows visible together or none.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: Uuid,
    pub order_number: String,
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub table_number: Option<i32>,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub notes: Option<String>,
    pub total: i64,
    pub status: StatusFlags,
    pub created_at_utc: DateTime<Utc>,
    pub lines: Vec<NewLineItem>,
}

// ---------------------------------------------------------------------------
// CatalogStore
// ---------------------------------------------------------------------------

/// Read access to the product catalog plus the one write this core performs
/// against it: the conditional stock decrement.
pub trait CatalogStore: Send + Sync {
    /// Look up a product by id. Inactive products are still returned; the
    /// caller decides whether lifecycle state matters for its operation.
    fn find_product(
        &self,
        product_id: Uuid,
    ) -> impl Future<Output = Result<Option<Product>>> + Send;

    /// Atomically decrement `stock` by `quantity` iff enough stock remains
    /// and the product is active, as a single indivisible storage-level
    /// write. Returns `true` when a row was affected; `false` means the
    /// precondition no longer held (lost the race, product gone inactive, or
    /// product missing). Never drives stock negative.
    fn decrement_stock(
        &self,
        product_id: Uuid,
        quantity: i64,
    ) -> impl Future<Output = Result<bool>> + Send;
}

// ---------------------------------------------------------------------------
// OrderStore
// ---------------------------------------------------------------------------

/// Order persistence. Header + lines are one atomic unit on insert; deletion
/// is hard and cascades to the lines without touching product stock.
pub trait OrderStore: Send + Sync {
    /// Persist the order and all its line items in one transaction and
    /// return the stored detail.
    fn insert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<OrderDetail>> + Send;

    fn fetch_order(
        &self,
        order_id: Uuid,
    ) -> impl Future<Output = Result<Option<OrderDetail>>> + Send;

    /// All orders with line-item detail, newest first.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<OrderDetail>>> + Send;

    /// Apply a partial status update. Returns the resulting flags, or `None`
    /// when the order does not exist.
    fn update_status(
        &self,
        order_id: Uuid,
        patch: StatusPatch,
    ) -> impl Future<Output = Result<Option<StatusFlags>>> + Send;

    /// Hard-delete the order and its lines. Returns `false` when the order
    /// does not exist. Does NOT restore previously decremented stock.
    fn delete_order(&self, order_id: Uuid) -> impl Future<Output = Result<bool>> + Send;
}
