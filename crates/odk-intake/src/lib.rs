//! Order intake and inventory consistency core.
//!
//! This crate owns the hard part of the system: turning a raw order request
//! into a durably persisted order with correct totals and reserved stock, or
//! rejecting it cleanly with no partial effect. Storage is reached only
//! through the [`store`] trait seams so the same pipeline runs against
//! PostgreSQL (`odk-db`) and the in-memory stores (`odk-testkit`).
//!
//! Modules:
//! - [`store`]   — `CatalogStore` / `OrderStore` seams and the new-order rows.
//! - [`ledger`]  — race-safe conditional stock decrement.
//! - [`intake`]  — the purchase intake coordinator.
//! - [`status`]  — order status flag transitions and lifecycle.
//! - [`error`]   — the intake error taxonomy.

pub mod error;
pub mod intake;
pub mod ledger;
pub mod status;
pub mod store;

pub use error::{IntakeError, ValidationError};
pub use intake::{OrderRequest, PurchaseIntake, RequestedLine, NOTES_MAX_LEN};
pub use ledger::{LedgerError, StockLedger};
pub use store::{CatalogStore, NewLineItem, NewOrder, OrderStore};
