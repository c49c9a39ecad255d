//! Shared domain types for orderdesk.
//!
//! Plain serde structs and closed string enums only — no I/O and no storage
//! logic lives here. Money is carried as integer minor units (`i64`); floats
//! never touch a price or a total.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PaymentMethod
// ---------------------------------------------------------------------------

/// The two recognized payment methods. Recorded, never processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(anyhow!("invalid payment method: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// ProductState
// ---------------------------------------------------------------------------

/// Product lifecycle tag. Products are soft-deactivated, never hard-deleted;
/// inactive products stay queryable for historical line items but are not
/// orderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductState {
    Active,
    Inactive,
}

impl ProductState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductState::Active => "ACTIVE",
            ProductState::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ACTIVE" => Ok(ProductState::Active),
            "INACTIVE" => Ok(ProductState::Inactive),
            other => Err(anyhow!("invalid product state: {}", other)),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProductState::Active)
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// Catalog row. Price and stock mutate only through catalog operations; the
/// one write this core performs against it is the conditional stock
/// decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    /// Unit price in minor units.
    pub unit_price: i64,
    /// Stock on hand. Never negative, including under concurrent decrements.
    pub stock: i64,
    pub state: ProductState,
    pub category: String,
    pub subcategory: Option<String>,
}

// ---------------------------------------------------------------------------
// Order status flags
// ---------------------------------------------------------------------------

/// The three independent lifecycle flags of a persisted order.
///
/// No ordering is enforced between them (`delivered` can be set before
/// `ready`). Whether that should stay true is an open business-rule
/// question recorded in DESIGN.md rather than guessed at here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub paid: bool,
    pub ready: bool,
    pub delivered: bool,
}

/// Partial update of [`StatusFlags`]. `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub paid: Option<bool>,
    pub ready: Option<bool>,
    pub delivered: Option<bool>,
}

impl StatusPatch {
    pub fn is_empty(&self) -> bool {
        self.paid.is_none() && self.ready.is_none() && self.delivered.is_none()
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Persisted order header. Line items are immutable once created; only the
/// status flags and a small set of contact/display fields may change
/// afterward. Deletion is hard and cascades to line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    /// Human-readable, time-derived, unique under reasonable load.
    pub order_number: String,
    pub buyer_name: String,
    pub buyer_phone: Option<String>,
    pub table_number: Option<i32>,
    pub payment_method: PaymentMethod,
    /// Proof-of-payment reference. Present iff `payment_method` is transfer.
    pub payment_proof: Option<String>,
    /// Sum of line subtotals at creation time. Never recomputed afterward.
    pub total: i64,
    pub notes: Option<String>,
    pub status: StatusFlags,
    pub created_at_utc: DateTime<Utc>,
}

/// One product+quantity entry within an order. `product_name` and
/// `unit_price` are snapshots taken at order creation so later catalog edits
/// never retroactively alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub line_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    /// Unit price snapshot in minor units.
    pub unit_price: i64,
    pub quantity: i64,
    /// `quantity * unit_price`, fixed at insert time.
    pub subtotal: i64,
}

/// An order header together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLineItem>,
}

// ---------------------------------------------------------------------------
// Order number derivation
// ---------------------------------------------------------------------------

/// Derive the human-readable order number from the creation timestamp plus a
/// short uuid-derived suffix, e.g. `ORD-20260829-143055-3F2A`.
///
/// Deterministic given (timestamp, entropy). Collisions are not
/// cryptographically prevented — the suffix keeps same-second orders apart
/// under reasonable load, and the DB unique constraint is the backstop.
pub fn derive_order_number(created_at: DateTime<Utc>, entropy: Uuid) -> String {
    let b = entropy.as_bytes();
    let suffix = u16::from_be_bytes([b[0], b[1]]);
    format!("ORD-{}-{:04X}", created_at.format("%Y%m%d-%H%M%S"), suffix)
}

// ---------------------------------------------------------------------------
// RBAC rows
// ---------------------------------------------------------------------------

/// Role row. The permission set a role grants lives in the role↔permission
/// join, resolved once at authentication time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
}

/// Named capability. `category` is a grouping label only — nothing enforces
/// semantics per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub permission_id: Uuid,
    pub name: String,
    pub category: String,
}

/// Account row. Credential hashing and verification belong to the token
/// issuer, not to this core; the hash is carried opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role_id: Uuid,
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
