//! Test doubles for the intake core.
//!
//! In-memory implementations of the store seams plus claim fixtures. The
//! conditional decrement is performed under the catalog mutex, so it is
//! exactly as indivisible as the SQL conditional write it stands in for —
//! the concurrency scenarios exercise the real coordinator and ledger
//! against these doubles without a database.

mod mem;

pub use mem::{MemCatalog, MemOrders};

use odk_auth::Claims;
use odk_schemas::{Product, ProductState};
use uuid::Uuid;

/// A fresh active product with the given price and stock.
pub fn product(name: &str, unit_price: i64, stock: i64) -> Product {
    Product {
        product_id: Uuid::new_v4(),
        name: name.to_string(),
        unit_price,
        stock,
        state: ProductState::Active,
        category: "menu".to_string(),
        subcategory: None,
    }
}

/// Claims for a staff user holding exactly the given permissions.
pub fn staff_claims(permissions: &[&str]) -> Claims {
    Claims::new(
        Uuid::new_v4(),
        "test-staff",
        vec!["staff".to_string()],
        permissions.iter().map(|p| p.to_string()),
    )
}

/// Encoded bearer token for a staff user with the given permissions.
pub fn bearer_token(permissions: &[&str]) -> String {
    odk_auth::encode_token(&staff_claims(permissions)).expect("claims encode")
}
