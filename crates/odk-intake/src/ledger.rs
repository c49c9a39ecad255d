//! Inventory ledger — the race-safe stock decrement.
//!
//! # Safety mechanism
//!
//! The advisory read at the top of [`StockLedger::reserve`] exists only to
//! produce a good error message. The actual guarantee comes from the
//! conditional write behind [`CatalogStore::decrement_stock`]: "subtract
//! quantity where stock is still ≥ quantity", evaluated by the storage layer
//! as one indivisible step. When two callers race for the last units exactly
//! one conditional write affects a row; the loser gets `false` and is
//! surfaced as an insufficient-stock error, never silently ignored.
//!
//! No retry policy lives here. The caller decides whether a failed reserve
//! is fatal (it is not in the intake pipeline — see `intake.rs`).

use uuid::Uuid;

use crate::store::CatalogStore;

// ---------------------------------------------------------------------------
// LedgerError
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum LedgerError {
    NotFound {
        product_id: Uuid,
    },
    /// Not enough stock, either at the advisory check or because the
    /// conditional write lost the race.
    Insufficient {
        product_id: Uuid,
        product_name: String,
        requested: i64,
        available: i64,
    },
    Store(anyhow::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NotFound { product_id } => {
                write!(f, "ledger: product not found: {product_id}")
            }
            LedgerError::Insufficient {
                product_name,
                requested,
                available,
                ..
            } => write!(
                f,
                "ledger: insufficient stock for {product_name}: requested {requested}, available {available}"
            ),
            LedgerError::Store(_) => write!(f, "ledger: storage failure"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Store(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// StockLedger
// ---------------------------------------------------------------------------

/// Performs the atomic stock decrement for one product/quantity pair.
pub struct StockLedger<C> {
    catalog: C,
}

impl<C: CatalogStore> StockLedger<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Decrement `quantity` units of `product_id`, or fail without touching
    /// stock.
    ///
    /// `quantity` must be positive; the conditional write enforces the
    /// stock-nonnegativity invariant regardless of what the advisory read
    /// observed.
    pub async fn reserve(&self, product_id: Uuid, quantity: i64) -> Result<(), LedgerError> {
        debug_assert!(quantity > 0, "reserve quantity must be positive");

        // Advisory precondition check: better error naming, not the guard.
        let product = self
            .catalog
            .find_product(product_id)
            .await
            .map_err(LedgerError::Store)?
            .ok_or(LedgerError::NotFound { product_id })?;

        if product.stock < quantity {
            return Err(LedgerError::Insufficient {
                product_id,
                product_name: product.name,
                requested: quantity,
                available: product.stock,
            });
        }

        let applied = self
            .catalog
            .decrement_stock(product_id, quantity)
            .await
            .map_err(LedgerError::Store)?;

        if !applied {
            // The precondition became false between the advisory read and the
            // write: another caller took the stock first. Re-read for an
            // accurate "available" figure in the error.
            let available = self
                .catalog
                .find_product(product_id)
                .await
                .map_err(LedgerError::Store)?
                .map(|p| p.stock)
                .unwrap_or(0);
            return Err(LedgerError::Insufficient {
                product_id,
                product_name: product.name,
                requested: quantity,
                available,
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
