//! Purchase intake coordinator.
//!
//! Pipeline for one order-creation call, run synchronously within the
//! request:
//!
//! 1. shape validation (fail fast, first failure wins)
//! 2. per-line product check against current catalog state, price/name
//!    snapshot, subtotal and total accumulation — all before any write
//! 3. atomic persist of header + lines through [`OrderStore::insert_order`]
//! 4. per-line stock reserve through the [`StockLedger`], in list order
//!
//! Step 4 runs **after** the order is durable. A failed reserve does not
//! roll the order back and does not undo earlier reserves in the same
//! request; the discrepancy is logged at `error!` and the pipeline
//! continues. DESIGN.md records this gap as an open question rather than
//! papering over it with a compensating write here.

use chrono::Utc;
use odk_schemas::{derive_order_number, OrderDetail, PaymentMethod, StatusFlags};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{IntakeError, ValidationError};
use crate::ledger::{LedgerError, StockLedger};
use crate::store::{CatalogStore, NewLineItem, NewOrder, OrderStore};

/// Upper bound on the free-text order notes.
pub const NOTES_MAX_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// One requested product/quantity pair, in caller-supplied order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RequestedLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Raw order request as it arrives from the outside. `payment_method` stays
/// a raw string so an unrecognized value is a validation error, not a
/// deserialization failure.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    pub buyer_name: String,
    #[serde(default)]
    pub buyer_phone: Option<String>,
    #[serde(default)]
    pub table_number: Option<i32>,
    pub payment_method: String,
    #[serde(default)]
    pub payment_proof: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub lines: Vec<RequestedLine>,
}

// ---------------------------------------------------------------------------
// PurchaseIntake
// ---------------------------------------------------------------------------

/// The order-creation choke point. Owns its storage collaborators; the
/// ledger shares the catalog handle (stores are cheap clones around a pool
/// or an `Arc`).
pub struct PurchaseIntake<C, O> {
    catalog: C,
    orders: O,
    ledger: StockLedger<C>,
}

impl<C, O> PurchaseIntake<C, O>
where
    C: CatalogStore + Clone,
    O: OrderStore,
{
    pub fn new(catalog: C, orders: O) -> Self {
        Self {
            ledger: StockLedger::new(catalog.clone()),
            catalog,
            orders,
        }
    }

    /// Turn a raw request into a persisted order with reserved stock, or
    /// reject it with no partial effect.
    ///
    /// Rejections (validation, not-found, shortfall) always happen before
    /// any write: a failed request leaves zero order rows and untouched
    /// stock.
    pub async fn create_order(&self, req: &OrderRequest) -> Result<OrderDetail, IntakeError> {
        let payment_method = validate_shape(req)?;

        // Per-line catalog check and snapshot, against current state, before
        // any write. The snapshot price is whatever was visible now; a
        // concurrent price change after this point does not re-validate.
        let mut lines = Vec::with_capacity(req.lines.len());
        let mut total: i64 = 0;
        for line in &req.lines {
            let product = self
                .catalog
                .find_product(line.product_id)
                .await
                .map_err(IntakeError::Internal)?
                .filter(|p| p.state.is_active())
                .ok_or(IntakeError::ProductNotFound {
                    product_id: line.product_id,
                })?;

            if product.stock < line.quantity {
                return Err(IntakeError::InsufficientStock {
                    product_id: line.product_id,
                    product_name: product.name,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            let subtotal = line.quantity * product.unit_price;
            total += subtotal;
            lines.push(NewLineItem {
                line_id: Uuid::new_v4(),
                product_id: line.product_id,
                product_name: product.name,
                unit_price: product.unit_price,
                quantity: line.quantity,
                subtotal,
            });
        }

        let created_at = Utc::now();
        let order_id = Uuid::new_v4();
        let new_order = NewOrder {
            order_id,
            order_number: derive_order_number(created_at, order_id),
            buyer_name: req.buyer_name.trim().to_string(),
            buyer_phone: req.buyer_phone.clone(),
            table_number: req.table_number,
            // Proof is meaningful for transfers only; ignored otherwise.
            payment_proof: match payment_method {
                PaymentMethod::Transfer => req.payment_proof.clone(),
                PaymentMethod::Cash => None,
            },
            payment_method,
            notes: req.notes.clone(),
            total,
            status: StatusFlags::default(),
            created_at_utc: created_at,
            lines,
        };

        // Header + lines land together or not at all.
        let detail = self
            .orders
            .insert_order(&new_order)
            .await
            .map_err(IntakeError::Internal)?;

        info!(
            order_id = %detail.order.order_id,
            order_number = %detail.order.order_number,
            total = detail.order.total,
            lines = detail.lines.len(),
            "order persisted"
        );

        // Reserve stock per line, in list order, after the order is durable.
        // Each call is independent; a failure is logged and the pipeline
        // continues (no rollback of the order or of earlier reserves).
        for line in &detail.lines {
            match self.ledger.reserve(line.product_id, line.quantity).await {
                Ok(()) => {}
                Err(err @ LedgerError::Insufficient { .. })
                | Err(err @ LedgerError::NotFound { .. }) => {
                    error!(
                        order_id = %detail.order.order_id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        %err,
                        "stock reserve failed after order persist; order stands, stock not decremented"
                    );
                }
                Err(LedgerError::Store(err)) => {
                    error!(
                        order_id = %detail.order.order_id,
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        error = %err,
                        "storage failure during post-persist stock reserve; continuing"
                    );
                }
            }
        }

        Ok(detail)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Shape validation in the specified order: required fields, payment method,
/// transfer proof, line-item well-formedness. Catalog-dependent checks live
/// in the pipeline.
fn validate_shape(req: &OrderRequest) -> Result<PaymentMethod, ValidationError> {
    if req.buyer_name.trim().is_empty() {
        return Err(ValidationError::MissingBuyerName);
    }

    let payment_method = PaymentMethod::parse(&req.payment_method).map_err(|_| {
        ValidationError::UnknownPaymentMethod {
            given: req.payment_method.clone(),
        }
    })?;

    if payment_method == PaymentMethod::Transfer {
        let has_proof = req
            .payment_proof
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        if !has_proof {
            return Err(ValidationError::ProofRequiredForTransfer);
        }
    }

    if req.lines.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    for (i, line) in req.lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity { line: i });
        }
    }

    if let Some(notes) = &req.notes {
        if notes.chars().count() > NOTES_MAX_LEN {
            return Err(ValidationError::NotesTooLong {
                max: NOTES_MAX_LEN,
                got: notes.chars().count(),
            });
        }
    }

    Ok(payment_method)
}

// ---------------------------------------------------------------------------
// Unit tests (shape validation; pipeline scenarios live in tests/)
// ---------------------------------------------------------------------------
