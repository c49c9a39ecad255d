//! Intake error taxonomy.
//!
//! Four kinds, each with a distinct remediation:
//! - validation     — malformed request; recoverable client-side.
//! - not-found      — product absent or inactive; terminal for the request.
//! - insufficient   — stock shortfall; names the product and what is left.
//! - internal       — persistence failure; opaque to the caller, detailed in
//!   server logs.

use uuid::Uuid;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// The specific request rule that was violated. Checks run in a fixed order
/// and the first failure wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingBuyerName,
    UnknownPaymentMethod { given: String },
    /// Payment method is transfer but no proof-of-payment reference came
    /// with the request.
    ProofRequiredForTransfer,
    EmptyOrder,
    NonPositiveQuantity { line: usize },
    NotesTooLong { max: usize, got: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingBuyerName => write!(f, "buyer name is required"),
            ValidationError::UnknownPaymentMethod { given } => {
                write!(f, "unknown payment method: {given}")
            }
            ValidationError::ProofRequiredForTransfer => {
                write!(f, "transfer payments require a proof-of-payment reference")
            }
            ValidationError::EmptyOrder => write!(f, "order has no line items"),
            ValidationError::NonPositiveQuantity { line } => {
                write!(f, "line {line}: quantity must be a positive integer")
            }
            ValidationError::NotesTooLong { max, got } => {
                write!(f, "notes too long: {got} chars (max {max})")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// IntakeError
// ---------------------------------------------------------------------------

/// Failure of the intake pipeline. Validation and stock failures always
/// happen before any write, so none of these variants implies a partially
/// persisted order.
#[derive(Debug)]
pub enum IntakeError {
    Validation(ValidationError),
    /// Product missing from the catalog or not active.
    ProductNotFound { product_id: Uuid },
    /// Stock shortfall, naming the product and the quantity still available.
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        requested: i64,
        available: i64,
    },
    /// Storage-layer failure. Details go to the server log, not the caller.
    Internal(anyhow::Error),
}

impl IntakeError {
    /// Machine-readable kind, mirrored into API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "validation",
            IntakeError::ProductNotFound { .. } => "not_found",
            IntakeError::InsufficientStock { .. } => "insufficient_stock",
            IntakeError::Internal(_) => "internal",
        }
    }
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::Validation(v) => write!(f, "validation failed: {v}"),
            IntakeError::ProductNotFound { product_id } => {
                write!(f, "product not found or inactive: {product_id}")
            }
            IntakeError::InsufficientStock {
                product_name,
                requested,
                available,
                ..
            } => write!(
                f,
                "insufficient stock for {product_name}: requested {requested}, available {available}"
            ),
            IntakeError::Internal(_) => write!(f, "internal error"),
        }
    }
}

impl From<ValidationError> for IntakeError {
    fn from(err: ValidationError) -> Self {
        IntakeError::Validation(err)
    }
}

impl std::error::Error for IntakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IntakeError::Validation(v) => Some(v),
            IntakeError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
