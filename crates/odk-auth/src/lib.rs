//! Permission Evaluator.
//!
//! # Design
//!
//! A caller's capabilities are resolved **once**, at authentication time,
//! into an immutable [`Claims`] snapshot that travels with the bearer token
//! for its whole lifetime. No request path re-derives permissions from the
//! role store — a deliberate trade-off that removes a per-request DB round
//! trip and accepts a staleness window: role changes take effect on the
//! caller's next authentication, not before.
//!
//! The evaluator itself is a pure decision function over its inputs. Denial
//! is split into two distinct kinds with different remediation:
//!
//! - [`AuthError::Unauthenticated`] — caller identity missing or invalid
//!   (re-login).
//! - [`AuthError::Forbidden`] — caller is known but lacks the named
//!   permission (request elevated access).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod token;

pub use token::{decode_token, encode_token};

// ---------------------------------------------------------------------------
// Permission names
// ---------------------------------------------------------------------------

/// Canonical permission names for the order surface. The evaluator compares
/// raw strings; these constants keep call sites and seed data in agreement.
pub mod perm {
    pub const VIEW_ORDERS: &str = "view_orders";
    pub const CREATE_ORDERS: &str = "create_orders";
    pub const EDIT_ORDERS: &str = "edit_orders";
    pub const DELETE_ORDERS: &str = "delete_orders";
}

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Authorization failure. The two variants map to different HTTP statuses
/// (401 vs 403) and MUST stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Caller identity missing or invalid.
    Unauthenticated { reason: String },
    /// Caller is known but the resolved permission set lacks `required`.
    Forbidden { required: String },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated { reason } => {
                write!(f, "unauthenticated: {reason}")
            }
            AuthError::Forbidden { required } => {
                write!(f, "forbidden: missing permission {required}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Immutable capability snapshot decoded from a bearer token.
///
/// `permissions` is the full resolved permission-name set; `roles` is carried
/// for display/diagnostics only and is never consulted by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        roles: Vec<String>,
        permissions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// Pure membership check.
    pub fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Allow iff `permission` appears in the snapshot; deny with
    /// [`AuthError::Forbidden`] naming the missing permission otherwise.
    pub fn require(&self, permission: &str) -> Result<(), AuthError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                required: permission.to_string(),
            })
        }
    }

    /// Allow iff **any** of `permissions` is present. The first name in the
    /// list is reported when all are missing.
    pub fn require_any(&self, permissions: &[&str]) -> Result<(), AuthError> {
        if permissions.iter().any(|p| self.has(p)) {
            return Ok(());
        }
        Err(AuthError::Forbidden {
            required: permissions.first().unwrap_or(&"").to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
