//! Order state machine.
//!
//! A persisted order carries three independent boolean flags (`paid`,
//! `ready`, `delivered`) plus a hard-delete terminal state:
//!
//! ```text
//!   created ──► { paid, ready, delivered } each togglable, any order
//!      │
//!      └──► deleted (hard removal, cascades to line items)
//! ```
//!
//! No sequencing is enforced between the flags; `delivered` can be set
//! before `ready`. Whether an ordering rule *should* exist is an open
//! business-rule question (DESIGN.md), not something this module decides.
//!
//! Deletion does not restore previously decremented stock. It is a hard
//! scope boundary, not a compensating transaction.

use odk_schemas::{StatusFlags, StatusPatch};

/// Lifecycle tag for a persisted order. `Deleted` is terminal and is
/// realized as row removal, never as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLifecycle {
    Exists,
    Deleted,
}

impl OrderLifecycle {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderLifecycle::Deleted)
    }
}

/// Apply a partial flag update. Flags absent from the patch keep their
/// current value; supplied flags take the supplied value, in either
/// direction (flags may be cleared as well as set).
pub fn apply(flags: StatusFlags, patch: StatusPatch) -> StatusFlags {
    StatusFlags {
        paid: patch.paid.unwrap_or(flags.paid),
        ready: patch.ready.unwrap_or(flags.ready),
        delivered: patch.delivered.unwrap_or(flags.delivered),
    }
}
