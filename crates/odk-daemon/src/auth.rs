//! Bearer extraction for the staff surface.
//!
//! The Authorization header carries a credential whose decoded claims hold
//! the caller's resolved permission-name list. The daemon trusts that set
//! for the token's lifetime — permission checks never re-read the role
//! store (see odk-auth for the staleness contract).

use axum::http::{header, HeaderMap};
use odk_auth::{decode_token, AuthError, Claims};

/// Pull and decode claims from the Authorization header.
///
/// Every failure here is an *unauthenticated* condition (401), never a
/// forbidden one: we either cannot identify the caller or cannot trust the
/// credential shape. Forbidden happens later, against a decoded claim set.
pub fn claims_from_headers(headers: &HeaderMap) -> Result<Claims, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthenticated {
            reason: "missing authorization header".to_string(),
        })?;

    let raw = value.to_str().map_err(|_| AuthError::Unauthenticated {
        reason: "authorization header is not valid ASCII".to_string(),
    })?;

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::Unauthenticated {
            reason: "authorization is not a bearer credential".to_string(),
        })?;

    decode_token(token).map_err(|_| AuthError::Unauthenticated {
        reason: "bearer credential failed to decode".to_string(),
    })
}
