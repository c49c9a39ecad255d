//! Bearer claims codec.
//!
//! The token body is URL-safe base64 over the canonical JSON of [`Claims`].
//! Issuance, signing and signature verification are the authentication
//! service's concern and stay out of scope here; this module only fixes the
//! shape of the payload the permission evaluator consumes.
//! The daemon sits behind that service and trusts the decoded claim set for
//! the lifetime of the token.

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::Claims;

/// Encode claims into a bearer token body.
pub fn encode_token(claims: &Claims) -> Result<String> {
    let json = serde_json::to_vec(claims).context("claims serialize failed")?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a bearer token body back into claims.
///
/// Any structural failure (bad base64, bad JSON, missing fields) is reported
/// as a plain error; the caller maps it to an unauthenticated response.
pub fn decode_token(token: &str) -> Result<Claims> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.trim())
        .context("token is not valid base64")?;
    let claims: Claims =
        serde_json::from_slice(&raw).context("token payload is not a valid claim set")?;
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perm;
    use uuid::Uuid;

    #[test]
    fn encode_decode_round_trip() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "ana",
            vec!["manager".to_string()],
            [perm::VIEW_ORDERS.to_string(), perm::EDIT_ORDERS.to_string()],
        );
        let token = encode_token(&claims).unwrap();
        let back = decode_token(&token).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn garbage_token_fails_to_decode() {
        assert!(decode_token("not-base64!!!").is_err());
        // Valid base64 but not a claim set.
        let token = URL_SAFE_NO_PAD.encode(b"{\"nope\":1}");
        assert!(decode_token(&token).is_err());
    }

    #[test]
    fn token_is_url_safe() {
        let claims = Claims::new(Uuid::new_v4(), "a?b/c", vec![], []);
        let token = encode_token(&claims).unwrap();
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }
}
