//! ID-token payload decoding
//!
//! Splits a compact three-segment token and base64url-decodes the payload
//! segment without verifying the signature. Verification happens on the
//! backend; this is a display/UX convenience only.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;

use crate::claims::IdClaims;

/// Decode the claims embedded in a compact ID token.
///
/// Returns `None` for anything that is not a well-formed three-segment
/// token with a JSON payload. Never panics and never surfaces an error;
/// callers treat `None` as "no identity available".
pub fn decode_id_token(token: &str) -> Option<IdClaims> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => return None,
    };

    // Providers emit unpadded base64url; tolerate padded input and
    // standard-alphabet payloads by mapping into one alphabet first.
    let normalized = payload
        .trim_end_matches('=')
        .replace('-', "+")
        .replace('_', "/");
    let bytes = STANDARD_NO_PAD.decode(&normalized).ok()?;
    serde_json::from_slice(&bytes).ok()
}
