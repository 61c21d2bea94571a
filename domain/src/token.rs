//! Stateless signing and verification of compact, URL-safe bearer tokens.
//!
//! The wire format is JWT-compatible (`base64url(header).base64url(payload).
//! base64url(hmac-sha256)`) with HS256 as the only supported algorithm. Tokens
//! are created at login, never stored server-side, and expire purely by
//! timestamp comparison at verification time.

use crate::error::{auth_error, config_error, AuthErrorKind, Error};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub use store::users::Role;

type HmacSha256 = Hmac<Sha256>;

/// The decoded payload of a token: identity, role attributes, and expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub role: Role,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Signs `claims` with the shared `secret`, stamping `exp = now + ttl_seconds`.
pub fn sign(claims: &Claims, secret: &str, ttl_seconds: i64) -> Result<String, Error> {
    let mut claims = claims.clone();
    claims.exp = Some(Utc::now().timestamp() + ttl_seconds);

    let header_enc = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&HEADER)?);
    let payload_enc = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);

    let signature = seal(&header_enc, &payload_enc, secret)?;
    Ok(format!("{header_enc}.{payload_enc}.{signature}"))
}

/// Verifies `token` against the shared `secret` and returns its claims.
///
/// An optional case-insensitive `Bearer ` prefix and surrounding whitespace
/// are tolerated. Checks run in order: segment shape, signature, payload
/// decode, expiry (strict `<`, so `exp == now` is still valid), required
/// claims (`userId`, `role`, `email`).
pub fn verify(token: &str, secret: &str) -> Result<Claims, Error> {
    let raw = strip_bearer(token);
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(auth_error(AuthErrorKind::MalformedToken));
    }

    let provided_sig = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| auth_error(AuthErrorKind::BadSignature))?;

    // verify_slice is a constant-time comparison; the naive string equality
    // the wire format allows would leak a timing side channel.
    let mut mac = mac_for(secret)?;
    mac.update(parts[0].as_bytes());
    mac.update(b".");
    mac.update(parts[1].as_bytes());
    mac.verify_slice(&provided_sig)
        .map_err(|_| auth_error(AuthErrorKind::BadSignature))?;

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| auth_error(AuthErrorKind::MalformedToken))?;
    let payload: serde_json::Value =
        serde_json::from_slice(&payload).map_err(|_| auth_error(AuthErrorKind::MalformedToken))?;

    if let Some(exp) = payload.get("exp").and_then(serde_json::Value::as_i64) {
        if exp < Utc::now().timestamp() {
            return Err(auth_error(AuthErrorKind::Expired));
        }
    }

    for claim in ["userId", "role", "email"] {
        let present = payload
            .get(claim)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|value| !value.is_empty());
        if !present {
            return Err(auth_error(AuthErrorKind::MissingClaims));
        }
    }

    serde_json::from_value(payload).map_err(|_| auth_error(AuthErrorKind::MalformedToken))
}

fn seal(header_enc: &str, payload_enc: &str, secret: &str) -> Result<String, Error> {
    let mut mac = mac_for(secret)?;
    mac.update(header_enc.as_bytes());
    mac.update(b".");
    mac.update(payload_enc.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

fn mac_for(secret: &str) -> Result<HmacSha256, Error> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| config_error("signing secret unusable as an HMAC key"))
}

fn strip_bearer(token: &str) -> &str {
    let token = token.trim();
    match token.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => token[7..].trim_start(),
        _ => token,
    }
}
