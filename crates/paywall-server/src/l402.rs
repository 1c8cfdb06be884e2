//! L402 (formerly LSAT) tokens, challenges and proofs.
//!
//! A token binds a payment hash to one resource path:
//!
//! ```text
//! base64url(JSON {v, payment_hash, resource, iat}) "." hex(HMAC-SHA256(payload))
//! ```
//!
//! The client proves payment with `Authorization: L402 <token>:<preimage-hex>`;
//! the proof holds when the MAC verifies, the resource matches and
//! `sha256(preimage)` equals the bound payment hash.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum L402Error {
    /// The Authorization header uses the L402 scheme but cannot be parsed.
    #[error("malformed L402 credentials: {0}")]
    Malformed(&'static str),

    #[error("token signature invalid")]
    BadSignature,

    #[error("token was issued for another resource")]
    WrongResource,

    #[error("preimage does not match payment hash")]
    PreimageMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub v: u8,
    /// Hex payment hash of the invoice this token was issued with.
    pub payment_hash: String,
    pub resource: String,
    pub iat: i64,
}

/// Credentials from an `Authorization: L402 ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub preimage: [u8; 32],
}

/// HMAC-SHA256 over `body`, hex encoded.
pub fn compute_hmac(secret: &[u8], body: &[u8]) -> String {
    hex::encode(mac(secret, body).finalize().into_bytes())
}

/// Constant-time check of a hex HMAC. Invalid hex never verifies.
pub fn verify_hmac(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let expected = hex::decode(signature).unwrap_or_else(|_| vec![0u8; 32]);
    mac(secret, body).verify_slice(&expected).is_ok()
}

fn mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    mac
}

/// Constant-time byte comparison that does not leak input lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.as_slice().ct_eq(hb.as_slice()).into()
}

pub fn issue_token(secret: &[u8], payment_hash: &[u8; 32], resource: &str, iat: i64) -> String {
    let claims = TokenClaims {
        v: TOKEN_VERSION,
        payment_hash: hex::encode(payment_hash),
        resource: resource.to_string(),
        iat,
    };
    // Serializing a struct of strings and integers cannot fail.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let sig = compute_hmac(secret, payload.as_bytes());
    format!("{payload}.{sig}")
}

/// Check the token's MAC and decode its claims.
pub fn verify_token(secret: &[u8], token: &str) -> Result<TokenClaims, L402Error> {
    let (payload, sig) = token
        .rsplit_once('.')
        .ok_or(L402Error::Malformed("token has no signature"))?;
    if !verify_hmac(secret, payload.as_bytes(), sig) {
        return Err(L402Error::BadSignature);
    }
    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| L402Error::Malformed("token payload is not base64url"))?;
    let claims: TokenClaims =
        serde_json::from_slice(&json).map_err(|_| L402Error::Malformed("token payload is not JSON"))?;
    if claims.v != TOKEN_VERSION {
        return Err(L402Error::Malformed("unsupported token version"));
    }
    Ok(claims)
}

/// `WWW-Authenticate` value for a 402 response.
pub fn challenge_header(token: &str, invoice: &str) -> String {
    format!("L402 macaroon=\"{token}\", invoice=\"{invoice}\"")
}

/// Parse an Authorization header value.
///
/// `Ok(None)` means the header is not an L402/LSAT credential at all; an
/// L402/LSAT header that cannot be parsed is an error.
pub fn parse_authorization(value: &str) -> Result<Option<Credentials>, L402Error> {
    let value = value.trim();
    let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
    if !(scheme.eq_ignore_ascii_case("L402") || scheme.eq_ignore_ascii_case("LSAT")) {
        return Ok(None);
    }

    let (token, preimage_hex) = rest
        .trim()
        .split_once(':')
        .ok_or(L402Error::Malformed("expected <token>:<preimage>"))?;
    if token.is_empty() {
        return Err(L402Error::Malformed("empty token"));
    }

    let mut preimage = [0u8; 32];
    hex::decode_to_slice(preimage_hex.trim(), &mut preimage)
        .map_err(|_| L402Error::Malformed("preimage must be 32 bytes of hex"))?;

    Ok(Some(Credentials {
        token: token.to_string(),
        preimage,
    }))
}

/// Validate a proof of payment for `resource`.
pub fn verify_proof(
    secret: &[u8],
    credentials: &Credentials,
    resource: &str,
) -> Result<TokenClaims, L402Error> {
    let claims = verify_token(secret, &credentials.token)?;
    if !constant_time_eq(claims.resource.as_bytes(), resource.as_bytes()) {
        return Err(L402Error::WrongResource);
    }

    let mut expected = [0u8; 32];
    hex::decode_to_slice(&claims.payment_hash, &mut expected)
        .map_err(|_| L402Error::Malformed("payment hash is not 32 bytes of hex"))?;
    let actual = Sha256::digest(credentials.preimage);
    if !bool::from(actual.as_slice().ct_eq(&expected[..])) {
        return Err(L402Error::PreimageMismatch);
    }
    Ok(claims)
}
