//! Session token signing
//!
//! Cookie tokens are `session_id.signature` where the signature is
//! HMAC-SHA256 over the session UUID string, base64url encoded. The server
//! round-trips only the UUID; session state itself stays in the store.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Sign a session ID into a cookie token
pub fn sign(session_id: Uuid, secret: &[u8; 32]) -> String {
    let session_id = session_id.to_string();

    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(session_id.as_bytes());
    let signature = mac.finalize().into_bytes();

    format!("{}.{}", session_id, URL_SAFE_NO_PAD.encode(signature))
}

/// Verify a cookie token and extract the session ID
pub fn verify(token: &str, secret: &[u8; 32]) -> AuthResult<Uuid> {
    let Some((session_id_str, signature_b64)) = token.split_once('.') else {
        return Err(AuthError::SessionInvalid);
    };

    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(session_id_str.as_bytes());

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::SessionInvalid)?;

    mac.verify_slice(&signature)
        .map_err(|_| AuthError::SessionInvalid)?;

    session_id_str
        .parse()
        .map_err(|_| AuthError::SessionInvalid)
}
