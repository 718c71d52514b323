use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use super::{ClaimSet, Signer};
use crate::error::{IssueError, Result};
use crate::secret::SecretKey;

/// HMAC-SHA256 compact JWS signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hs256Signer;

impl Signer for Hs256Signer {
    fn algorithm(&self) -> &'static str {
        "HS256"
    }

    fn sign(&self, claims: &ClaimSet, key: &SecretKey) -> Result<String> {
        let token = encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .map_err(|e| IssueError::Signing(e.to_string()))?;

        Ok(token)
    }
}
