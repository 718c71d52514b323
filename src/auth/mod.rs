#[cfg(feature = "hs256")]
pub mod jwt;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::error::{IssueError, Result};
use crate::secret::SecretKey;

/// Authority granted to every issued token.
pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

/// JWT claims presented to the transcript service.
///
/// Serialized in field order: `sub`, `name`, `auth`, `iat`. There is no `exp`,
/// so a token stays valid for as long as its secret does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimSet {
    /// Subject (calling service identity)
    sub: String,
    /// Display name
    name: String,
    /// Granted authority, always `ROLE_ADMIN`
    auth: &'static str,
    /// Issued at (Unix timestamp)
    iat: i64,
}

impl ClaimSet {
    pub fn new(sub: impl Into<String>, name: impl Into<String>, iat: i64) -> Self {
        Self {
            sub: sub.into(),
            name: name.into(),
            auth: ADMIN_AUTHORITY,
            iat,
        }
    }

    pub fn sub(&self) -> &str {
        &self.sub
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auth(&self) -> &str {
        self.auth
    }

    pub fn iat(&self) -> i64 {
        self.iat
    }
}

/// Build the claim set for a token issued now.
pub fn build_claims(sub: &str, name: &str) -> ClaimSet {
    ClaimSet::new(sub, name, Utc::now().timestamp())
}

/// Signing capability, injected so the issuer works without a concrete backend.
pub trait Signer {
    /// JWS `alg` value this signer produces.
    fn algorithm(&self) -> &'static str;

    fn sign(&self, claims: &ClaimSet, key: &SecretKey) -> Result<String>;
}

/// Sign `claims` with `key`, failing cleanly when no signer is present.
pub fn sign(signer: Option<&dyn Signer>, claims: &ClaimSet, key: &SecretKey) -> Result<String> {
    let signer = signer.ok_or(IssueError::DependencyMissing)?;

    if key.is_empty() {
        return Err(IssueError::Signing("secret key is empty".to_string()));
    }

    let token = signer.sign(claims, key)?;
    debug!(alg = signer.algorithm(), sub = claims.sub(), iat = claims.iat(), "signed token");
    Ok(token)
}

/// Signer compiled into this build, if any.
#[cfg(feature = "hs256")]
pub fn default_signer() -> Option<Box<dyn Signer>> {
    Some(Box::new(jwt::Hs256Signer))
}

#[cfg(not(feature = "hs256"))]
pub fn default_signer() -> Option<Box<dyn Signer>> {
    None
}
