use std::fmt;
use std::io::Write;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::config::SECRET_ENV_VAR;
use crate::error::{IssueError, Result};

/// Length in bytes of a generated secret.
pub const GENERATED_SECRET_LEN: usize = 32;

// Standard alphabet, padding required, non-zero trailing bits tolerated
const SECRET_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Raw HMAC key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        SecretKey(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard padded base64, the form the transcript service expects.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

// Never print key material through Debug
impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({} bytes)", self.0.len())
    }
}

/// Key plus, when it was generated in this run, its base64 form for disclosure.
#[derive(Debug)]
pub struct ResolvedSecret {
    pub key: SecretKey,
    pub generated: Option<String>,
}

impl ResolvedSecret {
    /// Print a freshly generated secret to the diagnostic channel.
    ///
    /// No-op for secrets that came from the environment.
    pub fn disclose<W: Write>(&self, diag: &mut W) -> std::io::Result<()> {
        if let Some(encoded) = &self.generated {
            writeln!(
                diag,
                "Generated base64 secret (set this in oncokb-transcript and in {}):",
                SECRET_ENV_VAR
            )?;
            writeln!(diag, "{}", encoded)?;
            writeln!(diag)?;
        }
        Ok(())
    }
}

/// Fresh 32-byte key from the OS CSPRNG.
pub fn generate_secret() -> SecretKey {
    let mut bytes = vec![0u8; GENERATED_SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    SecretKey(bytes)
}

/// Decode a standard, padded base64 secret.
///
/// All ASCII whitespace is dropped first, so line-wrapped output from
/// `openssl rand -base64` or a vault paste decodes as one value.
pub fn decode_secret(encoded: &str) -> Result<SecretKey> {
    let compact: String = encoded.split_ascii_whitespace().collect();
    let bytes = SECRET_ENGINE.decode(compact)?;
    Ok(SecretKey(bytes))
}

/// Pick the signing key for this run.
///
/// `generate` wins over `env_value`; the environment value is not even
/// validated when a new secret is requested.
pub fn resolve_secret(generate: bool, env_value: Option<&str>) -> Result<ResolvedSecret> {
    if generate {
        let key = generate_secret();
        let encoded = key.to_base64();
        debug!(bytes = key.len(), "generated new secret");
        return Ok(ResolvedSecret {
            key,
            generated: Some(encoded),
        });
    }

    let encoded = env_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(IssueError::Configuration)?;

    let key = decode_secret(encoded)?;
    debug!(bytes = key.len(), "decoded secret from {}", SECRET_ENV_VAR);

    Ok(ResolvedSecret {
        key,
        generated: None,
    })
}
