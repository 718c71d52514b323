//! Error types for token issuance.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SECRET_ENV_VAR;

/// Result type alias for issuer operations.
pub type Result<T> = std::result::Result<T, IssueError>;

/// Errors that end an issuance run. None of them are retried.
#[derive(Debug, Error)]
pub enum IssueError {
    /// No secret was supplied and none was generated.
    #[error("Set {} or use --generate-secret", SECRET_ENV_VAR)]
    Configuration,

    /// The supplied secret is not valid base64.
    #[error("Invalid base64 secret: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// No signing backend is available in this build.
    #[error("No JWT signer available: rebuild with the `hs256` feature enabled")]
    DependencyMissing,

    /// The signer rejected the key or failed to produce a token.
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Writing the token to the requested file failed.
    #[error("Failed to write token to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IssueError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            IssueError::Configuration
            | IssueError::Encoding(_)
            | IssueError::DependencyMissing
            | IssueError::Signing(_)
            | IssueError::Io { .. } => 1,
        }
    }
}
