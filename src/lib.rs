// Library exports for the CLI and tests

pub mod auth;
pub mod config;
pub mod error;
pub mod issuer;
pub mod secret;

pub use error::{IssueError, Result};
