use std::env;

/// Environment variable holding the shared base64 secret.
pub const SECRET_ENV_VAR: &str = "ONCOKB_TRANSCRIPT_JWT_BASE64_SECRET";

pub const DEFAULT_SUBJECT: &str = "oncokb-service";
pub const DEFAULT_NAME: &str = "OncoKB";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    // Signing Settings
    pub secret_b64: Option<String>,

    // Logging Settings
    pub log_filter: String,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        Settings {
            secret_b64: get_env_opt(SECRET_ENV_VAR),
            log_filter: get_env("RUST_LOG", DEFAULT_LOG_FILTER),
        }
    }

    #[cfg(test)]
    pub fn with_secret(secret_b64: impl Into<String>) -> Self {
        Settings {
            secret_b64: non_blank(secret_b64.into()),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(non_blank)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
