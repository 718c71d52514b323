use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::auth::{self, Signer};
use crate::config::{Settings, DEFAULT_NAME, DEFAULT_SUBJECT};
use crate::error::{IssueError, Result};
use crate::secret;

const STDOUT_NAME: &str = "<stdout>";
const STDERR_NAME: &str = "<stderr>";

/// One invocation's worth of inputs.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub generate_secret: bool,
    pub out: Option<PathBuf>,
    pub sub: String,
    pub name: String,
}

impl Default for IssueRequest {
    fn default() -> Self {
        Self {
            generate_secret: false,
            out: None,
            sub: DEFAULT_SUBJECT.to_string(),
            name: DEFAULT_NAME.to_string(),
        }
    }
}

/// Resolve the secret, build claims, sign, and deliver.
///
/// Nothing is written to `stdout` unless a complete token was produced.
/// A generated secret is disclosed on `diag` before signing, so it is not lost
/// if a later step fails.
pub fn issue<O: Write, E: Write>(
    request: &IssueRequest,
    settings: &Settings,
    signer: Option<&dyn Signer>,
    stdout: &mut O,
    diag: &mut E,
) -> Result<String> {
    let resolved =
        secret::resolve_secret(request.generate_secret, settings.secret_b64.as_deref())?;
    resolved
        .disclose(diag)
        .map_err(|e| io_error(STDERR_NAME, e))?;

    let claims = auth::build_claims(&request.sub, &request.name);
    let token = auth::sign(signer, &claims, &resolved.key)?;

    deliver(&token, request.out.as_deref(), stdout, diag)?;
    Ok(token)
}

/// Emit the token either to `out` or to `stdout`.
///
/// The file holds exactly the token with no trailing newline. On stdout the
/// token is the only line written.
pub fn deliver<O: Write, E: Write>(
    token: &str,
    out: Option<&Path>,
    stdout: &mut O,
    diag: &mut E,
) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, token).map_err(|e| io_error(path, e))?;
            info!(path = %path.display(), "token written");
            writeln!(diag, "Token written to {}", path.display())
                .map_err(|e| io_error(STDERR_NAME, e))?;
        }
        None => {
            writeln!(stdout, "{}", token)
                .and_then(|_| stdout.flush())
                .map_err(|e| io_error(STDOUT_NAME, e))?;
            debug!("token written to stdout");
        }
    }
    Ok(())
}

fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> IssueError {
    IssueError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClaimSet;
    use crate::secret::SecretKey;

    struct StaticSigner;

    impl Signer for StaticSigner {
        fn algorithm(&self) -> &'static str {
            "none"
        }

        fn sign(&self, claims: &ClaimSet, key: &SecretKey) -> Result<String> {
            Ok(format!("hdr.{}-{}.sig{}", claims.sub(), claims.name(), key.len()))
        }
    }

    fn run(
        request: &IssueRequest,
        settings: &Settings,
        signer: Option<&dyn Signer>,
    ) -> (Result<String>, String, String) {
        let mut stdout = Vec::new();
        let mut diag = Vec::new();
        let result = issue(request, settings, signer, &mut stdout, &mut diag);
        (
            result,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(diag).unwrap(),
        )
    }

    #[test]
    fn test_issue_to_stdout() {
        let settings = Settings::with_secret("c2VjcmV0LWtleQ==");
        let (result, stdout, diag) =
            run(&IssueRequest::default(), &settings, Some(&StaticSigner as &dyn Signer));

        let token = result.unwrap();
        assert_eq!(token, "hdr.oncokb-service-OncoKB.sig10");
        assert_eq!(stdout, format!("{}\n", token));
        assert!(diag.is_empty());
    }

    #[test]
    fn test_issue_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        let request = IssueRequest {
            out: Some(path.clone()),
            ..IssueRequest::default()
        };
        let settings = Settings::with_secret("c2VjcmV0LWtleQ==");

        let (result, stdout, diag) = run(&request, &settings, Some(&StaticSigner as &dyn Signer));

        let token = result.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), token);
        assert!(stdout.is_empty());
        assert_eq!(diag, format!("Token written to {}\n", path.display()));
    }

    #[test]
    fn test_issue_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        fs::write(&path, "a much longer stale token that must disappear").unwrap();

        let request = IssueRequest {
            out: Some(path.clone()),
            ..IssueRequest::default()
        };
        let settings = Settings::with_secret("c2VjcmV0LWtleQ==");
        let (result, _, _) = run(&request, &settings, Some(&StaticSigner as &dyn Signer));

        assert_eq!(fs::read_to_string(&path).unwrap(), result.unwrap());
    }

    #[test]
    fn test_issue_generated_secret_disclosed_with_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        let request = IssueRequest {
            generate_secret: true,
            out: Some(path.clone()),
            ..IssueRequest::default()
        };

        let (result, stdout, diag) =
            run(&request, &Settings::default(), Some(&StaticSigner as &dyn Signer));

        assert!(result.unwrap().ends_with("sig32"));
        assert!(stdout.is_empty());
        assert!(diag.starts_with("Generated base64 secret"));
        assert!(diag.ends_with(&format!("Token written to {}\n", path.display())));
    }

    #[test]
    fn test_issue_missing_secret() {
        let (result, stdout, _) = run(
            &IssueRequest::default(),
            &Settings::default(),
            Some(&StaticSigner as &dyn Signer),
        );

        assert!(matches!(result, Err(IssueError::Configuration)));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_issue_invalid_secret() {
        let settings = Settings::with_secret("not-base64!!");
        let (result, stdout, _) = run(
            &IssueRequest::default(),
            &settings,
            Some(&StaticSigner as &dyn Signer),
        );

        assert!(matches!(result, Err(IssueError::Encoding(_))));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_issue_without_signer() {
        let settings = Settings::with_secret("c2VjcmV0LWtleQ==");
        let (result, stdout, _) = run(&IssueRequest::default(), &settings, None);

        assert!(matches!(result, Err(IssueError::DependencyMissing)));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_issue_without_signer_still_discloses_generated_secret() {
        let request = IssueRequest {
            generate_secret: true,
            ..IssueRequest::default()
        };
        let (result, stdout, diag) = run(&request, &Settings::default(), None);

        assert!(matches!(result, Err(IssueError::DependencyMissing)));
        assert!(stdout.is_empty());
        assert!(diag.starts_with("Generated base64 secret"));
    }

    #[test]
    fn test_deliver_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("token.txt");
        let mut stdout = Vec::new();
        let mut diag = Vec::new();

        let err = deliver("a.b.c", Some(&path), &mut stdout, &mut diag).unwrap_err();

        assert!(matches!(err, IssueError::Io { .. }));
        assert!(stdout.is_empty());
        assert!(diag.is_empty());
    }

    #[cfg(feature = "hs256")]
    #[test]
    fn test_issue_same_second_is_byte_identical() {
        use crate::auth::jwt::Hs256Signer;

        let settings = Settings::with_secret("MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=");
        let signer = Hs256Signer;

        // Retry across a second boundary; iat is the only varying input
        for _ in 0..3 {
            let (first, _, _) = run(&IssueRequest::default(), &settings, Some(&signer as &dyn Signer));
            let (second, _, _) = run(&IssueRequest::default(), &settings, Some(&signer as &dyn Signer));
            let (first, second) = (first.unwrap(), second.unwrap());
            if first == second {
                return;
            }
        }
        panic!("tokens differed on every attempt");
    }
}
