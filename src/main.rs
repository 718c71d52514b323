use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use transcript_token::auth;
use transcript_token::config::{Settings, DEFAULT_LOG_FILTER, DEFAULT_NAME, DEFAULT_SUBJECT};
use transcript_token::issuer::{self, IssueRequest};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", rustc ",
    env!("RUST_VERSION"),
    ")"
);

const AFTER_HELP: &str = "\
The token is used by the OncoKB service to authenticate to the oncokb-transcript
service, which validates it with the same base64 secret.

Environment:
  ONCOKB_TRANSCRIPT_JWT_BASE64_SECRET  base64 signing secret (ignored with --generate-secret)
  RUST_LOG                             log filter for stderr diagnostics (default: warn)

Examples:
  export ONCOKB_TRANSCRIPT_JWT_BASE64_SECRET=\"$(openssl rand -base64 32)\"
  generate-transcript-token
  generate-transcript-token --generate-secret
  generate-transcript-token --out token.txt

Then:
  - Configure oncokb-transcript with JHIPSTER_SECURITY_AUTHENTICATION_JWT_BASE64_SECRET=<secret>
  - Configure OncoKB with -Doncokb_transcript.token=<token> (or TF_VAR_oncokb_transcript_jwt_token)";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    long_version = LONG_VERSION,
    about = "Generate OncoKB Transcript JWT (HS256, auth=ROLE_ADMIN)",
    after_help = AFTER_HELP
)]
struct Args {
    /// Generate a new base64 secret and print it to stderr (store it for the transcript service and future runs)
    #[arg(long)]
    generate_secret: bool,

    /// Write the JWT token to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// JWT subject
    #[arg(long, default_value = DEFAULT_SUBJECT)]
    sub: String,

    /// JWT name claim
    #[arg(long, default_value = DEFAULT_NAME)]
    name: String,

    /// Log debug events to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Load .env file if it exists; real environment variables take precedence
    let dotenv = dotenvy::dotenv();

    let settings = Settings::from_env();

    if let Err(e) = init_tracing(&settings, args.verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env file"),
        Err(e) => debug!("no .env file loaded: {}", e),
    }

    let request = IssueRequest {
        generate_secret: args.generate_secret,
        out: args.out,
        sub: args.sub,
        name: args.name,
    };

    let signer = auth::default_signer();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut diag = stderr.lock();

    match issuer::issue(&request, &settings, signer.as_deref(), &mut out, &mut diag) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(diag, "Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Logs go to stderr only; stdout is reserved for the token.
fn init_tracing(settings: &Settings, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&settings.log_filter)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("{}", e))
}
