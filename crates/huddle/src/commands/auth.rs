//! Auth command - interactive OAuth bootstrap.
//!
//! Seeds a credential file from a client secret JSON, walks the user through
//! the authorization-code grant, and writes the resulting tokens.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use huddle_oauth::{CredentialRecord, OAuthConfig, SessionManager, TokenStore};
use serde::Deserialize;

use crate::{LogFormat, init_tracing};

/// Host probed before starting the flow.
const LOGIN_HOST: &str = "https://api.login.yahoo.com";

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit code for an unreadable or incomplete client secret file.
const EXIT_BAD_SECRET: u8 = 2;

/// Exit code for TLS verification failures.
const EXIT_TLS: u8 = 1;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Client secret JSON with consumer_key and consumer_secret
    #[arg(long, default_value = "client_secret.json")]
    pub client_secret: PathBuf,

    /// Credential file to write
    #[arg(long, default_value = "oauth2.json")]
    pub output: PathBuf,

    /// Skip the HTTPS preflight against the login host
    #[arg(long)]
    pub skip_tls_check: bool,

    /// Redirect URI registered for the app
    #[arg(long, default_value = "oob")]
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    #[serde(default)]
    consumer_key: Option<String>,
    #[serde(default)]
    consumer_secret: Option<String>,
}

/// Read and validate the client secret file.
fn load_client_secret(path: &Path) -> Result<(String, String)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read client secret {}", path.display()))?;
    let secret: ClientSecret =
        serde_json::from_str(&content).context("failed to parse client secret JSON")?;

    match (secret.consumer_key, secret.consumer_secret) {
        (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Ok((key, secret)),
        _ => anyhow::bail!("client secret JSON must contain keys: consumer_key, consumer_secret"),
    }
}

/// Whether an error chain bottoms out in certificate verification.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source: Option<&dyn std::error::Error> = Some(error);
    while let Some(err) = source {
        let message = err.to_string().to_ascii_lowercase();
        if message.contains("certificate") || message.contains("tls") || message.contains("ssl")
        {
            return true;
        }
        source = err.source();
    }
    false
}

/// GET the login host. Any HTTP status is fine; only TLS failures count.
async fn tls_preflight(url: &str) -> std::result::Result<(), reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(PREFLIGHT_TIMEOUT)
        .build()?;
    match client.get(url).send().await {
        Ok(_) => Ok(()),
        Err(e) if is_tls_error(&e) => Err(e),
        Err(e) => {
            tracing::debug!(error = %e, "TLS preflight network error ignored");
            Ok(())
        }
    }
}

/// Run the auth command.
pub async fn run(args: AuthArgs) -> Result<ExitCode> {
    init_tracing("warn", LogFormat::Pretty);

    let (consumer_key, consumer_secret) = match load_client_secret(&args.client_secret) {
        Ok(creds) => creds,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(ExitCode::from(EXIT_BAD_SECRET));
        }
    };

    for var in ["SSL_CERT_FILE", "SSL_CERT_DIR"] {
        if let Ok(value) = std::env::var(var) {
            println!("{}={}", var, value);
        }
    }

    if !args.skip_tls_check {
        if let Err(e) = tls_preflight(LOGIN_HOST).await {
            eprintln!("TLS verification failed talking to Yahoo.");
            eprintln!("If your network inspects TLS, point SSL_CERT_FILE at a bundle");
            eprintln!("that includes your CA and rerun.");
            eprintln!("details: {}", e);
            return Ok(ExitCode::from(EXIT_TLS));
        }
    }

    let store = TokenStore::new(args.output.clone());
    let mut seed = CredentialRecord::with_consumer(consumer_key, consumer_secret);
    seed.redirect_uri = Some(args.redirect_uri.clone());
    if let Err(e) = store.save(&seed) {
        eprintln!("error: failed to write seed output file: {}", e);
        return Ok(ExitCode::from(EXIT_BAD_SECRET));
    }

    let session = SessionManager::new(store, OAuthConfig::yahoo());
    let url = session.authorization_url(None, Some(&args.redirect_uri))?;

    println!("Yahoo OAuth Authorization");
    println!("=========================");
    println!();
    println!("Open this URL in your browser and grant access:");
    println!();
    println!("  {}", url.authorization_url);
    println!();
    print!("Paste the code shown by Yahoo: ");
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin().lock().read_line(&mut code)?;
    let code = code.trim();
    if code.is_empty() {
        eprintln!("No code entered, aborting.");
        return Ok(ExitCode::FAILURE);
    }

    let outcome = session
        .exchange_code(code, Some(&args.redirect_uri), None)
        .await
        .context("token exchange failed")?;

    if let Some(guid) = &outcome.guid {
        println!("Authorized as {}", guid);
    }
    println!("Saved tokens to {}", args.output.display());
    Ok(ExitCode::SUCCESS)
}
