//! KnownUser CLI - run admission decisions from the command line
//!
//! Wires the admission service to an in-memory cookie jar seeded from a
//! `Cookie` header, so a request/response cycle can be replayed locally.

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{Table, Tabled};

use knownuser_core::application::admission::signature::sign_token;
use knownuser_core::application::{admission::QueueRequest, AdmissionService};
use knownuser_core::domain::{
    CancelEventConfig, Decision, QueueEventConfig, RedirectKind, RequestValidationResult,
    TokenSyntax, UnsignedToken,
};
use knownuser_core::port::{SystemTimeProvider, TimeProvider};
use knownuser_infra_cookie::{InMemoryCookieJar, StateCookieRepository};

#[derive(Parser)]
#[command(name = "knownuser")]
#[command(about = "Queue admission decisions for protected pages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Customer id assigned by the queue service
    #[arg(long, env = "KNOWNUSER_CUSTOMER_ID", global = true, default_value = "")]
    customer_id: String,

    /// Secret key shared with the queue service
    #[arg(
        long,
        env = "KNOWNUSER_SECRET_KEY",
        global = true,
        hide_env_values = true,
        default_value = ""
    )]
    secret_key: String,

    /// Print machine-readable JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a request for a queue-protected page
    Validate {
        /// Event config JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Page the visitor asked for
        #[arg(short, long, default_value = "")]
        url: String,

        /// Token appended by the queue service (queueittoken)
        #[arg(short, long)]
        token: Option<String>,

        /// Cookie request header
        #[arg(long, default_value = "")]
        cookie: String,
    },

    /// Cancel the visitor's admission for an event
    Cancel {
        /// Event config JSON file
        #[arg(short, long)]
        config: PathBuf,

        /// Page to return to after cancelling
        #[arg(short, long, default_value = "")]
        url: String,

        /// Cookie request header
        #[arg(long, default_value = "")]
        cookie: String,
    },

    /// Extend a valid admission cookie
    Extend {
        #[arg(short, long)]
        event_id: String,

        /// New validity in minutes from now
        #[arg(long)]
        validity: u32,

        #[arg(long, default_value = "")]
        cookie_domain: String,

        /// Cookie request header
        #[arg(long, default_value = "")]
        cookie: String,
    },

    /// Mint a signed token (local testing)
    SignToken {
        #[arg(short, long)]
        event_id: String,

        #[arg(short, long)]
        queue_id: String,

        /// Seconds until the token expires (negative for an expired token)
        #[arg(long, default_value = "180", allow_hyphen_values = true)]
        expires_in: i64,

        #[arg(long)]
        extendable: bool,

        /// Cookie validity override in minutes
        #[arg(long)]
        cookie_validity: Option<u32>,

        #[arg(long, value_enum, default_value = "native")]
        syntax: SyntaxArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SyntaxArg {
    Native,
    Pipe,
    Query,
}

impl From<SyntaxArg> for TokenSyntax {
    fn from(arg: SyntaxArg) -> Self {
        match arg {
            SyntaxArg::Native => TokenSyntax::NATIVE,
            SyntaxArg::Pipe => TokenSyntax::PIPE,
            SyntaxArg::Query => TokenSyntax::QUERY,
        }
    }
}

#[derive(Tabled)]
struct DecisionRow {
    action: String,
    event_id: String,
    queue_id: String,
    decision: String,
}

impl From<&RequestValidationResult> for DecisionRow {
    fn from(result: &RequestValidationResult) -> Self {
        let decision = match result.redirect_kind() {
            None => "proceed".to_string(),
            Some(RedirectKind::Queue) => "redirect: queue".to_string(),
            Some(RedirectKind::Cancel) => "redirect: cancel".to_string(),
            Some(RedirectKind::Error(rejection)) => {
                format!("redirect: error/{} ({})", rejection.error_code(), rejection)
            }
        };

        Self {
            action: result.action_type.to_string(),
            event_id: result.event_id.clone(),
            queue_id: result.queue_id.clone().unwrap_or_else(|| "-".to_string()),
            decision,
        }
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a RequestValidationResult>,
    set_cookie: Vec<String>,
}

/// Service plus the jar it writes to
struct Runtime {
    service: AdmissionService,
    jar: Arc<InMemoryCookieJar>,
}

impl Runtime {
    fn new(cookie_header: &str) -> Self {
        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let jar = Arc::new(InMemoryCookieJar::from_cookie_header(
            cookie_header,
            time_provider.clone(),
        ));
        let state_repo = Arc::new(StateCookieRepository::new(
            jar.clone(),
            time_provider.clone(),
        ));

        Self {
            service: AdmissionService::new(state_repo, time_provider),
            jar,
        }
    }

    fn print(&self, result: Option<&RequestValidationResult>, json: bool) -> Result<()> {
        let set_cookie = self.jar.set_cookie_headers()?;

        if json {
            let output = CommandOutput { result, set_cookie };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if let Some(result) = result {
            match &result.decision {
                Decision::Proceed => println!("{}", "✓ Request may proceed".green().bold()),
                Decision::Redirect(target) => {
                    println!("{}", "→ Redirect required".yellow().bold());
                    println!("  {} {}", "Location:".bold(), target.url);
                }
            }
            println!();
            println!("{}", Table::new(vec![DecisionRow::from(result)]));
        }

        if set_cookie.is_empty() {
            println!("{}", "No cookies written".dimmed());
        } else {
            println!("{}", "Set-Cookie:".cyan().bold());
            for header in set_cookie {
                println!("  {}", header);
            }
        }

        Ok(())
    }
}

fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded event config");
    Ok(config)
}

/// Unix expiry `expires_in` seconds after `now`
fn token_expiry(now: i64, expires_in: i64) -> Result<i64> {
    now.checked_add(expires_in)
        .with_context(|| format!("--expires-in {} is out of range", expires_in))
}

fn require_credentials(cli: &Cli) -> Result<()> {
    if cli.customer_id.is_empty() {
        anyhow::bail!("--customer-id (or KNOWNUSER_CUSTOMER_ID) is required");
    }
    if cli.secret_key.is_empty() {
        anyhow::bail!("--secret-key (or KNOWNUSER_SECRET_KEY) is required");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    match &cli.command {
        Commands::Validate {
            config,
            url,
            token,
            cookie,
        } => {
            require_credentials(&cli)?;
            let config: QueueEventConfig = load_config(config)?;
            config.validate()?;

            let runtime = Runtime::new(cookie);
            let result = runtime.service.validate_queue_request(QueueRequest {
                target_url: url,
                token: token.as_deref(),
                config: &config,
                customer_id: &cli.customer_id,
                secret_key: &cli.secret_key,
            })?;
            runtime.print(Some(&result), cli.json)?;
        }

        Commands::Cancel {
            config,
            url,
            cookie,
        } => {
            require_credentials(&cli)?;
            let config: CancelEventConfig = load_config(config)?;
            config.validate()?;

            let runtime = Runtime::new(cookie);
            let result = runtime.service.validate_cancel_request(
                url,
                &config,
                &cli.customer_id,
                &cli.secret_key,
            )?;
            runtime.print(Some(&result), cli.json)?;
        }

        Commands::Extend {
            event_id,
            validity,
            cookie_domain,
            cookie,
        } => {
            if cli.secret_key.is_empty() {
                anyhow::bail!("--secret-key (or KNOWNUSER_SECRET_KEY) is required");
            }

            let runtime = Runtime::new(cookie);
            runtime
                .service
                .extend_queue_cookie(event_id, *validity, cookie_domain, &cli.secret_key)?;
            runtime.print(None, cli.json)?;
        }

        Commands::SignToken {
            event_id,
            queue_id,
            expires_in,
            extendable,
            cookie_validity,
            syntax,
        } => {
            if cli.secret_key.is_empty() {
                anyhow::bail!("--secret-key (or KNOWNUSER_SECRET_KEY) is required");
            }

            let expires_at = token_expiry(SystemTimeProvider.now_secs(), *expires_in)?;
            let mut unsigned = UnsignedToken::new(event_id.as_str(), queue_id.as_str(), expires_at)
                .with_extendable_cookie(*extendable);
            if let Some(minutes) = cookie_validity {
                unsigned = unsigned.with_cookie_validity_minute(*minutes);
            }

            let token = sign_token(&unsigned, (*syntax).into(), &cli.secret_key)?;
            if cli.json {
                println!("{}", serde_json::json!({ "token": token, "expires_at": expires_at }));
            } else {
                println!("{}", token);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        assert_eq!(token_expiry(1_700_000_000, 180).unwrap(), 1_700_000_180);
        assert_eq!(token_expiry(1_700_000_000, -60).unwrap(), 1_699_999_940);
    }

    #[test]
    fn test_token_expiry_out_of_range() {
        let err = token_expiry(1_700_000_000, i64::MAX).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(token_expiry(-1_700_000_000, i64::MIN).is_err());
    }
}
