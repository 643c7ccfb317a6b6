//! Cukee CLI - a terminal front-end for the Cukee curation service.
//!
//! Signs in against the Cukee backend, keeps each session in the OS keychain,
//! and lists tickets, exhibitions, console usage, and admin tokens. Expired
//! sessions are refreshed transparently by the core client.

mod navigator;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use cukee_core::{
    ApiClient, ApiError, AuthFailureAction, ClientConfig, Config, CredentialStore,
    KeyringCredentialStore, MemoryCredentialStore,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use navigator::TerminalNavigator;

const USAGE: &str = "\
Usage: cukee [--json] <command> [args]

Commands:
  login [email]              Sign in (password is prompted)
  logout                     Sign out and forget the session
  refresh                    Renew the session now
  me                         Show the signed-in user
  status                     User, tickets, and exhibitions at a glance
  tickets                    List curation tickets
  ticket <code>              Show one ticket
  exhibitions [page] [limit] List exhibitions

  console login              Sign in with a console token (prompted)
  console logout
  console keys               List your API keys
  console usage              Requests over the last 24 hours
  console billing            Charges over the last 30 days

  admin login                Sign in with the admin token (prompted)
  admin logout
  admin tokens               List console tokens
  admin create-token [name] [days]
  admin revoke-token <id>
  admin keys                 List API keys
  admin create-key <owner-token-id> [name]
  admin revoke-key <id>

Environment:
  CUKEE_API_BASE_URL         Backend base URL
  CUKEE_USE_MOCK=true        Answer from canned data, no network
  CUKEE_CREDENTIAL_MODE      cookie (default) or bearer
  RUST_LOG                   Log filter (default: warn)";

/// Which session cookie a client authenticates with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    User,
    Console,
    Admin,
}

impl Scope {
    fn client_config(self, config: ClientConfig) -> ClientConfig {
        match self {
            Scope::User => config,
            Scope::Console => config.for_console(),
            Scope::Admin => config.for_admin(),
        }
    }

    fn login_command(self) -> &'static str {
        match self {
            Scope::User => "cukee login",
            Scope::Console => "cukee console login",
            Scope::Admin => "cukee admin login",
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let json = match args.iter().position(|a| a == "--json") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };

    let Some(command) = args.first().cloned() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };
    if command == "help" || command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(());
    }

    let (scope, action, rest) = split_command(&args);
    let mut config = Config::load()?;
    let client = build_client(&config, scope, action)?;
    info!(command = %command, action = %action, base_url = %client.config().base_url, "cukee starting");

    let result = match scope {
        Scope::User => run(&client, &mut config, action, rest, json).await,
        Scope::Console => run_console(&client, action, json).await,
        Scope::Admin => run_admin(&client, action, rest, json).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<ApiError>() {
            // The navigator already told the user to log in again
            Some(api_err) if api_err.is_auth() => std::process::exit(2),
            Some(api_err) => {
                let message = api_err.detail().unwrap_or_else(|| api_err.to_string());
                eprintln!("Error: {}", message);
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

/// `console usage` -> (Console, "usage", []); `ticket x` -> (User, "ticket", ["x"])
fn split_command(args: &[String]) -> (Scope, &str, &[String]) {
    let scope = match args.first().map(String::as_str) {
        Some("console") => Scope::Console,
        Some("admin") => Scope::Admin,
        _ => Scope::User,
    };
    let skip = if scope == Scope::User { 0 } else { 1 };
    let action = args.get(skip).map(String::as_str).unwrap_or("");
    let rest = args.get(skip + 1..).unwrap_or(&[]);
    (scope, action, rest)
}

fn build_client(config: &Config, scope: Scope, action: &str) -> Result<ApiClient> {
    let client_config = scope.client_config(config.client_config()?);

    let store: Arc<dyn CredentialStore> = if client_config.mock_mode {
        Arc::new(MemoryCredentialStore::new())
    } else {
        let domain = client_config
            .domain()
            .ok_or_else(|| anyhow::anyhow!("Base URL must be absolute: {}", client_config.base_url))?;
        Arc::new(KeyringCredentialStore::new(&domain, &client_config.cookie_name)?)
    };

    let navigator = Arc::new(TerminalNavigator::new(action, scope.login_command()));
    let client = ApiClient::new(client_config, store)?
        .with_auth_failure_action(AuthFailureAction::RedirectToLogin(navigator));
    Ok(client)
}

async fn run(client: &ApiClient, config: &mut Config, command: &str, args: &[String], json: bool) -> Result<()> {
    match command {
        "login" => login(client, config, args.first().map(String::as_str)).await,
        "logout" => logout(client.logout().await),
        "refresh" => {
            client.refresh().await?;
            println!("Session renewed.");
            Ok(())
        }
        "me" => {
            let user = client.fetch_me().await?;
            if json {
                return print_json(&user);
            }
            println!("{} <{}> (id {})", user.nickname, user.email, user.user_id);
            Ok(())
        }
        "status" => status(client).await,
        "tickets" => {
            let tickets = client.fetch_tickets().await?;
            if json {
                return print_json(&tickets);
            }
            for ticket in &tickets.data {
                println!(
                    "{:>4}  {:<20}  {:<24}  {}",
                    ticket.id,
                    ticket.ticket_code.as_deref().unwrap_or("-"),
                    ticket.title,
                    ticket.tags.join(", ")
                );
            }
            println!("{} tickets", tickets.total);
            Ok(())
        }
        "ticket" => {
            let code = args.first().context("Usage: cukee ticket <code>")?;
            let ticket = client.fetch_ticket_detail(code).await?;
            if json {
                return print_json(&ticket);
            }
            println!("{} (curated by {})", ticket.title, ticket.curator_name);
            if let Some(ref message) = ticket.curator_message {
                println!("  \"{}\"", message);
            }
            if !ticket.tags.is_empty() {
                println!("  tags: {}", ticket.tags.join(", "));
            }
            Ok(())
        }
        "exhibitions" => {
            let page = parse_arg(args.first(), "page")?;
            let limit = parse_arg(args.get(1), "limit")?;
            let exhibitions = client.fetch_exhibitions(page, limit).await?;
            if json {
                return print_json(&exhibitions);
            }
            for exhibition in &exhibitions.data {
                println!(
                    "{:>4}  {:<24}  by {:<16}  {} likes",
                    exhibition.id, exhibition.title, exhibition.curator, exhibition.likes
                );
            }
            println!(
                "page {} ({} per page, {} total)",
                exhibitions.page, exhibitions.limit, exhibitions.total
            );
            Ok(())
        }
        other => unknown_command(other),
    }
}

async fn run_console(client: &ApiClient, command: &str, json: bool) -> Result<()> {
    match command {
        "login" => {
            let token = rpassword::prompt_password("Console token: ").context("Failed to read token")?;
            client
                .console_login(token.trim())
                .await
                .map_err(|e| rejected(e, "Invalid console token"))?;
            println!("Signed in to the console.");
            Ok(())
        }
        "logout" => logout(client.console_logout().await),
        "keys" => {
            let keys = client.fetch_console_keys().await?;
            if json {
                return print_json(&keys);
            }
            for key in &keys {
                println!("{:>4}  {:<28}  {}  {}", key.id, key.display_name(), key.key_preview, key.created_at);
            }
            Ok(())
        }
        "usage" => {
            let usage = client.fetch_usage_summary().await?;
            if json {
                return print_json(&usage);
            }
            println!("Requests (24h): {}", usage.total_requests);
            println!("Success rate:   {:.2}%", usage.success_rate);
            println!("Avg latency:    {:.1} ms", usage.avg_latency_ms);
            for endpoint in &usage.top_endpoints {
                println!(
                    "  {:<6} {:<28} {:>4}  {}",
                    endpoint.method, endpoint.endpoint, endpoint.status, endpoint.count
                );
            }
            Ok(())
        }
        "billing" => {
            let billing = client.fetch_billing_summary().await?;
            if json {
                return print_json(&billing);
            }
            println!("Last 30 days: {:.0}", billing.total_30d);
            for record in &billing.history {
                println!("  {}  {:>10.0}  {}", record.date, record.amount, record.status);
            }
            println!("Next billing: {}", billing.next_billing_date);
            Ok(())
        }
        other => unknown_command(&format!("console {}", other)),
    }
}

async fn run_admin(client: &ApiClient, command: &str, args: &[String], json: bool) -> Result<()> {
    match command {
        "login" => {
            let token = rpassword::prompt_password("Admin token: ").context("Failed to read token")?;
            client
                .admin_login(token.trim())
                .await
                .map_err(|e| rejected(e, "Invalid admin token"))?;
            println!("Signed in as admin.");
            Ok(())
        }
        "logout" => logout(client.admin_logout().await),
        "tokens" => {
            let tokens = client.fetch_console_tokens().await?;
            if json {
                return print_json(&tokens);
            }
            for token in &tokens {
                println!(
                    "{:>4}  {:<28}  {}  {}{}",
                    token.id,
                    token.display_name(),
                    token.token_preview,
                    token.created_at,
                    if token.is_revoked { "  (revoked)" } else { "" }
                );
            }
            Ok(())
        }
        "create-token" => {
            let days = parse_arg(args.get(1), "days")?;
            let created = client
                .create_console_token(args.first().map(String::as_str), days)
                .await?;
            if json {
                return print_json(&created);
            }
            println!("Console token {} created. These are shown only once:", created.id);
            println!("  token:   {}", created.token);
            println!("  api key: {}", created.api_key);
            Ok(())
        }
        "revoke-token" => {
            let id = parse_id(args.first(), "token id")?;
            client.revoke_console_token(id).await?;
            println!("Console token {} revoked.", id);
            Ok(())
        }
        "keys" => {
            let keys = client.fetch_api_keys().await?;
            if json {
                return print_json(&keys);
            }
            for key in &keys {
                println!(
                    "{:>4}  owner {:>4}  {:<24}  {}{}",
                    key.id,
                    key.owner_token_id,
                    key.display_name(),
                    key.key_preview,
                    if key.is_revoked { "  (revoked)" } else { "" }
                );
            }
            Ok(())
        }
        "create-key" => {
            let owner = parse_id(args.first(), "owner token id")?;
            let created = client
                .create_api_key(owner, args.get(1).map(String::as_str))
                .await?;
            if json {
                return print_json(&created);
            }
            println!("API key {} created (shown only once): {}", created.id, created.key);
            Ok(())
        }
        "revoke-key" => {
            let id = parse_id(args.first(), "key id")?;
            client.revoke_api_key(id).await?;
            println!("API key {} revoked.", id);
            Ok(())
        }
        other => unknown_command(&format!("admin {}", other)),
    }
}

fn unknown_command(command: &str) -> Result<()> {
    eprintln!("Unknown command: {}\n\n{}", command.trim(), USAGE);
    std::process::exit(64);
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<&str>) -> Result<()> {
    let email = match email.map(str::to_string).or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let user = client
        .login(&email, &password)
        .await
        .map_err(|e| rejected(e, "Invalid email or password"))?;
    println!("Signed in as {} <{}>", user.nickname, user.email);

    config.last_email = Some(email);
    config.save()?;
    Ok(())
}

/// The local credential is gone either way; an expired session counts as signed out.
fn logout<T>(result: Result<T, ApiError>) -> Result<()> {
    match result {
        Ok(_) => {}
        Err(e) if e.is_unauthorized() => info!("Session was already expired"),
        Err(e) => return Err(e.into()),
    }
    println!("Signed out.");
    Ok(())
}

/// A 401 from a sign-in call means the credential itself was rejected
fn rejected(err: ApiError, message: &str) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::anyhow!("{}", message)
    } else {
        err.into()
    }
}

/// Fetch user, tickets, and exhibitions concurrently
async fn status(client: &ApiClient) -> Result<()> {
    let (user, tickets, exhibitions) = futures::future::join3(
        client.fetch_me(),
        client.fetch_tickets(),
        client.fetch_exhibitions(None, Some(1)),
    )
    .await;

    let user = user?;
    println!("User:        {} <{}>", user.nickname, user.email);
    match tickets {
        Ok(tickets) => println!("Tickets:     {}", tickets.total),
        Err(e) => println!("Tickets:     unavailable ({})", e),
    }
    match exhibitions {
        Ok(exhibitions) => println!("Exhibitions: {}", exhibitions.total),
        Err(e) => println!("Exhibitions: unavailable ({})", e),
    }
    if let Some(minutes) = client
        .session()
        .credential()?
        .and_then(|c| c.minutes_until_expiry())
    {
        println!("Session:     expires in {} min", minutes);
    }
    Ok(())
}

fn parse_arg(arg: Option<&String>, name: &str) -> Result<Option<u32>> {
    arg.map(|s| s.parse::<u32>().with_context(|| format!("Invalid {}: {}", name, s)))
        .transpose()
}

fn parse_id(arg: Option<&String>, name: &str) -> Result<i64> {
    let raw = arg.with_context(|| format!("Missing {}", name))?;
    raw.parse::<i64>()
        .with_context(|| format!("Invalid {}: {}", name, raw))
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;

    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} is required", label.trim_end_matches(": "));
    }
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
