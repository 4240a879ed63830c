//! EventPass CLI - attendance QR tokens and cached event lookups from a
//! terminal.
//!
//! Usage:
//!   eventpass token generate <event-id> <student-id>
//!   eventpass token check <token>
//!   eventpass events [--organizer <id> | --student <id>]
//!   eventpass event <event-id>
//!   eventpass checkin <event-id> <token> [--organizer <id>]
//!   eventpass cache status | cache clear

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eventpass_core::cache::CacheEntryInfo;
use eventpass_core::models::Event;
use eventpass_core::token::{self, AttendanceToken};
use eventpass_core::utils::{format_age, format_remaining, truncate_string};
use eventpass_core::{
    ApiClient, CacheLayer, CheckIn, Clock, Config, EventRepository, Fetched, FileStore,
    SystemClock,
};

/// Width of the title column in event listings
const TITLE_WIDTH: usize = 32;

const USAGE: &str = "\
Usage:
  eventpass token generate <event-id> <student-id>
  eventpass token check <token>
  eventpass events [--organizer <id> | --student <id>]
  eventpass event <event-id>
  eventpass checkin <event-id> <token> [--organizer <id>]
  eventpass cache status
  eventpass cache clear";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

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

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["token", "generate", event_id, student_id] => generate_token(event_id, student_id),
        ["token", "check", payload] => check_token(payload),
        ["events", rest @ ..] => list_events(rest).await,
        ["event", event_id] => show_event(event_id).await,
        ["checkin", event_id, payload, rest @ ..] => checkin(event_id, payload, rest).await,
        ["cache", "status"] => cache_status().await,
        ["cache", "clear"] => cache_clear().await,
        [] | ["help"] | ["--help"] | ["-h"] => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => bail!("Unrecognized command\n\n{}", USAGE),
    }
}

/// Value following `flag` in `args`, if present.
fn flag_value<'a>(args: &[&'a str], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|a| *a == flag) {
        Some(i) => args
            .get(i + 1)
            .copied()
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("{} needs a value", flag)),
        None => Ok(None),
    }
}

fn format_millis(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

// ============================================================================
// Token commands
// ============================================================================

fn generate_token(event_id: &str, student_id: &str) -> Result<()> {
    if event_id.is_empty() || student_id.is_empty() {
        bail!("Event and student ids must not be empty");
    }
    if event_id.contains(token::TOKEN_DELIMITER) || student_id.contains(token::TOKEN_DELIMITER) {
        bail!("Ids must not contain '{}'", token::TOKEN_DELIMITER);
    }
    println!("{}", token::generate(event_id, student_id, &SystemClock));
    Ok(())
}

fn check_token(payload: &str) -> Result<()> {
    let parsed: AttendanceToken = payload
        .parse()
        .with_context(|| format!("Not an attendance code: {}", payload))?;
    let now = SystemClock.now_millis();

    println!("Event:    {}", parsed.event_id);
    println!("Student:  {}", parsed.student_id);
    println!("Issued:   {}", format_millis(parsed.issued_at));
    if token::is_valid(payload, &SystemClock) {
        println!(
            "Status:   valid ({} left)",
            format_remaining(parsed.remaining(now).num_milliseconds())
        );
    } else if parsed.age_millis(now) < 0 {
        println!("Status:   invalid (issued in the future)");
    } else {
        println!("Status:   expired");
    }
    Ok(())
}

// ============================================================================
// Data commands
// ============================================================================

async fn open_cache(config: &Config) -> Result<CacheLayer> {
    let path = config.store_path()?;
    let store = FileStore::open(&path)
        .await
        .with_context(|| format!("Failed to open local store: {}", path.display()))?;
    debug!(path = %path.display(), "Local store opened");
    Ok(CacheLayer::new(Arc::new(store)))
}

async fn open_repository(config: &Config) -> Result<EventRepository> {
    let url = config
        .api_url
        .as_deref()
        .context("No API URL configured (set EVENTPASS_API_URL or api_url in config.json)")?;
    let mut client = ApiClient::new(url)?;
    if let Some(ref token) = config.api_token {
        client.set_token(token.clone());
    }
    let cache = open_cache(config).await?;
    Ok(EventRepository::new(Arc::new(client), cache))
}

fn print_events(fetched: &Fetched<Vec<Event>>) {
    if fetched.from_cache {
        println!("(cached - offline)");
    }
    if fetched.data.is_empty() {
        println!("No events.");
        return;
    }
    for event in &fetched.data {
        let seats = match event.seats_left() {
            Some(n) => format!("{} seats left", n),
            None => "open".to_string(),
        };
        println!(
            "{:<12} {:<width$} {:<14} {:<20} {}",
            truncate_string(&event.id, 12),
            truncate_string(&event.title, TITLE_WIDTH),
            event.formatted_date(),
            truncate_string(event.location.as_deref().unwrap_or("-"), 20),
            seats,
            width = TITLE_WIDTH,
        );
    }
}

async fn list_events(args: &[&str]) -> Result<()> {
    let config = Config::load()?;
    let repo = open_repository(&config).await?;

    let fetched = match (flag_value(args, "--organizer")?, flag_value(args, "--student")?) {
        (Some(_), Some(_)) => bail!("Use either --organizer or --student, not both"),
        (Some(id), None) => repo.organizer_events(id).await?,
        (None, Some(id)) => repo.student_events(id).await?,
        (None, None) => repo.all_events().await?,
    };
    print_events(&fetched);
    Ok(())
}

async fn show_event(event_id: &str) -> Result<()> {
    let config = Config::load()?;
    let repo = open_repository(&config).await?;

    let fetched = repo.event(event_id).await?;
    let event = &fetched.data;
    if fetched.from_cache {
        println!("(cached - offline)");
    }
    println!("{}", event.title);
    println!("  When:      {}", event.formatted_start_datetime());
    println!("  Where:     {}", event.location.as_deref().unwrap_or("-"));
    println!("  Organizer: {}", event.organizer_id);
    println!("  Registered: {}", event.registered_count());
    if let Some(ref description) = event.description {
        println!();
        println!("{}", description);
    }
    Ok(())
}

async fn checkin(event_id: &str, payload: &str, args: &[&str]) -> Result<()> {
    let mut config = Config::load()?;
    let organizer_id = match flag_value(args, "--organizer")? {
        Some(id) => id.to_string(),
        None => config
            .last_user_id
            .clone()
            .context("No organizer id (pass --organizer or sign in first)")?,
    };
    let repo = open_repository(&config).await?;

    let record = CheckIn::new(&repo, organizer_id.clone())
        .scan(payload, event_id)
        .await?;
    info!(event_id = %record.event_id, student_id = %record.student_id, "Checked in");
    println!(
        "Checked in {} for {} at {}",
        record.student_id,
        record.event_id,
        format_millis(record.marked_at)
    );

    if config.last_user_id.as_deref() != Some(organizer_id.as_str()) {
        config.last_user_id = Some(organizer_id);
        config.save()?;
    }
    Ok(())
}

// ============================================================================
// Cache commands
// ============================================================================

fn print_entry(entry: &CacheEntryInfo) {
    let state = if entry.fresh { "fresh" } else { "stale" };
    println!(
        "{:<48} {:<6} {}",
        entry.storage_key,
        state,
        format_age(entry.age_ms)
    );
}

async fn cache_status() -> Result<()> {
    let config = Config::load()?;
    let cache = open_cache(&config).await?;

    let mut entries = cache.entries().await;
    if entries.is_empty() {
        println!("Cache is empty.");
        return Ok(());
    }
    entries.sort_by(|a, b| a.storage_key.cmp(&b.storage_key));
    for entry in &entries {
        print_entry(entry);
    }
    Ok(())
}

async fn cache_clear() -> Result<()> {
    let config = Config::load()?;
    let cache = open_cache(&config).await?;
    cache.clear_all().await;
    println!("Cache cleared.");
    Ok(())
}
