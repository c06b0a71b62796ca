//! Hoarding Manager CLI - sign in and work with the backend from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from HOARDING_PASSWORD or stdin)
//! hm-cli login -e sales@example.com
//!
//! # List a page's records as JSON
//! hm-cli list bookings
//!
//! # Mark every notification as read
//! hm-cli notifications read-all
//!
//! # Check a permission without a backend
//! hm-cli can sales bookings create
//! ```
//!
//! # Environment Variables
//!
//! - `HOARDING_API_URL` / `HOARDING_SESSION_FILE` - see `hoarding_client::config`
//! - `HOARDING_LOG_JSON` - emit JSON log lines
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - report warnings and errors to Sentry

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::pages::PageName;

#[derive(Parser)]
#[command(name = "hm-cli")]
#[command(author, version, about = "Hoarding Manager command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Pages the signed-in role may open
    Menu,
    /// Load a page and print its records as JSON
    List {
        #[arg(value_enum)]
        page: PageName,
    },
    /// Manage notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
    /// Record a location check-in
    Checkin {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Hoarding the check-in is at
        #[arg(long)]
        hoarding: Option<String>,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Move a task to another status (`pending`, `in_progress`, `completed`)
    TaskStatus { id: String, status: String },
    /// Check a permission offline: `can <role> <resource> <action|capability>`
    Can {
        role: String,
        resource: String,
        permission: String,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|s| !s.trim().is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    if guard.is_enabled() {
        Some(guard)
    } else {
        None
    }
}

fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hoarding_client=info,hoarding_cli=info".into());

    let json = std::env::var("HOARDING_LOG_JSON").is_ok();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let _sentry_guard = init_sentry();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Can {
            role,
            resource,
            permission,
        } => commands::access::can(&role, &resource, &permission),
        Commands::Login { email } => commands::auth::login(&commands::connect()?, &email).await,
        Commands::Logout => {
            commands::auth::logout(&commands::connect()?).await;
            Ok(())
        }
        Commands::Whoami => commands::auth::whoami(&commands::connect()?),
        Commands::Menu => commands::access::menu(&commands::connect()?),
        Commands::List { page } => commands::pages::list(&commands::connect()?, page).await,
        Commands::Notifications { action } => {
            let api = commands::connect()?;
            match action {
                NotificationAction::Read { id } => {
                    commands::pages::mark_read(&api, Some(id.as_str())).await
                }
                NotificationAction::ReadAll => commands::pages::mark_read(&api, None).await,
            }
        }
        Commands::Checkin {
            lat,
            lng,
            hoarding,
            note,
        } => commands::pages::check_in(&commands::connect()?, lat, lng, hoarding, note).await,
        Commands::TaskStatus { id, status } => {
            commands::pages::task_status(&commands::connect()?, &id, &status).await
        }
    }
}
