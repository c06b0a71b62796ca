//! Subcommand implementations.

pub mod access;
pub mod auth;
pub mod pages;

use std::io::Write;

use hoarding_client::config::{ClientConfig, ConfigError};
use hoarding_client::pages::{PageContext, PageError, ToastLevel};
use hoarding_client::session::FileStorage;
use hoarding_client::{ApiClient, ApiError, SessionStore};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Could not write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// API client over the persisted session file.
pub fn connect() -> Result<ApiClient, CliError> {
    let config = ClientConfig::from_env()?;
    tracing::debug!(session_file = %config.session_file.display(), "opening session");
    let session = SessionStore::new(FileStorage::new(&config.session_file));
    Ok(ApiClient::new(config, session)?)
}

/// Page context whose toasts are logged when the command finishes.
pub fn context(api: &ApiClient) -> PageContext {
    PageContext::new(api.clone())
}

/// Log every toast a page raised.
pub fn flush_toasts(ctx: &PageContext) {
    for toast in ctx.toasts.drain() {
        match toast.level {
            ToastLevel::Error => tracing::warn!("{}", toast.message),
            ToastLevel::Success | ToastLevel::Info => tracing::info!("{}", toast.message),
        }
    }
}

/// Write `value` to stdout as pretty JSON.
pub fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write one line to stdout.
pub fn line(text: &str) -> Result<(), CliError> {
    writeln!(std::io::stdout().lock(), "{text}")?;
    Ok(())
}
