//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HOARDING_API_URL` - Base URL of the REST backend
//!   (default: `http://localhost:5000/api`)
//! - `HOARDING_SESSION_FILE` - Where the session is persisted
//!   (default: `$HOME/.hoarding/session.json`, else `./.hoarding-session.json`)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Local backend used when `HOARDING_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is appended to.
    pub api_url: Url,
    /// File backing the persisted session.
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `HOARDING_API_URL` is set but
    /// is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_optional_env("HOARDING_API_URL").unwrap_or_else(|| {
            tracing::debug!("HOARDING_API_URL not set, using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_owned()
        });
        let session_file = get_optional_env("HOARDING_SESSION_FILE")
            .map_or_else(default_session_file, PathBuf::from);

        Ok(Self {
            api_url: parse_api_url("HOARDING_API_URL", &api_url)?,
            session_file,
        })
    }

    /// Configuration for an explicit base URL (tests, embedding).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("api_url", api_url)?,
            session_file: default_session_file(),
        })
    }

    /// Absolute URL for an API path.
    ///
    /// The path is appended to the base URL's path rather than resolved
    /// against it, so a base of `http://host/api` and a path of `/hoardings`
    /// yields `http://host/api/hoardings`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.api_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

fn parse_api_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            name.to_owned(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_session_file() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".hoarding-session.json"),
        |home| PathBuf::from(home).join(".hoarding").join("session.json"),
    )
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = ClientConfig::new("http://localhost:5000/api").unwrap();
        assert_eq!(
            config.endpoint("/hoardings").unwrap().as_str(),
            "http://localhost:5000/api/hoardings"
        );
        assert_eq!(
            config.endpoint("bookings?status=active").unwrap().as_str(),
            "http://localhost:5000/api/bookings?status=active"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_base() {
        let config = ClientConfig::new("https://api.example.com/v1/").unwrap();
        assert_eq!(
            config.endpoint("/auth/login").unwrap().as_str(),
            "https://api.example.com/v1/auth/login"
        );
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("ftp://files.example.com").is_err());
    }

    #[test]
    fn test_default_url_is_valid() {
        assert!(ClientConfig::new(DEFAULT_API_URL).is_ok());
    }
}
