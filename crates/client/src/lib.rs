//! Hoarding Manager client library.
//!
//! Everything a front end needs between the user and the REST backend:
//!
//! - [`config`] - Base URL and session file location from the environment
//! - [`session`] - The owned session service and its storage backends
//! - [`api`] - REST client with bearer auth and single refresh-and-retry
//! - [`routes`] - Role-gated routing decisions and navigation
//! - [`forms`] - Pre-dispatch form validation
//! - [`pages`] - Per-feature view-models built on one loader abstraction
//!
//! # Security
//!
//! Role checks here only hide affordances. The backend is the enforcement
//! point for every permission.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod forms;
pub mod pages;
pub mod routes;
pub mod session;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use config::ClientConfig;
pub use session::{Session, SessionStore, SessionUser};
