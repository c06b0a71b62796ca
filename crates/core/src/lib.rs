//! Hoarding Manager Core - Shared types library.
//!
//! This crate provides common types used across all Hoarding Manager components:
//! - `client` - Session store, API client and page view-models
//! - `cli` - Command-line front end for the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. Everything here can be tested exhaustively without a
//! backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, money and roles
//! - [`rbac`] - Static role → resource → action permission table
//! - [`envelope`] - Tolerant unwrapping of backend response envelopes
//! - [`models`] - Domain records passed through from the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod envelope;
pub mod models;
pub mod rbac;
pub mod types;

pub use types::*;
