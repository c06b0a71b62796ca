//! Page view-models.
//!
//! Every page follows the same shape: a [`PageContext`] for talking to the
//! backend and raising toasts, and a [`Loader`] holding its data. Loading
//! needs a signed-in user, fetches every dataset concurrently, and degrades
//! a failed dataset to empty so the rest of the page still renders.
//! Mutations check the role locally, validate input, call the backend,
//! toast the outcome and reload.

pub mod bookings;
pub mod clients;
pub mod contracts;
pub mod enquiries;
pub mod hoardings;
pub mod location;
mod loader;
pub mod notifications;
pub mod proposals;
pub mod rent;
pub mod tasks;
mod toast;
pub mod users;

pub use loader::{LoadState, Loader, Ticket};
pub use toast::{Toast, ToastLevel, Toasts};

use std::future::Future;

use hoarding_core::Role;
use hoarding_core::envelope::envelope_message;
use hoarding_core::models::{Owned, Record, decode_list, decode_one};
use hoarding_core::rbac::{self, Resource};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ErrorKind};
use crate::routes::Route;
use crate::session::SessionUser;

/// Why a page could not load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PageError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PageError {
    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::from(&ApiError::NotAuthenticated)
    }

    #[must_use]
    pub fn forbidden(what: &str) -> Self {
        Self::from(&ApiError::Forbidden(what.to_owned()))
    }
}

impl From<&ApiError> for PageError {
    fn from(error: &ApiError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}

impl From<ApiError> for PageError {
    fn from(error: ApiError) -> Self {
        Self::from(&error)
    }
}

/// What every page needs: the API client and the toast queue.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub api: ApiClient,
    pub toasts: Toasts,
}

impl PageContext {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            toasts: Toasts::new(),
        }
    }

    /// Role of the signed-in user.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.api.session().role()
    }

    /// The signed-in user, or a login redirect.
    ///
    /// # Errors
    ///
    /// Returns an authentication `PageError` after redirecting to the login
    /// page when nobody is signed in.
    pub fn require_user(&self) -> Result<SessionUser, PageError> {
        self.api.session().current_user().ok_or_else(|| {
            self.api.navigate(Route::Login);
            PageError::not_authenticated()
        })
    }

    /// The signed-in user, provided `allowed(role)` holds.
    ///
    /// # Errors
    ///
    /// As [`PageContext::require_user`], or an authorization `PageError`
    /// naming `what` when the role is not allowed.
    pub fn require_access(
        &self,
        what: &str,
        allowed: impl FnOnce(Option<Role>) -> bool,
    ) -> Result<SessionUser, PageError> {
        let user = self.require_user()?;
        if allowed(user.role) {
            Ok(user)
        } else {
            Err(PageError::forbidden(what))
        }
    }

    /// Whether the signed-in role may change `record`: `update` on the
    /// resource, or `editOwn` when the user owns the record.
    #[must_use]
    pub fn may_modify<R: Owned>(&self, resource: Resource, record: Option<&R>) -> bool {
        let session = self.api.session();
        let is_owner = session
            .current_user()
            .zip(record)
            .is_some_and(|(user, record)| record.is_owned_by(&user.id));
        rbac::can_modify(session.role(), resource, is_owner)
    }

    /// Refuse a mutation the signed-in role may not perform.
    ///
    /// The backend decides for itself; this only saves a round trip.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` (and toasts it) when `allowed` is false.
    pub fn permit(&self, allowed: bool, what: &str) -> Result<(), ApiError> {
        if allowed {
            return Ok(());
        }
        let error = ApiError::Forbidden(what.to_owned());
        self.toasts.error(error.to_string());
        Err(error)
    }

    /// Fetch and decode a list of records.
    ///
    /// # Errors
    ///
    /// Returns any request error. Rows that are not objects are skipped.
    pub async fn list<R: Record>(&self, path: &str) -> Result<Vec<R>, ApiError> {
        let body = self.api.get(path).await?;
        Ok(decode_list(&body))
    }

    /// Fetch and decode a single record.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn one<R: Record>(&self, path: &str) -> Result<Option<R>, ApiError> {
        let body = self.api.get(path).await?;
        Ok(decode_one(&body))
    }

    /// Settle one dataset of a page load: a failure becomes an empty
    /// dataset plus an error toast.
    pub fn settle<T: Default>(&self, what: &str, result: Result<T, ApiError>) -> T {
        result.unwrap_or_else(|error| {
            tracing::warn!(dataset = what, %error, "dataset failed to load");
            self.toasts
                .error(format!("Could not load {what}: {}", error.user_message()));
            T::default()
        })
    }

    /// Run a mutation and toast the outcome. The backend's own message
    /// is preferred over `success`.
    ///
    /// # Errors
    ///
    /// Returns the request error after toasting it.
    pub async fn mutate(
        &self,
        success: &str,
        request: impl Future<Output = Result<Value, ApiError>>,
    ) -> Result<Value, ApiError> {
        match request.await {
            Ok(body) => {
                self.toasts
                    .success(envelope_message(&body).unwrap_or_else(|| success.to_owned()));
                Ok(body)
            }
            Err(error) => {
                self.toasts.error(error.user_message());
                Err(error)
            }
        }
    }

    /// Download a document, toasting a failure.
    ///
    /// # Errors
    ///
    /// Returns the request error after toasting it.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        self.api.download(path).await.inspect_err(|error| {
            self.toasts
                .error(format!("Download failed: {}", error.user_message()));
        })
    }
}

/// Drop null and blank-string fields from a request body, so an update
/// never clears a field the form left empty.
#[must_use]
pub fn compact(body: Value) -> Value {
    match body {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, value)| match value {
                    Value::Null => false,
                    Value::String(text) => !text.trim().is_empty(),
                    _ => true,
                })
                .collect(),
        ),
        other => other,
    }
}

/// A decimal amount as a JSON number.
#[must_use]
pub fn amount_json(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(amount.to_string()), Value::Number)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::offline_context;
    use super::*;

    #[test]
    fn test_require_user_redirects() {
        let (ctx, navigator) = offline_context(None);
        assert_eq!(ctx.require_user(), Err(PageError::not_authenticated()));
        assert_eq!(*navigator.0.lock().unwrap(), vec![Route::Login]);
    }

    #[test]
    fn test_require_access() {
        let (ctx, _) = offline_context(Some(Role::Fitter));
        let denied = ctx
            .require_access("rent", hoarding_core::rbac::can_view_rent)
            .unwrap_err();
        assert_eq!(denied.kind, ErrorKind::Authorization);
        assert!(ctx.require_access("tasks", |role| role.is_some()).is_ok());
    }

    #[test]
    fn test_permit_toasts() {
        let (ctx, _) = offline_context(Some(Role::Designer));
        assert!(matches!(
            ctx.permit(false, "delete hoardings"),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(ctx.toasts.last().unwrap().level, ToastLevel::Error);
        assert!(ctx.permit(true, "read hoardings").is_ok());
    }

    #[test]
    fn test_settle_degrades_to_empty() {
        let (ctx, _) = offline_context(Some(Role::Owner));
        let rows: Vec<u32> = ctx.settle(
            "hoardings",
            Err(ApiError::Status {
                status: 500,
                body: None,
            }),
        );
        assert!(rows.is_empty());
        assert_eq!(ctx.toasts.drain().len(), 1);
        assert_eq!(ctx.settle("hoardings", Ok(vec![1_u32])), vec![1]);
    }

    #[test]
    fn test_compact() {
        let body = serde_json::json!({"title": "A", "city": "", "rate": null, "width": 20});
        assert_eq!(compact(body), serde_json::json!({"title": "A", "width": 20}));
    }

    #[test]
    fn test_amount_json() {
        assert_eq!(amount_json(Decimal::new(125_050, 2)), serde_json::json!(1250.5));
    }

    #[tokio::test]
    async fn test_mutate_messages() {
        let (ctx, _) = offline_context(Some(Role::Owner));
        let body = ctx
            .mutate("Saved", async { Ok(serde_json::json!({"message": "Hoarding updated"})) })
            .await
            .unwrap();
        assert!(body.is_object());
        assert_eq!(ctx.toasts.last().unwrap().message, "Hoarding updated");

        let _ = ctx.mutate("Saved", async { Ok(Value::Null) }).await;
        assert_eq!(ctx.toasts.last().unwrap().message, "Saved");
    }
}
