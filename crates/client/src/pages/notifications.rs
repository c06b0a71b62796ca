//! Notification inbox.

use hoarding_core::models::{Notification, unread_count};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::NotificationId;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError};
use crate::api::ApiError;

const NOTIFICATIONS: &str = "/notifications";

#[derive(Debug)]
pub struct NotificationsPage {
    ctx: PageContext,
    loader: Loader<Vec<Notification>>,
}

impl NotificationsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<Notification>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<Notification>> {
        self.loader
            .run(async {
                self.ctx.require_access("notifications", |role| {
                    rbac::can_read(role, Resource::Notifications)
                })?;
                Ok::<_, PageError>(
                    self.ctx
                        .settle("notifications", self.ctx.list(NOTIFICATIONS).await),
                )
            })
            .await
    }

    /// Unread notifications among those loaded.
    #[must_use]
    pub fn unread(&self) -> usize {
        self.loader
            .data()
            .map(|items| unread_count(&items))
            .unwrap_or_default()
    }

    fn is_read(&self, id: &NotificationId) -> bool {
        self.loader.data().is_some_and(|items| {
            items
                .iter()
                .any(|n| n.id.as_ref() == Some(id) && n.read)
        })
    }

    /// Mark one notification read.
    ///
    /// Idempotent: a notification already loaded as read is left alone and
    /// no request is sent.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        if self.is_read(id) {
            return Ok(());
        }
        self.ctx.permit(
            rbac::can_update(self.ctx.role(), Resource::Notifications),
            "update notifications",
        )?;
        self.ctx
            .api
            .patch(&format!("{NOTIFICATIONS}/{id}/read"), &json!({}))
            .await
            .inspect_err(|error| self.ctx.toasts.error(error.user_message()))?;
        self.load().await;
        Ok(())
    }

    /// Mark everything read. Sends nothing when nothing loaded is unread.
    ///
    /// # Errors
    ///
    /// As [`NotificationsPage::mark_as_read`].
    pub async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        if self.loader.data().is_some() && self.unread() == 0 {
            return Ok(());
        }
        self.ctx.permit(
            rbac::can_update(self.ctx.role(), Resource::Notifications),
            "update notifications",
        )?;
        self.ctx
            .mutate(
                "All notifications marked as read",
                self.ctx.api.patch(&format!("{NOTIFICATIONS}/read-all"), &json!({})),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}
