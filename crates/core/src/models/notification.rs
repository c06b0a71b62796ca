//! In-app notifications.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Record, lenient};
use crate::types::NotificationId;

/// A notification addressed to the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<NotificationId>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient::flag_or_false")]
    pub read: bool,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,
    /// In-app path the notification points at.
    #[serde(deserialize_with = "lenient::text")]
    pub link: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Notification {
    const COLLECTION_KEY: &'static str = "notifications";
    const RECORD_KEY: &'static str = "notification";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("isRead", "read")];
}

impl Notification {
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Notification")
    }
}

/// Number of unread notifications in `items`.
#[must_use]
pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|n| !n.read).count()
}
