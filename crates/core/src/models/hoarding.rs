//! Hoardings: the physical advertising structures available for rent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NOT_AVAILABLE, Record, lenient};
use crate::types::{HoardingId, Money};

/// Availability of a hoarding as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoardingStatus {
    Available,
    /// Held by one or more booking tokens awaiting confirmation.
    OnHold,
    Booked,
    UnderMaintenance,
}

impl HoardingStatus {
    /// Parse a status string, ignoring case and separators.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "available" | "vacant" | "free" => Some(Self::Available),
            "onhold" | "hold" | "blocked" | "underprocess" => Some(Self::OnHold),
            "booked" | "occupied" | "live" => Some(Self::Booked),
            "undermaintenance" | "maintenance" | "inactive" => Some(Self::UnderMaintenance),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::OnHold => "On hold",
            Self::Booked => "Booked",
            Self::UnderMaintenance => "Under maintenance",
        }
    }
}

/// A hoarding site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hoarding {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<HoardingId>,
    /// Company-internal site code (e.g. `PUN-014`).
    #[serde(deserialize_with = "lenient::text")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub city: Option<String>,
    /// Width in feet.
    #[serde(deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    /// Height in feet.
    #[serde(deserialize_with = "lenient::number")]
    pub height: Option<f64>,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub hoarding_type: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    /// Monthly rate charged to clients.
    #[serde(deserialize_with = "lenient::value")]
    pub rate: Option<Decimal>,
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
    /// Owner of the land the structure stands on.
    #[serde(deserialize_with = "lenient::text")]
    pub landlord: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Hoarding {
    const COLLECTION_KEY: &'static str = "hoardings";
    const RECORD_KEY: &'static str = "hoarding";
    const ALIASES: &'static [(&'static str, &'static str)] = &[
        ("address", "location"),
        ("price", "rate"),
        ("lat", "latitude"),
        ("lng", "longitude"),
    ];
}

impl Hoarding {
    /// Title for lists: title, else code, else location.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.code.as_deref())
            .or(self.location.as_deref())
            .unwrap_or("Untitled hoarding")
    }

    /// Parsed status, `None` when missing or unrecognized.
    #[must_use]
    pub fn parsed_status(&self) -> Option<HoardingStatus> {
        self.status.as_deref().and_then(HoardingStatus::parse)
    }

    #[must_use]
    pub fn status_label(&self) -> &str {
        self.parsed_status()
            .map_or_else(|| self.status.as_deref().unwrap_or("Unknown"), |s| s.label())
    }

    /// Size label such as `40 x 20 ft`.
    #[must_use]
    pub fn size_label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{w} x {h} ft"),
            _ => NOT_AVAILABLE.to_owned(),
        }
    }

    /// Area in square feet.
    #[must_use]
    pub fn area_sq_ft(&self) -> Option<f64> {
        Some(self.width? * self.height?)
    }

    #[must_use]
    pub fn rate_label(&self) -> String {
        self.rate
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |rate| Money::inr(rate).display())
    }

    /// Case-insensitive match against title, code, location and city.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&self.title, &self.code, &self.location, &self.city]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
