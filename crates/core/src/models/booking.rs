//! Bookings and the provisional booking tokens that precede them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NOT_AVAILABLE, Owned, Record, date_label, lenient};
use crate::types::{BookingId, BookingTokenId, ClientId, HoardingId, Money, UserId};

/// A confirmed booking of a hoarding for a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<BookingId>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::value")]
    pub client_id: Option<ClientId>,
    #[serde(deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Booking {
    const COLLECTION_KEY: &'static str = "bookings";
    const RECORD_KEY: &'static str = "booking";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("hoarding", "hoardingId"), ("totalAmount", "amount")];
}

impl Owned for Booking {
    fn owners(&self) -> Vec<&UserId> {
        self.created_by.iter().collect()
    }
}

impl Booking {
    #[must_use]
    pub fn client_label(&self) -> &str {
        self.client_name.as_deref().unwrap_or("Unknown client")
    }

    /// `start → end` using date-only labels.
    #[must_use]
    pub fn period_label(&self) -> String {
        format!(
            "{} → {}",
            date_label(self.start_date.as_deref()),
            date_label(self.end_date.as_deref())
        )
    }

    #[must_use]
    pub fn amount_label(&self) -> String {
        self.amount
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |amount| Money::inr(amount).display())
    }

    /// Whether the booking has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled") || s.eq_ignore_ascii_case("canceled"))
    }
}

/// A provisional, queue-ordered hold on a hoarding pending confirmation.
///
/// The queue position is computed by the backend and only displayed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingToken {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<BookingTokenId>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::count")]
    pub queue_position: Option<u32>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub expires_at: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for BookingToken {
    const COLLECTION_KEY: &'static str = "tokens";
    const RECORD_KEY: &'static str = "token";
    const ALIASES: &'static [(&'static str, &'static str)] = &[
        ("hoarding", "hoardingId"),
        ("position", "queuePosition"),
        ("queueNumber", "queuePosition"),
    ];
}

impl Owned for BookingToken {
    fn owners(&self) -> Vec<&UserId> {
        self.created_by.iter().collect()
    }
}

impl BookingToken {
    /// `#1`, `#2`, ... or `—` when the backend did not assign a position.
    #[must_use]
    pub fn queue_label(&self) -> String {
        self.queue_position
            .map_or_else(|| "—".to_owned(), |position| format!("#{position}"))
    }

    /// First in the queue for its hoarding.
    #[must_use]
    pub fn is_front_of_queue(&self) -> bool {
        self.queue_position == Some(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_booking_labels() {
        let booking = Booking::decode(json!({
            "_id": "b1",
            "hoarding": "h1",
            "startDate": "2026-01-01T00:00:00Z",
            "endDate": "2026-03-31",
            "totalAmount": 90000,
            "status": "Cancelled"
        }))
        .unwrap();

        assert_eq!(booking.hoarding_id, Some(HoardingId::new("h1")));
        assert_eq!(booking.period_label(), "2026-01-01 → 2026-03-31");
        assert_eq!(booking.amount_label(), "₹90000.00");
        assert_eq!(booking.client_label(), "Unknown client");
        assert!(booking.is_cancelled());
    }

    #[test]
    fn test_booking_ownership() {
        let booking = Booking {
            created_by: Some(UserId::new("u1")),
            ..Booking::default()
        };
        assert!(booking.is_owned_by(&UserId::new("u1")));
        assert!(!booking.is_owned_by(&UserId::new("u2")));
        assert!(!Booking::default().is_owned_by(&UserId::new("u1")));
    }

    #[test]
    fn test_token_queue() {
        let token = BookingToken::decode(json!({"id": 3, "position": "1"})).unwrap();
        assert_eq!(token.queue_label(), "#1");
        assert!(token.is_front_of_queue());
        assert_eq!(BookingToken::default().queue_label(), "—");
    }
}
