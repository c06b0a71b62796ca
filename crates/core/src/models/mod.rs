//! Domain records passed through from the backend.
//!
//! The client does not own these schemas. Every known field is optional,
//! unknown fields are kept in `extra` so a record can be sent back
//! unchanged, and display helpers supply defaults for missing values.

pub mod booking;
pub mod contract;
pub mod field;
pub mod hoarding;
pub mod lenient;
pub mod notification;
pub mod people;
pub mod rent;

pub use booking::{Booking, BookingToken};
pub use contract::{Contract, Proposal};
pub use field::{CheckIn, Task, TaskKind};
pub use hoarding::{Hoarding, HoardingStatus};
pub use notification::{Notification, unread_count};
pub use people::{Client, Enquiry, RoleRecord, User};
pub use rent::{RentRecord, outstanding};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::{extract_list_named, extract_one_named};
use crate::types::UserId;

/// Mongo-style primary key, folded into `id` for every record.
const ID_ALIAS: (&str, &str) = ("_id", "id");

/// A backend record type.
pub trait Record: DeserializeOwned + Send + 'static {
    /// Key that may wrap a list of these records (e.g. `hoardings`).
    const COLLECTION_KEY: &'static str;
    /// Key that may wrap a single record (e.g. `hoarding`).
    const RECORD_KEY: &'static str;
    /// Alternate wire names as `(alternate, canonical)` pairs.
    const ALIASES: &'static [(&'static str, &'static str)] = &[];

    /// Decode one record, folding alternate names into canonical fields.
    ///
    /// Only non-objects fail: record fields decode leniently.
    fn decode(value: Value) -> Option<Self> {
        let value = canonicalize(value, std::iter::once(&ID_ALIAS).chain(Self::ALIASES));
        serde_json::from_value(value)
            .inspect_err(|error| {
                tracing::debug!(%error, record = Self::RECORD_KEY, "skipping undecodable record");
            })
            .ok()
    }
}

/// Copy the first non-null alternate into each absent canonical key.
///
/// Alternates are left in place and end up in the record's `extra` map,
/// so a payload carrying both `_id` and `id` never collides.
fn canonicalize<'a>(
    mut value: Value,
    aliases: impl Iterator<Item = &'a (&'a str, &'a str)>,
) -> Value {
    if let Value::Object(map) = &mut value {
        for (alternate, canonical) in aliases {
            if map.get(*canonical).is_none_or(Value::is_null)
                && let Some(found) = map.get(*alternate).filter(|v| !v.is_null()).cloned()
            {
                map.insert((*canonical).to_owned(), found);
            }
        }
    }
    value
}

/// Extract and decode a list of records from any envelope shape.
///
/// Elements that are not objects are skipped.
#[must_use]
pub fn decode_list<R: Record>(payload: &Value) -> Vec<R> {
    extract_list_named(payload, Some(R::COLLECTION_KEY))
        .into_iter()
        .filter_map(R::decode)
        .collect()
}

/// Extract and decode a single record from any envelope shape.
#[must_use]
pub fn decode_one<R: Record>(payload: &Value) -> Option<R> {
    extract_one_named(payload, Some(R::RECORD_KEY)).and_then(R::decode)
}

/// Records that track who created or is assigned to them.
pub trait Owned {
    /// Users who count as owners for `editOwn` checks.
    fn owners(&self) -> Vec<&UserId>;

    /// Whether `user` owns this record.
    fn is_owned_by(&self, user: &UserId) -> bool {
        self.owners().contains(&user)
    }
}

/// Fallback text for missing display values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format an optional ISO timestamp or date as `YYYY-MM-DD`.
#[must_use]
pub fn date_label(value: Option<&str>) -> String {
    value
        .and_then(|raw| raw.get(..10))
        .filter(|date| chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
        .map_or_else(|| NOT_AVAILABLE.to_owned(), str::to_owned)
}
