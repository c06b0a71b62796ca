//! Ground rent owed to hoarding landlords.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NOT_AVAILABLE, Record, date_label, lenient};
use crate::types::{HoardingId, Money, RentRecordId};

/// One rent instalment for a hoarding site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RentRecord {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<RentRecordId>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::text")]
    pub landlord: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "lenient::text")]
    pub due_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub paid_on: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for RentRecord {
    const COLLECTION_KEY: &'static str = "rents";
    const RECORD_KEY: &'static str = "rent";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("hoarding", "hoardingId"), ("rentAmount", "amount")];
}

impl RentRecord {
    /// Paid when the backend says so or a payment date is present.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.paid_on.is_some()
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("paid"))
    }

    #[must_use]
    pub fn amount_label(&self) -> String {
        self.amount
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |amount| Money::inr(amount).display())
    }

    #[must_use]
    pub fn due_label(&self) -> String {
        date_label(self.due_date.as_deref())
    }
}

/// Sum of unpaid instalments.
#[must_use]
pub fn outstanding(records: &[RentRecord]) -> Money {
    Money::inr(
        records
            .iter()
            .filter(|r| !r.is_paid())
            .filter_map(|r| r.amount)
            .sum(),
    )
}
