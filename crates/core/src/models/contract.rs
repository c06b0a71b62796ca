//! Contracts and the proposals that convert into them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{NOT_AVAILABLE, Owned, Record, date_label, lenient};
use crate::types::{BookingId, ContractId, HoardingId, Money, ProposalId, UserId};

/// A signed rental contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contract {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<ContractId>,
    #[serde(deserialize_with = "lenient::text")]
    pub contract_number: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub booking_id: Option<BookingId>,
    #[serde(deserialize_with = "lenient::value")]
    pub hoarding_id: Option<HoardingId>,
    #[serde(deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub amount: Option<Decimal>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub pdf_url: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Contract {
    const COLLECTION_KEY: &'static str = "contracts";
    const RECORD_KEY: &'static str = "contract";
    const ALIASES: &'static [(&'static str, &'static str)] = &[
        ("number", "contractNumber"),
        ("hoarding", "hoardingId"),
        ("totalAmount", "amount"),
    ];
}

impl Owned for Contract {
    fn owners(&self) -> Vec<&UserId> {
        self.created_by.iter().collect()
    }
}

impl Contract {
    #[must_use]
    pub fn number_label(&self) -> String {
        self.contract_number
            .clone()
            .or_else(|| self.id.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }

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

    /// Whether the contract can still be renewed or cancelled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.as_deref().is_none_or(|status| {
            !["cancelled", "canceled", "expired", "terminated"]
                .iter()
                .any(|closed| status.eq_ignore_ascii_case(closed))
        })
    }
}

/// A client-facing bundle of candidate hoardings and pricing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Proposal {
    #[serde(deserialize_with = "lenient::value")]
    pub id: Option<ProposalId>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub hoarding_ids: Vec<HoardingId>,
    #[serde(deserialize_with = "lenient::value")]
    pub total_amount: Option<Decimal>,
    #[serde(deserialize_with = "lenient::text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::value")]
    pub contract_id: Option<ContractId>,
    #[serde(deserialize_with = "lenient::value")]
    pub created_by: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Proposal {
    const COLLECTION_KEY: &'static str = "proposals";
    const RECORD_KEY: &'static str = "proposal";
    const ALIASES: &'static [(&'static str, &'static str)] =
        &[("hoardings", "hoardingIds"), ("amount", "totalAmount")];
}

impl Owned for Proposal {
    fn owners(&self) -> Vec<&UserId> {
        self.created_by.iter().collect()
    }
}

impl Proposal {
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            format!(
                "Proposal for {}",
                self.client_name.as_deref().unwrap_or("client")
            )
        })
    }

    #[must_use]
    pub fn total_label(&self) -> String {
        self.total_amount
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |amount| Money::inr(amount).display())
    }

    /// A proposal converts once; afterwards it carries its contract id.
    #[must_use]
    pub const fn is_converted(&self) -> bool {
        self.contract_id.is_some()
    }
}
