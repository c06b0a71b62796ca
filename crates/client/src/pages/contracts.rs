//! Contracts: creation from bookings, renewal, cancellation and PDFs.

use chrono::NaiveDate;
use hoarding_core::models::{Booking, Contract};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{BookingId, ContractId, HoardingId};
use rust_decimal::Decimal;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, amount_json, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const CONTRACTS: &str = "/contracts";
const BOOKINGS: &str = "/bookings";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractsData {
    pub contracts: Vec<Contract>,
    /// Bookings a new contract can be drawn up from.
    pub bookings: Vec<Booking>,
}

impl ContractsData {
    /// Active contracts ending on or before `today + days`.
    ///
    /// A horizon past the calendar's range is unbounded.
    #[must_use]
    pub fn expiring(&self, today: NaiveDate, days: i64) -> Vec<&Contract> {
        let horizon = chrono::TimeDelta::try_days(days)
            .and_then(|span| today.checked_add_signed(span))
            .unwrap_or(NaiveDate::MAX);
        self.contracts
            .iter()
            .filter(|contract| contract.is_active())
            .filter(|contract| {
                contract
                    .end_date
                    .as_deref()
                    .and_then(|end| end.get(..10))
                    .and_then(|end| NaiveDate::parse_from_str(end, "%Y-%m-%d").ok())
                    .is_some_and(|end| end >= today && end <= horizon)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractForm {
    pub booking_id: Option<BookingId>,
    pub hoarding_id: Option<HoardingId>,
    pub client_name: String,
    pub start_date: String,
    pub end_date: String,
    pub amount: Option<Decimal>,
    pub terms: String,
}

impl ContractForm {
    /// Prefill from a booking.
    #[must_use]
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.clone(),
            hoarding_id: booking.hoarding_id.clone(),
            client_name: booking.client_name.clone().unwrap_or_default(),
            start_date: booking.start_date.clone().unwrap_or_default(),
            end_date: booking.end_date.clone().unwrap_or_default(),
            amount: booking.amount,
            terms: String::new(),
        }
    }

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .present("bookingId", self.booking_id.as_ref())
            .required("clientName", &self.client_name)
            .date("startDate", &self.start_date)
            .date("endDate", &self.end_date)
            .date_order("endDate", &self.start_date, &self.end_date)
            .positive("amount", self.amount)
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "bookingId": self.booking_id,
            "hoardingId": self.hoarding_id,
            "clientName": self.client_name.trim(),
            "startDate": self.start_date.trim(),
            "endDate": self.end_date.trim(),
            "amount": self.amount.map(amount_json),
            "terms": self.terms.trim(),
        }))
    }
}

/// Renewal terms.
#[derive(Debug, Clone, Default)]
pub struct RenewalForm {
    pub new_end_date: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug)]
pub struct ContractsPage {
    ctx: PageContext,
    loader: Loader<ContractsData>,
}

impl ContractsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<ContractsData> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<ContractsData> {
        self.loader
            .run(async {
                let user = self
                    .ctx
                    .require_access("contracts", |role| rbac::can_read(role, Resource::Contracts))?;
                let show_bookings = rbac::can_create(user.role, Resource::Contracts)
                    && rbac::can_read(user.role, Resource::Bookings);

                let (contracts, bookings) = futures::join!(
                    self.ctx.list::<Contract>(CONTRACTS),
                    async {
                        if show_bookings {
                            self.ctx.list::<Booking>(BOOKINGS).await
                        } else {
                            Ok(Vec::new())
                        }
                    },
                );

                Ok::<_, PageError>(ContractsData {
                    contracts: self.ctx.settle("contracts", contracts),
                    bookings: self.ctx.settle("bookings", bookings),
                })
            })
            .await
    }

    fn find(&self, id: &ContractId) -> Option<Contract> {
        self.loader
            .data()?
            .contracts
            .into_iter()
            .find(|contract| contract.id.as_ref() == Some(id))
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Contracts)
    }

    /// Whether the current user may renew or cancel `contract`.
    #[must_use]
    pub fn can_manage(&self, contract: &Contract) -> bool {
        self.ctx.may_modify(Resource::Contracts, Some(contract))
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create(&self, form: &ContractForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create contracts")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Contract created", self.ctx.api.post(CONTRACTS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// Extend a contract to a later end date.
    ///
    /// # Errors
    ///
    /// As [`ContractsPage::create`].
    pub async fn renew(&self, id: &ContractId, form: &RenewalForm) -> Result<(), ApiError> {
        let contract = self.find(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Contracts, contract.as_ref()),
            "renew contracts",
        )?;

        let current_end = contract
            .as_ref()
            .and_then(|c| c.end_date.as_deref())
            .and_then(|end| end.get(..10))
            .unwrap_or_default();
        let mut validator = Validator::new().date("newEndDate", &form.new_end_date);
        if !current_end.is_empty() {
            validator = validator.date_order("newEndDate", current_end, &form.new_end_date);
        }
        if form.amount.is_some() {
            validator = validator.positive("amount", form.amount);
        }
        validator.finish().map_err(ApiError::Validation)?;

        let body = compact(json!({
            "endDate": form.new_end_date.trim(),
            "amount": form.amount.map(amount_json),
        }));
        self.ctx
            .mutate(
                "Contract renewed",
                self.ctx.api.post(&format!("{CONTRACTS}/{id}/renew"), &body),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn cancel(&self, id: &ContractId, reason: &str) -> Result<(), ApiError> {
        let contract = self.find(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Contracts, contract.as_ref()),
            "cancel contracts",
        )?;
        self.ctx
            .mutate(
                "Contract cancelled",
                self.ctx.api.post(
                    &format!("{CONTRACTS}/{id}/cancel"),
                    &compact(json!({ "reason": reason.trim() })),
                ),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// The contract PDF.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn pdf(&self, id: &ContractId) -> Result<Vec<u8>, ApiError> {
        self.ctx.download(&format!("{CONTRACTS}/{id}/pdf")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hoarding_core::Role;

    use super::*;
    use crate::pages::test_support::offline_context;

    fn contract(id: &str, end: &str, status: &str) -> Contract {
        Contract {
            id: Some(ContractId::new(id)),
            end_date: Some(end.to_string()),
            status: Some(status.to_string()),
            ..Contract::default()
        }
    }

    #[test]
    fn test_expiring() {
        let data = ContractsData {
            contracts: vec![
                contract("c1", "2026-03-10T00:00:00Z", "active"),
                contract("c2", "2026-05-01", "active"),
                contract("c3", "2026-03-05", "cancelled"),
                contract("c4", "2026-02-01", "active"),
            ],
            ..ContractsData::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let ids: Vec<_> = data
            .expiring(today, 30)
            .into_iter()
            .filter_map(|c| c.id.as_ref().map(ContractId::as_str))
            .collect();
        assert_eq!(ids, vec!["c1"]);

        for days in [i64::MAX, 1_000_000_000] {
            let ids: Vec<_> = data
                .expiring(today, days)
                .into_iter()
                .filter_map(|c| c.id.as_ref().map(ContractId::as_str))
                .collect();
            assert_eq!(ids, vec!["c1", "c2"]);
        }
    }

    #[test]
    fn test_form_from_booking() {
        let booking = Booking {
            id: Some(BookingId::new("b1")),
            client_name: Some("Acme".into()),
            start_date: Some("2026-03-01".into()),
            end_date: Some("2026-03-31".into()),
            amount: Some(Decimal::new(90_000, 0)),
            ..Booking::default()
        };
        let form = ContractForm::from_booking(&booking);
        assert!(form.validate().is_ok());
        assert_eq!(form.to_body()["bookingId"], json!("b1"));
        assert!(ContractForm::default().validate().is_err());
    }

    #[tokio::test]
    async fn test_fitter_cannot_create() {
        let (ctx, _) = offline_context(Some(Role::Fitter));
        let page = ContractsPage::new(ctx);
        assert!(matches!(
            page.create(&ContractForm::default()).await,
            Err(ApiError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_renew_validates_date() {
        let (ctx, _) = offline_context(Some(Role::Manager));
        let page = ContractsPage::new(ctx);
        let result = page
            .renew(
                &ContractId::new("c1"),
                &RenewalForm {
                    new_end_date: "next year".into(),
                    amount: None,
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
