//! Landlord rent for hoarding sites.

use chrono::NaiveDate;
use hoarding_core::models::{RentRecord, outstanding};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{Money, RentRecordId};
use rust_decimal::Decimal;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, amount_json, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const RENT: &str = "/rent";

#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
    pub amount: Option<Decimal>,
    pub paid_on: String,
    /// Cheque number, UTR or similar.
    pub reference: String,
}

impl PaymentForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .positive("amount", self.amount)
            .date("paidOn", &self.paid_on)
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "amount": self.amount.map(amount_json),
            "paidOn": self.paid_on.trim(),
            "reference": self.reference.trim(),
        }))
    }
}

/// Unpaid records due before `today`, oldest first.
#[must_use]
pub fn overdue(records: &[RentRecord], today: NaiveDate) -> Vec<&RentRecord> {
    let mut late: Vec<&RentRecord> = records
        .iter()
        .filter(|record| !record.is_paid())
        .filter(|record| {
            record
                .due_date
                .as_deref()
                .and_then(|due| due.get(..10))
                .and_then(|due| NaiveDate::parse_from_str(due, "%Y-%m-%d").ok())
                .is_some_and(|due| due < today)
        })
        .collect();
    late.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    late
}

#[derive(Debug)]
pub struct RentPage {
    ctx: PageContext,
    loader: Loader<Vec<RentRecord>>,
}

impl RentPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<RentRecord>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<RentRecord>> {
        self.loader
            .run(async {
                self.ctx.require_access("rent", rbac::can_view_rent)?;
                Ok::<_, PageError>(self.ctx.settle("rent records", self.ctx.list(RENT).await))
            })
            .await
    }

    /// Total still to pay across loaded records.
    #[must_use]
    pub fn outstanding(&self) -> Money {
        outstanding(&self.loader.data().unwrap_or_default())
    }

    #[must_use]
    pub fn can_record_payment(&self) -> bool {
        rbac::can_update(self.ctx.role(), Resource::Rent)
    }

    /// Record a payment against a rent instalment.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` for bad input or an instalment
    /// already paid, without contacting the backend; otherwise the request
    /// error.
    pub async fn record_payment(&self, id: &RentRecordId, form: &PaymentForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_record_payment(), "record rent payments")?;
        let already_paid = self.loader.data().is_some_and(|records| {
            records
                .iter()
                .any(|r| r.id.as_ref() == Some(id) && r.is_paid())
        });
        if already_paid {
            return Err(ApiError::Validation(ValidationErrors::single(
                "rent",
                "has already been paid",
            )));
        }
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate(
                "Payment recorded",
                self.ctx.api.post(&format!("{RENT}/{id}/pay"), &form.to_body()),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hoarding_core::Role;

    use super::*;
    use crate::pages::test_support::offline_context;

    fn record(id: &str, due: &str, paid_on: Option<&str>) -> RentRecord {
        RentRecord {
            id: Some(RentRecordId::new(id)),
            due_date: Some(due.to_string()),
            paid_on: paid_on.map(str::to_string),
            amount: Some(Decimal::new(10_000, 0)),
            ..RentRecord::default()
        }
    }

    #[test]
    fn test_overdue() {
        let records = vec![
            record("r3", "2026-02-15", None),
            record("r1", "2026-01-15", None),
            record("r2", "2026-01-20", Some("2026-01-19")),
            record("r4", "2026-04-15", None),
        ];
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let ids: Vec<_> = overdue(&records, today)
            .into_iter()
            .filter_map(|r| r.id.as_ref().map(RentRecordId::as_str))
            .collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }

    #[test]
    fn test_payment_form() {
        assert!(PaymentForm::default().validate().is_err());
        let form = PaymentForm {
            amount: Some(Decimal::new(10_000, 0)),
            paid_on: "2026-03-01".into(),
            reference: "UTR123".into(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(form.to_body()["reference"], json!("UTR123"));
    }

    #[tokio::test]
    async fn test_sales_cannot_see_rent() {
        let (ctx, _) = offline_context(Some(Role::Sales));
        let page = RentPage::new(ctx);
        assert!(page.load().await.error().is_some());
        assert!(matches!(
            page.record_payment(&RentRecordId::new("r1"), &PaymentForm::default())
                .await,
            Err(ApiError::Forbidden(_))
        ));
    }
}
