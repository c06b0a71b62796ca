//! Proposals: client-facing bundles of hoardings and pricing.

use hoarding_core::envelope::find_string;
use hoarding_core::models::{Contract, Hoarding, Proposal, decode_one};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{ContractId, HoardingId, ProposalId};
use rust_decimal::Decimal;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, amount_json, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const PROPOSALS: &str = "/proposals";
const HOARDINGS: &str = "/hoardings";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalsData {
    pub proposals: Vec<Proposal>,
    /// Hoardings that can be added to a proposal.
    pub hoardings: Vec<Hoarding>,
}

impl ProposalsData {
    /// Sum of the listed rates of `ids`. Hoardings without a rate count
    /// as zero.
    #[must_use]
    pub fn suggested_total(&self, ids: &[HoardingId]) -> Decimal {
        ids.iter()
            .filter_map(|id| self.hoardings.iter().find(|h| h.id.as_ref() == Some(id)))
            .filter_map(|hoarding| hoarding.rate)
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProposalForm {
    pub title: String,
    pub client_name: String,
    pub hoarding_ids: Vec<HoardingId>,
    pub total_amount: Option<Decimal>,
    pub notes: String,
}

impl ProposalForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .required("title", &self.title)
            .required("clientName", &self.client_name)
            .check(
                "hoardingIds",
                !self.hoarding_ids.is_empty(),
                "select at least one hoarding",
            )
            .positive("totalAmount", self.total_amount)
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "title": self.title.trim(),
            "clientName": self.client_name.trim(),
            "hoardingIds": self.hoarding_ids,
            "totalAmount": self.total_amount.map(amount_json),
            "notes": self.notes.trim(),
        }))
    }
}

#[derive(Debug)]
pub struct ProposalsPage {
    ctx: PageContext,
    loader: Loader<ProposalsData>,
}

impl ProposalsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<ProposalsData> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<ProposalsData> {
        self.loader
            .run(async {
                self.ctx
                    .require_access("proposals", |role| rbac::can_read(role, Resource::Proposals))?;
                let (proposals, hoardings) = futures::join!(
                    self.ctx.list::<Proposal>(PROPOSALS),
                    self.ctx.list::<Hoarding>(HOARDINGS),
                );
                Ok::<_, PageError>(ProposalsData {
                    proposals: self.ctx.settle("proposals", proposals),
                    hoardings: self.ctx.settle("hoardings", hoardings),
                })
            })
            .await
    }

    fn find(&self, id: &ProposalId) -> Option<Proposal> {
        self.loader
            .data()?
            .proposals
            .into_iter()
            .find(|proposal| proposal.id.as_ref() == Some(id))
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Proposals)
    }

    /// Converting creates a contract, so it needs both permissions.
    #[must_use]
    pub fn can_convert(&self, proposal: &Proposal) -> bool {
        !proposal.is_converted()
            && self.ctx.may_modify(Resource::Proposals, Some(proposal))
            && rbac::can_create(self.ctx.role(), Resource::Contracts)
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create(&self, form: &ProposalForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create proposals")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Proposal created", self.ctx.api.post(PROPOSALS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// Email the proposal to the client.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn send(&self, id: &ProposalId) -> Result<(), ApiError> {
        let proposal = self.find(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Proposals, proposal.as_ref()),
            "send proposals",
        )?;
        self.ctx
            .mutate(
                "Proposal sent",
                self.ctx.api.post(&format!("{PROPOSALS}/{id}/send"), &json!({})),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// Turn an accepted proposal into a contract. Returns the new
    /// contract's id when the backend reports it.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, or `Validation` for a proposal that was already
    /// converted, without contacting the backend; otherwise the request
    /// error.
    pub async fn convert(&self, id: &ProposalId) -> Result<Option<ContractId>, ApiError> {
        let proposal = self.find(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Proposals, proposal.as_ref())
                && rbac::can_create(self.ctx.role(), Resource::Contracts),
            "convert proposals",
        )?;
        if proposal.as_ref().is_some_and(Proposal::is_converted) {
            return Err(ApiError::Validation(ValidationErrors::single(
                "proposal",
                "has already been converted to a contract",
            )));
        }

        let body = self
            .ctx
            .mutate(
                "Proposal converted to contract",
                self.ctx.api.post(&format!("{PROPOSALS}/{id}/convert"), &json!({})),
            )
            .await?;
        let contract_id = decode_one::<Contract>(&body)
            .and_then(|contract| contract.id)
            .or_else(|| find_string(&body, &["contractId"]).map(ContractId::new));
        self.load().await;
        Ok(contract_id)
    }

    /// The proposal PDF.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn pdf(&self, id: &ProposalId) -> Result<Vec<u8>, ApiError> {
        self.ctx.download(&format!("{PROPOSALS}/{id}/pdf")).await
    }
}
