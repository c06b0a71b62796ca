//! Incoming enquiries from prospective clients.

use hoarding_core::models::Enquiry;
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{EnquiryId, UserId};
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const ENQUIRIES: &str = "/enquiries";

/// Statuses an enquiry moves through.
pub const ENQUIRY_STATUSES: [&str; 4] = ["new", "contacted", "converted", "closed"];

#[derive(Debug, Clone, Default)]
pub struct EnquiryForm {
    pub client_name: String,
    pub phone: String,
    pub location: String,
    pub requirement: String,
    pub status: String,
    pub assigned_to: Option<UserId>,
}

impl EnquiryForm {
    /// Prefill from an existing enquiry for editing.
    #[must_use]
    pub fn from_enquiry(enquiry: &Enquiry) -> Self {
        Self {
            client_name: enquiry.client_name.clone().unwrap_or_default(),
            phone: enquiry.phone.clone().unwrap_or_default(),
            location: enquiry.location.clone().unwrap_or_default(),
            requirement: enquiry.requirement.clone().unwrap_or_default(),
            status: enquiry.status.clone().unwrap_or_default(),
            assigned_to: enquiry.assigned_to.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let status = self.status.trim();
        Validator::new()
            .required("clientName", &self.client_name)
            .required("phone", &self.phone)
            .check(
                "phone",
                self.phone.trim().is_empty() || self.phone.chars().filter(char::is_ascii_digit).count() >= 10,
                "must have at least 10 digits",
            )
            .check(
                "status",
                status.is_empty() || ENQUIRY_STATUSES.iter().any(|s| s.eq_ignore_ascii_case(status)),
                "is not a known status",
            )
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "clientName": self.client_name.trim(),
            "phone": self.phone.trim(),
            "location": self.location.trim(),
            "requirement": self.requirement.trim(),
            "status": self.status.trim().to_ascii_lowercase(),
            "assignedTo": self.assigned_to,
        }))
    }
}

#[derive(Debug)]
pub struct EnquiriesPage {
    ctx: PageContext,
    loader: Loader<Vec<Enquiry>>,
}

impl EnquiriesPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<Enquiry>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<Enquiry>> {
        self.loader
            .run(async {
                self.ctx
                    .require_access("enquiries", |role| rbac::can_read(role, Resource::Enquiries))?;
                Ok::<_, PageError>(self.ctx.settle("enquiries", self.ctx.list(ENQUIRIES).await))
            })
            .await
    }

    /// Loaded enquiries with the given status (case-insensitive).
    #[must_use]
    pub fn with_status(&self, status: &str) -> Vec<Enquiry> {
        self.loader
            .data()
            .unwrap_or_default()
            .into_iter()
            .filter(|enquiry| enquiry.status_label().eq_ignore_ascii_case(status))
            .collect()
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Enquiries)
    }

    #[must_use]
    pub fn can_edit(&self, enquiry: &Enquiry) -> bool {
        self.ctx.may_modify(Resource::Enquiries, Some(enquiry))
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create(&self, form: &EnquiryForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create enquiries")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Enquiry recorded", self.ctx.api.post(ENQUIRIES, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`EnquiriesPage::create`].
    pub async fn update(&self, id: &EnquiryId, form: &EnquiryForm) -> Result<(), ApiError> {
        let existing = self
            .loader
            .data()
            .and_then(|all| all.into_iter().find(|e| e.id.as_ref() == Some(id)));
        self.ctx.permit(
            self.ctx.may_modify(Resource::Enquiries, existing.as_ref()),
            "update enquiries",
        )?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate(
                "Enquiry updated",
                self.ctx.api.put(&format!("{ENQUIRIES}/{id}"), &form.to_body()),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}
