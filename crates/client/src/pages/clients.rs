//! Client (advertiser) directory.

use hoarding_core::models::Client;
use hoarding_core::rbac::{self, Resource};
use hoarding_core::ClientId;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const CLIENTS: &str = "/clients";

#[derive(Debug, Clone, Default)]
pub struct ClientForm {
    pub name: String,
    pub company: String,
    pub phone: String,
    pub email: String,
    pub gst: String,
}

impl ClientForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new()
            .required("name", &self.name)
            .required("phone", &self.phone);
        if !self.email.trim().is_empty() {
            validator = validator.email("email", &self.email);
        }
        validator
            .check(
                "gst",
                self.gst.trim().is_empty() || self.gst.trim().len() == 15,
                "must be 15 characters",
            )
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "name": self.name.trim(),
            "company": self.company.trim(),
            "phone": self.phone.trim(),
            "email": self.email.trim().to_lowercase(),
            "gst": self.gst.trim().to_ascii_uppercase(),
        }))
    }
}

#[derive(Debug)]
pub struct ClientsPage {
    ctx: PageContext,
    loader: Loader<Vec<Client>>,
}

impl ClientsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<Client>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<Client>> {
        self.loader
            .run(async {
                self.ctx
                    .require_access("clients", |role| rbac::can_read(role, Resource::Clients))?;
                Ok::<_, PageError>(self.ctx.settle("clients", self.ctx.list(CLIENTS).await))
            })
            .await
    }

    /// Loaded clients whose name, company, phone or email contains `needle`.
    #[must_use]
    pub fn search(&self, needle: &str) -> Vec<Client> {
        let needle = needle.trim().to_lowercase();
        self.loader
            .data()
            .unwrap_or_default()
            .into_iter()
            .filter(|client| {
                needle.is_empty()
                    || [&client.name, &client.company, &client.phone, &client.email]
                        .into_iter()
                        .flatten()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Clients)
    }

    #[must_use]
    pub fn can_update(&self) -> bool {
        rbac::can_update(self.ctx.role(), Resource::Clients)
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create(&self, form: &ClientForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create clients")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Client added", self.ctx.api.post(CLIENTS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`ClientsPage::create`].
    pub async fn update(&self, id: &ClientId, form: &ClientForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_update(), "update clients")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate(
                "Client updated",
                self.ctx.api.put(&format!("{CLIENTS}/{id}"), &form.to_body()),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}
