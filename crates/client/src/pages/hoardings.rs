//! Hoarding inventory: list, filter, detail and maintenance.

use hoarding_core::models::{Hoarding, HoardingStatus};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::HoardingId;
use rust_decimal::Decimal;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, amount_json, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const HOARDINGS: &str = "/hoardings";

/// Client-side filter over the loaded inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoardingFilter {
    pub status: Option<HoardingStatus>,
    pub city: Option<String>,
    /// Matched against code, title, location and city.
    pub text: Option<String>,
}

impl HoardingFilter {
    #[must_use]
    pub fn matches(&self, hoarding: &Hoarding) -> bool {
        if let Some(status) = self.status
            && hoarding.parsed_status() != Some(status)
        {
            return false;
        }
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
            && !hoarding
                .city
                .as_deref()
                .is_some_and(|own| own.trim().eq_ignore_ascii_case(city))
        {
            return false;
        }
        self.text
            .as_deref()
            .is_none_or(|needle| hoarding.matches_text(needle))
    }

    #[must_use]
    pub fn apply(&self, hoardings: &[Hoarding]) -> Vec<Hoarding> {
        hoardings
            .iter()
            .filter(|hoarding| self.matches(hoarding))
            .cloned()
            .collect()
    }
}

/// Create/edit form for a hoarding.
#[derive(Debug, Clone, Default)]
pub struct HoardingForm {
    pub code: String,
    pub title: String,
    pub location: String,
    pub city: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub hoarding_type: String,
    pub rate: Option<Decimal>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<HoardingStatus>,
    pub landlord: String,
}

impl HoardingForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new()
            .required("code", &self.code)
            .required("location", &self.location)
            .required("city", &self.city)
            .positive("rate", self.rate)
            .check("width", self.width.is_none_or(|w| w > 0.0), "must be greater than zero")
            .check("height", self.height.is_none_or(|h| h > 0.0), "must be greater than zero");
        if let Some(latitude) = self.latitude {
            validator = validator.within("latitude", latitude, -90.0, 90.0);
        }
        if let Some(longitude) = self.longitude {
            validator = validator.within("longitude", longitude, -180.0, 180.0);
        }
        validator.finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "code": self.code.trim(),
            "title": self.title.trim(),
            "location": self.location.trim(),
            "city": self.city.trim(),
            "width": self.width,
            "height": self.height,
            "type": self.hoarding_type.trim(),
            "rate": self.rate.map(amount_json),
            "latitude": self.latitude,
            "longitude": self.longitude,
            "status": self.status,
            "landlord": self.landlord.trim(),
        }))
    }
}

/// The hoardings page.
#[derive(Debug)]
pub struct HoardingsPage {
    ctx: PageContext,
    loader: Loader<Vec<Hoarding>>,
}

impl HoardingsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<Vec<Hoarding>> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<Vec<Hoarding>> {
        self.loader
            .run(async {
                self.ctx
                    .require_access("hoardings", |role| rbac::can_read(role, Resource::Hoardings))?;
                Ok::<_, PageError>(self.ctx.settle("hoardings", self.ctx.list(HOARDINGS).await))
            })
            .await
    }

    /// Loaded hoardings passing `filter`.
    #[must_use]
    pub fn visible(&self, filter: &HoardingFilter) -> Vec<Hoarding> {
        self.loader
            .data()
            .map(|hoardings| filter.apply(&hoardings))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Hoardings)
    }

    #[must_use]
    pub fn can_update(&self) -> bool {
        rbac::can_update(self.ctx.role(), Resource::Hoardings)
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        rbac::can_delete(self.ctx.role(), Resource::Hoardings)
    }

    /// Fetch one hoarding.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    pub async fn detail(&self, id: &HoardingId) -> Result<Option<Hoarding>, ApiError> {
        self.ctx.one(&format!("{HOARDINGS}/{id}")).await
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create(&self, form: &HoardingForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create(), "create hoardings")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Hoarding created", self.ctx.api.post(HOARDINGS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`HoardingsPage::create`].
    pub async fn update(&self, id: &HoardingId, form: &HoardingForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_update(), "update hoardings")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate(
                "Hoarding updated",
                self.ctx.api.put(&format!("{HOARDINGS}/{id}"), &form.to_body()),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn delete(&self, id: &HoardingId) -> Result<(), ApiError> {
        self.ctx.permit(self.can_delete(), "delete hoardings")?;
        self.ctx
            .mutate("Hoarding deleted", self.ctx.api.delete(&format!("{HOARDINGS}/{id}")))
            .await?;
        self.load().await;
        Ok(())
    }
}
