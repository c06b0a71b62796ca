//! Field check-ins with GPS coordinates.
//!
//! Field staff log their own check-ins; the team view of everyone's
//! check-ins needs the `accessLocationTracking` capability.

use std::collections::HashMap;

use hoarding_core::models::CheckIn;
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{HoardingId, UserId};
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const CHECKINS: &str = "/location/checkins";
const MY_CHECKINS: &str = "/location/checkins/me";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationData {
    pub mine: Vec<CheckIn>,
    /// Everyone's check-ins; empty without location tracking access.
    pub team: Vec<CheckIn>,
}

impl LocationData {
    /// Most recent check-in per user, by `createdAt`.
    #[must_use]
    pub fn latest_by_user(&self) -> Vec<&CheckIn> {
        let mut latest: HashMap<&UserId, &CheckIn> = HashMap::new();
        for check_in in &self.team {
            let Some(user) = check_in.user_id.as_ref() else {
                continue;
            };
            latest
                .entry(user)
                .and_modify(|current| {
                    if check_in.created_at > current.created_at {
                        *current = check_in;
                    }
                })
                .or_insert(check_in);
        }
        let mut rows: Vec<&CheckIn> = latest.into_values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckInForm {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub hoarding_id: Option<HoardingId>,
    pub note: String,
}

impl CheckInForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut validator = Validator::new()
            .present("latitude", self.latitude.as_ref())
            .present("longitude", self.longitude.as_ref());
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
            "latitude": self.latitude,
            "longitude": self.longitude,
            "hoardingId": self.hoarding_id,
            "note": self.note.trim(),
        }))
    }
}

#[derive(Debug)]
pub struct LocationPage {
    ctx: PageContext,
    loader: Loader<LocationData>,
}

impl LocationPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<LocationData> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<LocationData> {
        self.loader
            .run(async {
                let user = self.ctx.require_access("location", |role| {
                    rbac::can_create(role, Resource::LocationCheckIns)
                        || rbac::can_access_location_tracking(role)
                })?;
                let tracking = rbac::can_access_location_tracking(user.role);

                let (mine, team) = futures::join!(
                    self.ctx.list::<CheckIn>(MY_CHECKINS),
                    async {
                        if tracking {
                            self.ctx.list::<CheckIn>(CHECKINS).await
                        } else {
                            Ok(Vec::new())
                        }
                    },
                );
                Ok::<_, PageError>(LocationData {
                    mine: self.ctx.settle("your check-ins", mine),
                    team: self.ctx.settle("team check-ins", team),
                })
            })
            .await
    }

    #[must_use]
    pub fn can_check_in(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::LocationCheckIns)
    }

    #[must_use]
    pub fn can_view_team(&self) -> bool {
        rbac::can_access_location_tracking(self.ctx.role())
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn check_in(&self, form: &CheckInForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_check_in(), "check in")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Checked in", self.ctx.api.post(CHECKINS, &form.to_body()))
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

    fn check_in(user: &str, at: &str) -> CheckIn {
        CheckIn {
            user_id: Some(UserId::new(user)),
            created_at: Some(at.to_string()),
            ..CheckIn::default()
        }
    }

    #[test]
    fn test_latest_by_user() {
        let data = LocationData {
            team: vec![
                check_in("u1", "2026-03-01T09:00:00Z"),
                check_in("u2", "2026-03-01T08:00:00Z"),
                check_in("u1", "2026-03-01T11:00:00Z"),
                CheckIn::default(),
            ],
            ..LocationData::default()
        };
        let latest: Vec<_> = data
            .latest_by_user()
            .into_iter()
            .map(|c| c.created_at.as_deref().unwrap())
            .collect();
        assert_eq!(latest, vec!["2026-03-01T11:00:00Z", "2026-03-01T08:00:00Z"]);
    }

    #[test]
    fn test_form() {
        let errors = CheckInForm {
            latitude: Some(95.0),
            ..CheckInForm::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.message_for("latitude").is_some());
        assert_eq!(errors.message_for("longitude"), Some("is required"));

        let form = CheckInForm {
            latitude: Some(18.5204),
            longitude: Some(73.8567),
            hoarding_id: Some(HoardingId::new("h1")),
            note: String::new(),
        };
        assert!(form.validate().is_ok());
        assert_eq!(
            form.to_body(),
            json!({"latitude": 18.5204, "longitude": 73.8567, "hoardingId": "h1"})
        );
    }

    #[test]
    fn test_permissions() {
        let (ctx, _) = offline_context(Some(Role::Fitter));
        let page = LocationPage::new(ctx);
        assert!(page.can_check_in());
        assert!(!page.can_view_team());

        let (ctx, _) = offline_context(Some(Role::Accountant));
        assert!(!LocationPage::new(ctx).can_check_in());
    }

    #[tokio::test]
    async fn test_designer_has_no_location_page() {
        let (ctx, _) = offline_context(Some(Role::Designer));
        let state = LocationPage::new(ctx).load().await;
        assert!(state.error().is_some());
    }
}
