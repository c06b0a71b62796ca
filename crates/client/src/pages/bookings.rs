//! Bookings and the booking-token queue.
//!
//! A booking token is a provisional hold on a hoarding. Several clients
//! can hold tokens on the same hoarding; the backend orders them into a
//! queue and the front token is the one that can be confirmed.

use hoarding_core::models::{Booking, BookingToken, Hoarding, decode_one};
use hoarding_core::rbac::{self, Resource};
use hoarding_core::{BookingId, BookingTokenId, HoardingId};
use rust_decimal::Decimal;
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, amount_json, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const BOOKINGS: &str = "/bookings";
const BOOKING_TOKENS: &str = "/booking-tokens";
const HOARDINGS: &str = "/hoardings";

/// Everything the bookings page shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingsData {
    pub bookings: Vec<Booking>,
    pub hoardings: Vec<Hoarding>,
    pub tokens: Vec<BookingToken>,
}

impl BookingsData {
    /// Title of a hoarding for display next to a booking or token.
    #[must_use]
    pub fn hoarding_title(&self, id: Option<&HoardingId>) -> String {
        id.and_then(|id| self.hoardings.iter().find(|h| h.id.as_ref() == Some(id)))
            .map_or_else(
                || id.map_or_else(|| "Unknown hoarding".to_owned(), ToString::to_string),
                |hoarding| hoarding.display_title().to_owned(),
            )
    }

    /// Tokens held on `hoarding`, front of the queue first.
    #[must_use]
    pub fn queue_for(&self, hoarding: &HoardingId) -> Vec<&BookingToken> {
        let mut queue: Vec<&BookingToken> = self
            .tokens
            .iter()
            .filter(|token| token.hoarding_id.as_ref() == Some(hoarding))
            .collect();
        queue.sort_by_key(|token| token.queue_position.unwrap_or(u32::MAX));
        queue
    }
}

/// Shared by booking and token creation.
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub hoarding_id: Option<HoardingId>,
    pub client_name: String,
    pub start_date: String,
    pub end_date: String,
    pub amount: Option<Decimal>,
    pub notes: String,
}

impl BookingForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self, require_amount: bool) -> Result<(), ValidationErrors> {
        let validator = Validator::new()
            .present("hoardingId", self.hoarding_id.as_ref())
            .required("clientName", &self.client_name)
            .date("startDate", &self.start_date)
            .date("endDate", &self.end_date)
            .date_order("endDate", &self.start_date, &self.end_date);
        if require_amount {
            validator.positive("amount", self.amount).finish()
        } else {
            validator.finish()
        }
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "hoardingId": self.hoarding_id,
            "clientName": self.client_name.trim(),
            "startDate": self.start_date.trim(),
            "endDate": self.end_date.trim(),
            "amount": self.amount.map(amount_json),
            "notes": self.notes.trim(),
        }))
    }
}

/// The bookings page.
#[derive(Debug)]
pub struct BookingsPage {
    ctx: PageContext,
    loader: Loader<BookingsData>,
}

impl BookingsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<BookingsData> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    /// Load bookings, hoardings and tokens concurrently. Any one failing
    /// leaves the other two in place.
    pub async fn load(&self) -> LoadState<BookingsData> {
        self.loader
            .run(async {
                let user = self
                    .ctx
                    .require_access("bookings", |role| rbac::can_read(role, Resource::Bookings))?;
                let show_tokens = rbac::can_read(user.role, Resource::BookingTokens);

                let (bookings, hoardings, tokens) = futures::join!(
                    self.ctx.list::<Booking>(BOOKINGS),
                    self.ctx.list::<Hoarding>(HOARDINGS),
                    async {
                        if show_tokens {
                            self.ctx.list::<BookingToken>(BOOKING_TOKENS).await
                        } else {
                            Ok(Vec::new())
                        }
                    },
                );

                Ok::<_, PageError>(BookingsData {
                    bookings: self.ctx.settle("bookings", bookings),
                    hoardings: self.ctx.settle("hoardings", hoardings),
                    tokens: self.ctx.settle("booking tokens", tokens),
                })
            })
            .await
    }

    fn find_token(&self, id: &BookingTokenId) -> Option<BookingToken> {
        self.loader
            .data()?
            .tokens
            .into_iter()
            .find(|token| token.id.as_ref() == Some(id))
    }

    fn find_booking(&self, id: &BookingId) -> Option<Booking> {
        self.loader
            .data()?
            .bookings
            .into_iter()
            .find(|booking| booking.id.as_ref() == Some(id))
    }

    #[must_use]
    pub fn can_create_booking(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::Bookings)
    }

    #[must_use]
    pub fn can_create_token(&self) -> bool {
        rbac::can_create(self.ctx.role(), Resource::BookingTokens)
    }

    /// Whether the current user may confirm or cancel `token`.
    #[must_use]
    pub fn can_manage_token(&self, token: &BookingToken) -> bool {
        self.ctx.may_modify(Resource::BookingTokens, Some(token))
    }

    /// Whether the current user may cancel `booking`.
    #[must_use]
    pub fn can_cancel_booking(&self, booking: &Booking) -> bool {
        !booking.is_cancelled() && self.ctx.may_modify(Resource::Bookings, Some(booking))
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create_booking(&self, form: &BookingForm) -> Result<(), ApiError> {
        self.ctx.permit(self.can_create_booking(), "create bookings")?;
        form.validate(true).map_err(ApiError::Validation)?;
        self.ctx
            .mutate("Booking created", self.ctx.api.post(BOOKINGS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// Place a token on a hoarding. Returns the queue position the backend
    /// assigned, when it reported one.
    ///
    /// # Errors
    ///
    /// As [`BookingsPage::create_booking`].
    pub async fn create_token(&self, form: &BookingForm) -> Result<Option<u32>, ApiError> {
        self.ctx.permit(self.can_create_token(), "create booking tokens")?;
        form.validate(false).map_err(ApiError::Validation)?;
        let body = self
            .ctx
            .mutate("Booking token created", self.ctx.api.post(BOOKING_TOKENS, &form.to_body()))
            .await?;
        let position = decode_one::<BookingToken>(&body)
            .and_then(|token| token.queue_position);
        if let Some(position) = position {
            self.ctx.toasts.info(format!("Queue position #{position}"));
        }
        self.load().await;
        Ok(position)
    }

    /// Turn a token into a booking.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn confirm_token(&self, id: &BookingTokenId) -> Result<(), ApiError> {
        let token = self.find_token(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::BookingTokens, token.as_ref()),
            "confirm booking tokens",
        )?;
        self.ctx
            .mutate(
                "Booking token confirmed",
                self.ctx
                    .api
                    .post(&format!("{BOOKING_TOKENS}/{id}/confirm"), &json!({})),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`BookingsPage::confirm_token`].
    pub async fn cancel_token(&self, id: &BookingTokenId) -> Result<(), ApiError> {
        let token = self.find_token(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::BookingTokens, token.as_ref()),
            "cancel booking tokens",
        )?;
        self.ctx
            .mutate(
                "Booking token cancelled",
                self.ctx
                    .api
                    .post(&format!("{BOOKING_TOKENS}/{id}/cancel"), &json!({})),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// # Errors
    ///
    /// As [`BookingsPage::confirm_token`].
    pub async fn cancel_booking(&self, id: &BookingId, reason: &str) -> Result<(), ApiError> {
        let booking = self.find_booking(id);
        self.ctx.permit(
            self.ctx.may_modify(Resource::Bookings, booking.as_ref()),
            "cancel bookings",
        )?;
        self.ctx
            .mutate(
                "Booking cancelled",
                self.ctx.api.post(
                    &format!("{BOOKINGS}/{id}/cancel"),
                    &compact(json!({ "reason": reason.trim() })),
                ),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hoarding_core::{Role, UserId};

    use super::*;
    use crate::pages::test_support::offline_context;

    fn token(id: &str, hoarding: &str, position: Option<u32>, owner: &str) -> BookingToken {
        BookingToken {
            id: Some(BookingTokenId::new(id)),
            hoarding_id: Some(HoardingId::new(hoarding)),
            queue_position: position,
            created_by: Some(UserId::new(owner)),
            ..BookingToken::default()
        }
    }

    #[test]
    fn test_queue_order() {
        let data = BookingsData {
            tokens: vec![
                token("t3", "h1", None, "u1"),
                token("t2", "h1", Some(2), "u1"),
                token("t1", "h1", Some(1), "u2"),
                token("t9", "h2", Some(1), "u1"),
            ],
            ..BookingsData::default()
        };
        let queue: Vec<_> = data
            .queue_for(&HoardingId::new("h1"))
            .into_iter()
            .filter_map(|t| t.id.as_ref().map(BookingTokenId::as_str))
            .collect();
        assert_eq!(queue, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_hoarding_title() {
        let data = BookingsData {
            hoardings: vec![Hoarding {
                id: Some(HoardingId::new("h1")),
                title: Some("Station Road".into()),
                ..Hoarding::default()
            }],
            ..BookingsData::default()
        };
        assert_eq!(data.hoarding_title(Some(&HoardingId::new("h1"))), "Station Road");
        assert_eq!(data.hoarding_title(Some(&HoardingId::new("h2"))), "h2");
        assert_eq!(data.hoarding_title(None), "Unknown hoarding");
    }

    #[test]
    fn test_form_validation() {
        let form = BookingForm {
            hoarding_id: Some(HoardingId::new("h1")),
            client_name: "Acme".into(),
            start_date: "2026-03-01".into(),
            end_date: "2026-02-01".into(),
            ..BookingForm::default()
        };
        let errors = form.validate(true).unwrap_err();
        assert!(errors.message_for("endDate").is_some());
        assert!(errors.message_for("amount").is_some());
        assert!(form.validate(false).is_err());

        let fixed = BookingForm {
            end_date: "2026-03-31".into(),
            ..form
        };
        assert!(fixed.validate(false).is_ok());
        assert_eq!(fixed.to_body()["hoardingId"], json!("h1"));
    }

    #[test]
    fn test_token_ownership() {
        let (ctx, _) = offline_context(Some(Role::Sales));
        let page = BookingsPage::new(ctx);
        assert!(page.can_create_token());
        assert!(page.can_manage_token(&token("t1", "h1", Some(1), "u1")));
        assert!(!page.can_manage_token(&token("t2", "h1", Some(2), "u2")));

        let (ctx, _) = offline_context(Some(Role::Manager));
        let page = BookingsPage::new(ctx);
        assert!(page.can_manage_token(&token("t2", "h1", Some(2), "u2")));
    }

    #[tokio::test]
    async fn test_designer_cannot_book() {
        let (ctx, _) = offline_context(Some(Role::Designer));
        let page = BookingsPage::new(ctx);
        let result = page.create_booking(&BookingForm::default()).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_validates_before_dispatch() {
        let (ctx, _) = offline_context(Some(Role::Sales));
        let page = BookingsPage::new(ctx);
        let result = page.create_token(&BookingForm::default()).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
