//! Page loading and mutations end to end.

#![allow(clippy::unwrap_used)]

use hoarding_client::pages::ToastLevel;
use hoarding_client::pages::bookings::BookingsPage;
use hoarding_client::pages::hoardings::{HoardingFilter, HoardingsPage};
use hoarding_client::pages::notifications::NotificationsPage;
use hoarding_core::models::HoardingStatus;
use hoarding_core::{HoardingId, NotificationId, Role};
use hoarding_integration_tests::MockBackend;

#[tokio::test]
async fn test_hoardings_load_through_nested_envelope() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Sales);
    let page = HoardingsPage::new(ctx);

    let state = page.load().await;

    let hoardings = state.data().unwrap();
    assert_eq!(hoardings.len(), 2);
    assert_eq!(hoardings[0].id, Some(HoardingId::new("h1")));
    assert_eq!(hoardings[1].id, Some(HoardingId::new("h2")));
    assert_eq!(hoardings[1].size_label(), "20 x 10 ft");
    let available = page.visible(&HoardingFilter {
        status: Some(HoardingStatus::Available),
        ..HoardingFilter::default()
    });
    assert_eq!(available.len(), 1);
}

#[tokio::test]
async fn test_one_failed_dataset_leaves_the_rest_loaded() {
    let backend = MockBackend::start().await;
    backend.fail("/api/booking-tokens");
    let (ctx, _) = backend.signed_in(Role::Sales);
    let toasts = ctx.toasts.clone();
    let page = BookingsPage::new(ctx);

    let state = page.load().await;

    let data = state.data().unwrap();
    assert_eq!(data.bookings.len(), 1);
    assert_eq!(data.hoardings.len(), 2);
    assert!(data.tokens.is_empty());
    assert_eq!(
        data.hoarding_title(data.bookings[0].hoarding_id.as_ref()),
        "FC Road Unipole"
    );
    let errors: Vec<_> = toasts
        .drain()
        .into_iter()
        .filter(|t| t.level == ToastLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Database unavailable"));
}

#[tokio::test]
async fn test_load_after_token_expiry_refreshes_once() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Manager);
    backend.expire_access_token();

    let state = BookingsPage::new(ctx).load().await;

    let data = state.data().unwrap();
    assert_eq!(data.tokens.len(), 1);
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_unmounted_page_drops_late_result() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Sales);
    let page = HoardingsPage::new(ctx);

    let (state, ()) = futures::join!(page.load(), async { page.unmount() });

    assert!(state.data().is_none());
    assert!(page.state().data().is_none());
}

#[tokio::test]
async fn test_mark_as_read_is_idempotent() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Fitter);
    let page = NotificationsPage::new(ctx);
    page.load().await;
    assert_eq!(page.unread(), 2);

    let n1 = NotificationId::new("n1");
    page.mark_as_read(&n1).await.unwrap();
    page.mark_as_read(&n1).await.unwrap();
    page.mark_as_read(&NotificationId::new("n2")).await.unwrap();

    assert_eq!(backend.count("PATCH /api/notifications/n1/read"), 1);
    assert_eq!(backend.count("PATCH /api/notifications/n2/read"), 0);
    assert_eq!(page.unread(), 1);
}

#[tokio::test]
async fn test_mark_all_as_read_once() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Accountant);
    let page = NotificationsPage::new(ctx);
    page.load().await;

    page.mark_all_as_read().await.unwrap();
    page.mark_all_as_read().await.unwrap();

    assert_eq!(backend.count("PATCH /api/notifications/read-all"), 1);
    assert_eq!(page.unread(), 0);
}
