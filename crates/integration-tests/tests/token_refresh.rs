//! Single refresh-and-retry on 401.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::Ordering;

use hoarding_client::ApiError;
use hoarding_client::routes::Route;
use hoarding_client::session::Session;
use hoarding_client::SessionStore;
use hoarding_core::Role;
use hoarding_integration_tests::MockBackend;
use secrecy::ExposeSecret;

#[tokio::test]
async fn test_expired_token_is_refreshed_once_and_retried() {
    let backend = MockBackend::start().await;
    let session = backend.session(&backend.current_access_token(), Role::Sales);
    backend.expire_access_token();
    let (api, navigator) = backend.client(session.clone());

    let body = api.get("/hoardings").await.unwrap();

    assert!(body["data"]["data"]["hoardings"].is_array());
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.count("GET /api/hoardings"), 2);
    assert_eq!(
        session.access_token().unwrap().expose_secret(),
        backend.current_access_token()
    );
    assert_eq!(
        session.refresh_token().unwrap().expose_secret(),
        backend.current_refresh_token()
    );
    assert!(session.current_user().is_some());
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn test_valid_token_needs_no_refresh() {
    let backend = MockBackend::start().await;
    let (ctx, _) = backend.signed_in(Role::Manager);

    ctx.api.get("/bookings").await.unwrap();

    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(backend.requests(), vec!["GET /api/bookings"]);
}

#[tokio::test]
async fn test_second_401_is_not_retried_again() {
    let backend = MockBackend::start().await;
    let (ctx, navigator) = backend.signed_in(Role::Sales);
    backend.state.reject_all.store(true, Ordering::SeqCst);

    let result = ctx.api.get("/hoardings").await;

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.count("GET /api/hoardings"), 2);
    // The refresh itself succeeded, so the session survives.
    assert!(ctx.api.session().is_authenticated());
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn test_failed_refresh_signs_out_and_redirects() {
    let backend = MockBackend::start().await;
    let session = backend.session("stale", Role::Sales);
    backend.state.refresh_fails.store(true, Ordering::SeqCst);
    let (api, navigator) = backend.client(session.clone());
    let device_id = session.device_id().to_owned();

    let result = api.get("/hoardings").await;

    assert!(matches!(result, Err(ApiError::SessionExpired)));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.count("GET /api/hoardings"), 1);
    assert!(!session.is_authenticated());
    assert!(session.refresh_token().is_none());
    assert_eq!(session.device_id(), device_id);
    assert_eq!(navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_without_refresh_token_the_401_is_reported() {
    let backend = MockBackend::start().await;
    let session = SessionStore::in_memory();
    session.set(Session::new("stale"));
    let (api, navigator) = backend.client(session.clone());

    let result = api.get("/hoardings").await;

    match result {
        Err(ApiError::Unauthorized { body }) => {
            assert_eq!(body.unwrap()["message"], "Token expired");
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert_eq!(backend.refresh_calls(), 0);
    assert!(session.is_authenticated());
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let backend = MockBackend::start().await;
    let session = backend.session(&backend.current_access_token(), Role::Manager);
    backend.expire_access_token();
    let (api, _) = backend.client(session);

    let (a, b, c) = futures::join!(
        api.get("/hoardings"),
        api.get("/bookings"),
        api.get("/notifications"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(backend.refresh_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_401s_with_dead_refresh_token_refresh_once() {
    let backend = MockBackend::start().await;
    let session = backend.session("stale", Role::Manager);
    backend.state.refresh_fails.store(true, Ordering::SeqCst);
    let (api, navigator) = backend.client(session.clone());

    let (a, b, c) = futures::join!(
        api.get("/hoardings"),
        api.get("/bookings"),
        api.get("/notifications"),
    );

    assert!(a.is_err() && b.is_err() && c.is_err());
    assert_eq!(backend.refresh_calls(), 1);
    assert!(!session.is_authenticated());
    assert_eq!(navigator.routes(), vec![Route::Login]);
}
