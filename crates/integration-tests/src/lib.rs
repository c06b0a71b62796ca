//! Integration tests for the Hoarding Manager client.
//!
//! The client is exercised against [`MockBackend`], an in-process axum
//! server on an ephemeral port that mimics the REST backend: bearer auth,
//! refresh-token rotation, inconsistent response envelopes and injected
//! failures. Every request it receives is logged so tests can assert on
//! exactly what went over the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hoarding-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use hoarding_client::config::ClientConfig;
use hoarding_client::pages::PageContext;
use hoarding_client::routes::{Navigator, Route};
use hoarding_client::session::{Session, SessionUser};
use hoarding_client::{ApiClient, SessionStore};
use hoarding_core::{Role, UserId};
use serde_json::{Value, json};

/// Password the mock backend accepts for every account.
pub const PASSWORD: &str = "correct horse";

/// Shared state of the mock backend.
#[derive(Debug)]
pub struct MockState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    rotations: AtomicUsize,
    /// Calls to `POST /auth/refresh`.
    pub refresh_calls: AtomicUsize,
    /// Reject every refresh token.
    pub refresh_fails: AtomicBool,
    /// Reject every access token, even freshly issued ones.
    pub reject_all: AtomicBool,
    /// Include the user in the login response.
    pub login_returns_user: AtomicBool,
    /// Answer a successful login with an HTML page instead of JSON.
    pub login_returns_html: AtomicBool,
    /// `METHOD /path` of every request received, in order.
    requests: Mutex<Vec<String>>,
    /// Paths answered with a 500.
    failing: Mutex<HashSet<String>>,
    notifications: Mutex<Vec<Value>>,
    role: Mutex<String>,
}

impl MockState {
    fn new() -> Self {
        Self {
            access_token: Mutex::new("access-0".to_owned()),
            refresh_token: Mutex::new("refresh-0".to_owned()),
            rotations: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            refresh_fails: AtomicBool::new(false),
            reject_all: AtomicBool::new(false),
            login_returns_user: AtomicBool::new(true),
            login_returns_html: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            notifications: Mutex::new(vec![
                json!({"_id": "n1", "title": "Token expiring", "isRead": false}),
                json!({"_id": "n2", "title": "Booking confirmed", "isRead": true}),
                json!({"_id": "n3", "title": "Rent due", "isRead": false}),
            ]),
            role: Mutex::new("Sales".to_owned()),
        }
    }

    fn user(&self) -> Value {
        json!({
            "_id": "u1",
            "id": "u1",
            "name": "Asha Patil",
            "email": "asha@example.com",
            "role": {"name": self.role.lock().unwrap().clone()}
        })
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.reject_all.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.access_token.lock().unwrap());
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected)
    }

    fn record(&self, method: &Method, path: &str) {
        self.requests.lock().unwrap().push(format!("{method} {path}"));
    }

    fn rotate(&self) -> (String, String) {
        let n = self.rotations.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        access.clone_into(&mut self.access_token.lock().unwrap());
        refresh.clone_into(&mut self.refresh_token.lock().unwrap());
        (access, refresh)
    }
}

/// A running mock backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Start a backend on an ephemeral local port.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/logout", post(logout))
            .fallback(resource)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, app).await {
                tracing::error!(%error, "mock backend stopped");
            }
        });
        Self { addr, state }
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&format!("http://{}/api", self.addr)).unwrap()
    }

    /// Client over `session`, recording navigation.
    #[must_use]
    pub fn client(&self, session: SessionStore) -> (ApiClient, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let api = ApiClient::builder(self.config(), session)
            .navigator(navigator.clone())
            .build()
            .unwrap();
        (api, navigator)
    }

    /// A session holding `access_token` and the backend's current refresh
    /// token, for a user with `role`.
    #[must_use]
    pub fn session(&self, access_token: &str, role: Role) -> SessionStore {
        role.label().clone_into(&mut self.state.role.lock().unwrap());
        let store = SessionStore::in_memory();
        store.set(
            Session::new(access_token)
                .with_refresh_token(self.state.refresh_token.lock().unwrap().clone())
                .with_user(SessionUser {
                    id: UserId::new("u1"),
                    name: Some("Asha Patil".to_owned()),
                    role: Some(role),
                    email: Some("asha@example.com".to_owned()),
                }),
        );
        store
    }

    /// Page context for a signed-in user whose token the backend accepts.
    #[must_use]
    pub fn signed_in(&self, role: Role) -> (PageContext, Arc<RecordingNavigator>) {
        let token = self.current_access_token();
        let (api, navigator) = self.client(self.session(&token, role));
        (PageContext::new(api), navigator)
    }

    /// Invalidate the current access token. The refresh token stays valid.
    pub fn expire_access_token(&self) {
        let n = self.state.rotations.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.access_token.lock().unwrap() = format!("access-{n}");
    }

    #[must_use]
    pub fn current_access_token(&self) -> String {
        self.state.access_token.lock().unwrap().clone()
    }

    #[must_use]
    pub fn current_refresh_token(&self) -> String {
        self.state.refresh_token.lock().unwrap().clone()
    }

    /// Answer `path` (e.g. `/api/booking-tokens`) with a 500 from now on.
    pub fn fail(&self, path: &str) {
        self.state.failing.lock().unwrap().insert(path.to_owned());
    }

    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// How many times `request` (e.g. `GET /api/hoardings`) was received.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.requests().iter().filter(|r| *r == request).count()
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.state.refresh_calls.load(Ordering::SeqCst)
    }
}

/// Navigator that remembers every route it was sent to.
#[derive(Debug, Default)]
pub struct RecordingNavigator(Mutex<Vec<Route>>);

impl RecordingNavigator {
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.0.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.0.lock().unwrap().push(route);
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    (status, axum::Json(body.clone())).into_response()
}

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

async fn login(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.record(&Method::POST, "/api/auth/login");
    let body = parse_body(&body);
    if body["password"] != PASSWORD || body["deviceId"].as_str().is_none_or(str::is_empty) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &json!({"success": false, "message": "Invalid email or password"}),
        );
    }
    if state.login_returns_html.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html><body>Maintenance</body></html>").into_response();
    }
    let (access, refresh) = state.rotate();
    let mut data = json!({"accessToken": access, "refreshToken": refresh});
    if state.login_returns_user.load(Ordering::SeqCst) {
        data["user"] = state.user();
    }
    json_response(StatusCode::OK, &json!({"success": true, "data": data}))
}

async fn refresh(State(state): State<Arc<MockState>>, body: Bytes) -> Response {
    state.record(&Method::POST, "/api/auth/refresh");
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let body = parse_body(&body);
    let current = state.refresh_token.lock().unwrap().clone();
    if state.refresh_fails.load(Ordering::SeqCst) || body["refreshToken"] != current.as_str() {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &json!({"success": false, "message": "Refresh token expired"}),
        );
    }
    let (access, refresh) = state.rotate();
    json_response(
        StatusCode::OK,
        &json!({"data": {"accessToken": access, "refreshToken": refresh}}),
    )
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.record(&Method::POST, "/api/auth/logout");
    json_response(StatusCode::OK, &json!({"message": "Logged out"}))
}

async fn resource(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_owned();
    state.record(&method, &path);

    if !state.authorized(&headers) {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &json!({"success": false, "message": "Token expired"}),
        );
    }
    if state.failing.lock().unwrap().contains(&path) {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &json!({"success": false, "message": "Database unavailable"}),
        );
    }

    let segments: Vec<&str> = path.trim_start_matches("/api/").split('/').collect();
    let body = match (method.as_str(), segments.as_slice()) {
        ("GET", ["auth", "me"]) => json!({"data": {"user": state.user()}}),
        ("GET", ["hoardings"]) => json!({"success": true, "data": {"data": {"hoardings": [
            {"_id": "h1", "title": "Station Road Gantry", "city": "Pune", "status": "available", "rate": "45000"},
            {"_id": "h2", "id": "h2", "title": "FC Road Unipole", "city": "Pune", "status": "booked", "rate": 60000, "width": "20", "height": 10}
        ]}}}),
        ("GET", ["bookings"]) => json!({"data": [
            {"_id": "b1", "hoarding": {"_id": "h2", "title": "FC Road Unipole"}, "clientName": "Shree Motors", "status": "confirmed", "createdBy": "u1"}
        ]}),
        ("GET", ["booking-tokens"]) => json!({"items": [
            {"_id": "t1", "hoardingId": "h1", "queueNumber": 1, "status": "active", "createdBy": "u1"}
        ]}),
        ("GET", ["notifications"]) => {
            json!({"data": {"notifications": state.notifications.lock().unwrap().clone()}})
        }
        ("PATCH", ["notifications", "read-all"]) => {
            for notification in state.notifications.lock().unwrap().iter_mut() {
                notification["isRead"] = json!(true);
            }
            json!({"success": true, "message": "All notifications marked as read"})
        }
        ("PATCH", ["notifications", id, "read"]) => {
            for notification in state.notifications.lock().unwrap().iter_mut() {
                if notification["_id"] == *id {
                    notification["isRead"] = json!(true);
                }
            }
            json!({"success": true})
        }
        (_, [..]) => json!({"success": true, "data": []}),
    };
    json_response(StatusCode::OK, &body)
}
