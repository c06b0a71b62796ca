//! Sign-in, sign-out and token refresh.

use hoarding_core::Email;
use hoarding_core::envelope::{extract_one_named, find_string};
use hoarding_core::models::{Record, User};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use super::{ApiClient, ApiError};
use crate::forms::{ValidationErrors, Validator};
use crate::routes::Route;
use crate::session::{Session, SessionUser};

const ACCESS_TOKEN_KEYS: &[&str] = &["accessToken", "token", "access_token"];
const REFRESH_TOKEN_KEYS: &[&str] = &["refreshToken", "refresh_token"];

/// Body of `POST /auth/login`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub device_id: &'a str,
}

/// Tokens returned by `POST /auth/refresh`.
pub(super) struct RefreshedTokens {
    pub access_token: SecretString,
    /// Present when the backend rotates refresh tokens.
    pub refresh_token: Option<SecretString>,
}

/// Exchange a refresh token for a new access token.
///
/// Sent without a bearer token and never retried.
///
/// # Errors
///
/// Returns `ApiError::Status` if the backend rejects the refresh token and
/// `ApiError::Malformed` if the response carries no access token.
#[instrument(skip(client, refresh_token))]
pub(super) async fn request_token_refresh(
    client: &reqwest::Client,
    url: &Url,
    refresh_token: &SecretString,
) -> Result<RefreshedTokens, ApiError> {
    let response = client
        .post(url.clone())
        .json(&json!({ "refreshToken": refresh_token.expose_secret() }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: response.json::<Value>().await.ok(),
        });
    }

    let body = json_body(response).await?;
    let access_token = find_string(&body, ACCESS_TOKEN_KEYS)
        .ok_or_else(|| ApiError::Malformed("refresh response carried no access token".into()))?;

    Ok(RefreshedTokens {
        access_token: SecretString::from(access_token),
        refresh_token: find_string(&body, REFRESH_TOKEN_KEYS).map(SecretString::from),
    })
}

/// Read a success body that must be JSON.
///
/// A body that is not JSON is a `Parse` error, not a transport one.
async fn json_body(response: reqwest::Response) -> Result<Value, ApiError> {
    let bytes = response.bytes().await?;
    decode_body(&bytes)
}

fn decode_body(bytes: &[u8]) -> Result<Value, ApiError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn user_from(body: &Value) -> Option<SessionUser> {
    let user = extract_one_named(body, Some("user")).and_then(User::decode)?;
    Some(SessionUser {
        id: user.id?,
        name: user.name,
        role: user.role,
        email: user.email,
    })
}

impl ApiClient {
    /// Sign in and store the new session.
    ///
    /// Input is validated before anything is sent. When the login response
    /// carries no usable profile it is fetched from `/auth/me`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a malformed email or empty
    /// password, `ApiError::Unauthorized` for rejected credentials and
    /// `ApiError::Malformed` if the response carries no access token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SessionUser, ApiError> {
        Validator::new()
            .email("email", email)
            .required("password", password.expose_secret())
            .finish()
            .map_err(ApiError::Validation)?;
        let email = Email::parse(email)
            .map_err(|e| ApiError::Validation(ValidationErrors::single("email", e.to_string())))?;

        let url = self.config().endpoint("/auth/login")?;
        let response = self
            .http()
            .post(url)
            .json(&LoginRequest {
                email: email.as_str(),
                password: password.expose_secret(),
                device_id: self.session().device_id(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized {
                body: response.json::<Value>().await.ok(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: response.json::<Value>().await.ok(),
            });
        }

        let body = json_body(response).await?;
        let access_token = find_string(&body, ACCESS_TOKEN_KEYS)
            .ok_or_else(|| ApiError::Malformed("login response carried no access token".into()))?;

        let mut session = Session::new(access_token);
        session.refresh_token = find_string(&body, REFRESH_TOKEN_KEYS).map(SecretString::from);
        session.user = user_from(&body);
        let needs_profile = session.user.is_none();
        self.session().set(session);

        let user = if needs_profile {
            match self.me().await {
                Ok(user) => user,
                Err(error) => {
                    self.session().clear();
                    return Err(error);
                }
            }
        } else {
            self.session()
                .current_user()
                .ok_or(ApiError::NotAuthenticated)?
        };

        tracing::info!(user_id = %user.id, role = ?user.role, "signed in");
        Ok(user)
    }

    /// Fetch the signed-in profile and store it in the session.
    ///
    /// # Errors
    ///
    /// Returns any request error, or `ApiError::Malformed` if the response
    /// holds no profile.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        let body = self.get("/auth/me").await?;
        let user = user_from(&body)
            .ok_or_else(|| ApiError::Malformed("profile response carried no user".into()))?;

        if let Some(session) = self.session().get() {
            self.session().set(session.with_user(user.clone()));
        }
        Ok(user)
    }

    /// Sign out: tell the backend (best effort), drop the session and go to
    /// the login page.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(token) = self.session().access_token() {
            let refresh = self.session().refresh_token();
            let body = json!({
                "refreshToken": refresh.as_ref().map(ExposeSecret::expose_secret),
            });
            match self.config().endpoint("/auth/logout") {
                Ok(url) => {
                    let result = self
                        .http()
                        .post(url)
                        .bearer_auth(token.expose_secret())
                        .json(&body)
                        .send()
                        .await;
                    if let Err(error) = result {
                        tracing::debug!(%error, "logout request failed");
                    }
                }
                Err(error) => tracing::debug!(%error, "invalid logout url"),
            }
        }

        self.session().clear();
        self.navigate(Route::Login);
        tracing::info!("signed out");
    }
}
