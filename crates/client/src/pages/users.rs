//! Admin settings: staff accounts and roles.
//!
//! The whole page needs the `accessAdminSettings` capability.

use hoarding_core::models::{RoleRecord, User};
use hoarding_core::rbac;
use hoarding_core::{Role, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use super::{LoadState, Loader, PageContext, PageError, compact};
use crate::api::ApiError;
use crate::forms::{ValidationErrors, Validator};

const USERS: &str = "/users";
const ROLES: &str = "/roles";

/// Minimum length for a new account's password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsersData {
    pub users: Vec<User>,
    pub roles: Vec<RoleRecord>,
}

impl UsersData {
    /// Roles offered when creating or editing a user: those the backend
    /// lists that this client knows, or every role if it lists none.
    #[must_use]
    pub fn assignable_roles(&self) -> Vec<Role> {
        let mut known: Vec<Role> = self.roles.iter().filter_map(RoleRecord::known_role).collect();
        known.sort();
        known.dedup();
        if known.is_empty() {
            Role::ALL.to_vec()
        } else {
            known
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Option<Role>,
    pub password: Option<SecretString>,
}

impl UserForm {
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let password = self
            .password
            .as_ref()
            .map(|p| p.expose_secret().chars().count())
            .unwrap_or_default();
        Validator::new()
            .required("name", &self.name)
            .email("email", &self.email)
            .present("role", self.role.as_ref())
            .check(
                "password",
                password >= MIN_PASSWORD_LENGTH,
                "must be at least 8 characters",
            )
            .finish()
    }

    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        compact(json!({
            "name": self.name.trim(),
            "email": self.email.trim().to_lowercase(),
            "phone": self.phone.trim(),
            "role": self.role,
            "password": self.password.as_ref().map(ExposeSecret::expose_secret),
        }))
    }
}

#[derive(Debug)]
pub struct UsersPage {
    ctx: PageContext,
    loader: Loader<UsersData>,
}

impl UsersPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            loader: Loader::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> LoadState<UsersData> {
        self.loader.state()
    }

    pub fn unmount(&self) {
        self.loader.unmount();
    }

    pub async fn load(&self) -> LoadState<UsersData> {
        self.loader
            .run(async {
                self.ctx
                    .require_access("admin settings", rbac::can_access_admin_settings)?;
                let (users, roles) = futures::join!(
                    self.ctx.list::<User>(USERS),
                    self.ctx.list::<RoleRecord>(ROLES),
                );
                Ok::<_, PageError>(UsersData {
                    users: self.ctx.settle("users", users),
                    roles: self.ctx.settle("roles", roles),
                })
            })
            .await
    }

    fn allowed(&self) -> bool {
        rbac::can_access_admin_settings(self.ctx.role())
    }

    /// # Errors
    ///
    /// Returns `Forbidden` or `Validation` without contacting the backend,
    /// or the request error.
    pub async fn create_user(&self, form: &UserForm) -> Result<(), ApiError> {
        self.ctx.permit(self.allowed(), "create users")?;
        form.validate().map_err(ApiError::Validation)?;
        self.ctx
            .mutate("User created", self.ctx.api.post(USERS, &form.to_body()))
            .await?;
        self.load().await;
        Ok(())
    }

    /// Give `user` a new role. Changing your own role is refused so an
    /// admin cannot lock themselves out.
    ///
    /// # Errors
    ///
    /// As [`UsersPage::create_user`].
    pub async fn change_role(&self, user: &UserId, role: Role) -> Result<(), ApiError> {
        self.ctx.permit(self.allowed(), "change roles")?;
        let own = self
            .ctx
            .api
            .session()
            .current_user()
            .is_some_and(|me| &me.id == user);
        if own {
            return Err(ApiError::Validation(ValidationErrors::single(
                "role",
                "you cannot change your own role",
            )));
        }
        self.ctx
            .mutate(
                "Role updated",
                self.ctx
                    .api
                    .patch(&format!("{USERS}/{user}"), &json!({ "role": role })),
            )
            .await?;
        self.load().await;
        Ok(())
    }

    /// Enable or disable an account.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` without contacting the backend, or the request
    /// error.
    pub async fn set_active(&self, user: &UserId, active: bool) -> Result<(), ApiError> {
        self.ctx.permit(self.allowed(), "update users")?;
        let message = if active { "User enabled" } else { "User disabled" };
        self.ctx
            .mutate(
                message,
                self.ctx
                    .api
                    .patch(&format!("{USERS}/{user}"), &json!({ "isActive": active })),
            )
            .await?;
        self.load().await;
        Ok(())
    }
}
