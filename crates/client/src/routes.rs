//! Path-based navigation with role-gated access.

use std::fmt;

use hoarding_core::Role;
use hoarding_core::rbac::{self, Resource};

use crate::session::SessionUser;

/// Every page of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Hoardings,
    Bookings,
    Contracts,
    Proposals,
    Enquiries,
    Clients,
    Notifications,
    Location,
    Rent,
    Tasks,
    Users,
    Settings,
}

impl Route {
    /// Routes shown in the navigation menu, in menu order.
    pub const MENU: [Self; 13] = [
        Self::Dashboard,
        Self::Hoardings,
        Self::Bookings,
        Self::Contracts,
        Self::Proposals,
        Self::Enquiries,
        Self::Clients,
        Self::Tasks,
        Self::Location,
        Self::Rent,
        Self::Notifications,
        Self::Users,
        Self::Settings,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Hoardings => "/hoardings",
            Self::Bookings => "/bookings",
            Self::Contracts => "/contracts",
            Self::Proposals => "/proposals",
            Self::Enquiries => "/enquiries",
            Self::Clients => "/clients",
            Self::Notifications => "/notifications",
            Self::Location => "/location",
            Self::Rent => "/rent",
            Self::Tasks => "/tasks",
            Self::Users => "/users",
            Self::Settings => "/settings",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Dashboard => "Dashboard",
            Self::Hoardings => "Hoardings",
            Self::Bookings => "Bookings",
            Self::Contracts => "Contracts",
            Self::Proposals => "Proposals",
            Self::Enquiries => "Enquiries",
            Self::Clients => "Clients",
            Self::Notifications => "Notifications",
            Self::Location => "Location",
            Self::Rent => "Rent",
            Self::Tasks => "Tasks",
            Self::Users => "Users & Roles",
            Self::Settings => "Settings",
        }
    }

    /// Resolve a path, including detail paths such as `/hoardings/h1`.
    ///
    /// `/` resolves to the dashboard.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let first = path.trim_matches('/').split('/').next().unwrap_or_default();
        if first.is_empty() {
            return Some(Self::Dashboard);
        }
        [Self::Login]
            .into_iter()
            .chain(Self::MENU)
            .find(|route| route.path().trim_start_matches('/') == first)
    }

    /// Whether the route needs a signed-in user.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Whether `role` may open this route.
    #[must_use]
    pub fn is_allowed(self, role: Option<Role>) -> bool {
        match self {
            Self::Login => true,
            Self::Dashboard => role.is_some(),
            Self::Hoardings => rbac::can_read(role, Resource::Hoardings),
            Self::Bookings => rbac::can_read(role, Resource::Bookings),
            Self::Contracts => rbac::can_read(role, Resource::Contracts),
            Self::Proposals => rbac::can_read(role, Resource::Proposals),
            Self::Enquiries => rbac::can_read(role, Resource::Enquiries),
            Self::Clients => rbac::can_read(role, Resource::Clients),
            Self::Notifications => rbac::can_read(role, Resource::Notifications),
            Self::Location => {
                rbac::can_create(role, Resource::LocationCheckIns)
                    || rbac::can_access_location_tracking(role)
            }
            Self::Rent => rbac::can_view_rent(role),
            Self::Tasks => rbac::can_read(role, Resource::Tasks),
            Self::Users | Self::Settings => rbac::can_access_admin_settings(role),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of opening a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    AccessDenied(Route),
    RedirectToLogin,
    NotFound,
}

/// Decide what opening `path` shows for `user`.
#[must_use]
pub fn guard(path: &str, user: Option<&SessionUser>) -> RouteDecision {
    let Some(route) = Route::from_path(path) else {
        return RouteDecision::NotFound;
    };
    if !route.is_protected() {
        return RouteDecision::Render(route);
    }
    let Some(user) = user else {
        return RouteDecision::RedirectToLogin;
    };
    if route.is_allowed(user.role) {
        RouteDecision::Render(route)
    } else {
        tracing::debug!(route = route.path(), role = ?user.role, "route denied");
        RouteDecision::AccessDenied(route)
    }
}

/// Menu entries visible to `role`.
#[must_use]
pub fn navigation(role: Option<Role>) -> Vec<Route> {
    Route::MENU
        .into_iter()
        .filter(|route| route.is_allowed(role))
        .collect()
}

/// Performs navigation on behalf of the client, e.g. the forced redirect to
/// the login page when a session cannot be refreshed.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator for headless use: records the redirect in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(route = route.path(), "navigating");
    }
}

#[cfg(test)]
mod tests {
    use hoarding_core::UserId;

    use super::*;

    fn user(role: Option<Role>) -> SessionUser {
        SessionUser {
            id: UserId::new("u1"),
            name: None,
            role,
            email: None,
        }
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/hoardings/h1"), Some(Route::Hoardings));
        assert_eq!(Route::from_path("/rent?month=3"), Some(Route::Rent));
        assert_eq!(Route::from_path("login"), Some(Route::Login));
        assert_eq!(Route::from_path("/warehouse"), None);
    }

    #[test]
    fn test_guard_without_session() {
        assert_eq!(guard("/bookings", None), RouteDecision::RedirectToLogin);
        assert_eq!(guard("/login", None), RouteDecision::Render(Route::Login));
        assert_eq!(guard("/nope", None), RouteDecision::NotFound);
    }

    #[test]
    fn test_guard_by_role() {
        let fitter = user(Some(Role::Fitter));
        assert_eq!(
            guard("/tasks", Some(&fitter)),
            RouteDecision::Render(Route::Tasks)
        );
        assert_eq!(
            guard("/rent", Some(&fitter)),
            RouteDecision::AccessDenied(Route::Rent)
        );

        let accountant = user(Some(Role::Accountant));
        assert_eq!(
            guard("/rent", Some(&accountant)),
            RouteDecision::Render(Route::Rent)
        );
        assert_eq!(
            guard("/settings", Some(&accountant)),
            RouteDecision::AccessDenied(Route::Settings)
        );
    }

    #[test]
    fn test_unknown_role_gets_nothing() {
        let nobody = user(None);
        assert_eq!(
            guard("/dashboard", Some(&nobody)),
            RouteDecision::AccessDenied(Route::Dashboard)
        );
        assert!(navigation(None).is_empty());
    }

    #[test]
    fn test_admin_routes_match_user_visibility() {
        for role in Role::ALL {
            assert_eq!(
                Route::Users.is_allowed(Some(role)),
                rbac::can_read(Some(role), Resource::Users),
                "{role}"
            );
        }
        assert!(!Route::Users.is_allowed(Some(Role::Manager)));
    }

    #[test]
    fn test_navigation() {
        assert_eq!(navigation(Some(Role::Owner)), Route::MENU.to_vec());

        let designer = navigation(Some(Role::Designer));
        assert!(designer.contains(&Route::Tasks));
        assert!(designer.contains(&Route::Proposals));
        assert!(!designer.contains(&Route::Location));
        assert!(!designer.contains(&Route::Users));
    }
}
