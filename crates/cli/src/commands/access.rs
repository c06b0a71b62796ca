//! Permission and navigation queries.

use hoarding_client::ApiClient;
use hoarding_client::routes::navigation;
use hoarding_core::rbac;

use super::{CliError, line};

/// Print `allowed` or `denied`; unknown names deny.
pub fn can(role: &str, resource: &str, permission: &str) -> Result<(), CliError> {
    let allowed = rbac::check_names(role, resource, permission);
    tracing::debug!(role, resource, permission, allowed, "permission check");
    line(if allowed { "allowed" } else { "denied" })
}

pub fn menu(api: &ApiClient) -> Result<(), CliError> {
    for route in navigation(api.session().role()) {
        line(&format!("{:<16}{}", route.title(), route.path()))?;
    }
    Ok(())
}
