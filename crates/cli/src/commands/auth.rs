//! Sign-in commands.

use std::io::BufRead;

use hoarding_client::ApiClient;
use secrecy::SecretString;

use super::{CliError, line};

fn read_password() -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var("HOARDING_PASSWORD") {
        return Ok(SecretString::from(password));
    }
    tracing::info!("reading password from stdin");
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        return Err(CliError::Usage(
            "no password given (set HOARDING_PASSWORD or pipe it on stdin)".to_owned(),
        ));
    }
    Ok(SecretString::from(password))
}

pub async fn login(api: &ApiClient, email: &str) -> Result<(), CliError> {
    let password = read_password()?;
    let user = api.login(email, &password).await?;
    line(&format!(
        "Signed in as {} ({})",
        user.display_name(),
        user.role.map_or("no role", |role| role.label())
    ))
}

pub async fn logout(api: &ApiClient) {
    api.logout().await;
}

pub fn whoami(api: &ApiClient) -> Result<(), CliError> {
    let Some(user) = api.session().current_user() else {
        return line("Not signed in");
    };
    line(&format!(
        "{} <{}> {}",
        user.display_name(),
        user.email.as_deref().unwrap_or("no email"),
        user.role.map_or("no role", |role| role.label())
    ))
}
