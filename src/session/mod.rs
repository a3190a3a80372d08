//! Session module.
//!
//! Provides:
//! - Cookie credential and validity checks
//! - Persisted session storage
//! - Interactive login

pub mod credential;
pub mod login;
pub mod store;

pub use credential::{SessionCookie, SessionCredential, AUTH_COOKIE, CSRF_COOKIE};
pub use login::interactive_login;
pub use store::SessionStore;

use crate::config::Config;
use crate::error::{Error, Result};

/// Return a stored valid session, logging in interactively when needed.
pub async fn get_or_create_session(config: &Config, store: &SessionStore) -> Result<SessionCredential> {
    match store.load()? {
        Some(credential) if credential.is_valid() => return Ok(credential),
        Some(_) => tracing::info!("Existing session is no longer valid"),
        None => tracing::info!("No existing session found"),
    }

    let credential = interactive_login(
        &config.browser_settings(),
        &config.site.base_url,
        config.timing.login_poll(),
        config.timing.login_timeout(),
    )
    .await?;

    if !credential.is_valid() {
        return Err(Error::Session(
            "Failed to create a valid session, did you log in?".into(),
        ));
    }

    store.save(&credential)?;
    Ok(credential)
}
