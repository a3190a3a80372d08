//! Interactive login through a visible browser window.

use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::browser::{BrowserSettings, ChromeBrowser, ResourceRelease};
use crate::browser::chrome::page_cookies;
use crate::error::{Error, Result};
use crate::session::credential::SessionCredential;

/// Open the site in a visible browser and wait until the user has logged in.
///
/// Cookies are polled every `poll` until they form a valid session, or
/// until `limit` elapses.
pub async fn interactive_login(
    settings: &BrowserSettings,
    site_url: &str,
    poll: Duration,
    limit: Duration,
) -> Result<SessionCredential> {
    let settings = BrowserSettings {
        headless: false,
        ..settings.clone()
    };
    let browser = ChromeBrowser::launch(&settings).await?;

    let result = timeout(limit, wait_for_login(&browser, site_url, poll)).await;

    if let Err(e) = browser.release().await {
        tracing::warn!("Failed to close login browser: {}", e);
    }

    match result {
        Ok(credential) => credential,
        Err(_) => Err(Error::LoginTimeout(limit.as_secs())),
    }
}

async fn wait_for_login(
    browser: &ChromeBrowser,
    site_url: &str,
    poll: Duration,
) -> Result<SessionCredential> {
    let page = browser.new_page().await?;
    page.goto(site_url).await?;

    tracing::info!("Waiting for login in the browser window...");

    loop {
        let credential = SessionCredential::new(page_cookies(&page).await?);
        if credential.is_valid() {
            tracing::info!("Login detected");
            return Ok(credential);
        }
        sleep(poll).await;
    }
}
