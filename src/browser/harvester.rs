//! Opening live media streams against timeline pages.

use std::sync::Arc;

use chromiumoxide::Page;
use regex::Regex;

use crate::browser::actions::ResourceRelease;
use crate::browser::chrome::{set_session_cookies, BrowserSettings, ChromeBrowser, ChromePage};
use crate::browser::intercept::spawn_interception;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::SessionCredential;
use crate::stream::{InterceptionChannel, MediaStream, ScrollDriver, StreamConfig, StreamSession};

/// Launches an authenticated browser per timeline and hands out its stream.
#[derive(Debug, Clone)]
pub struct Harvester {
    settings: BrowserSettings,
    endpoint: Regex,
    scroll: ScrollDriver,
    stream: StreamConfig,
}

impl Harvester {
    pub fn new(
        settings: BrowserSettings,
        endpoint: Regex,
        scroll: ScrollDriver,
        stream: StreamConfig,
    ) -> Self {
        Self {
            settings,
            endpoint,
            scroll,
            stream,
        }
    }

    /// Build a harvester from validated configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = Regex::new(&config.browser.timeline_endpoint).map_err(|e| {
            Error::ConfigValidation {
                field: "browser.timeline_endpoint".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self::new(
            config.browser_settings(),
            endpoint,
            ScrollDriver::new(config.timing.scroll_intervals()),
            config.timing.stream_config(),
        ))
    }

    /// Open a media stream for `url`, authenticated with `credential`.
    ///
    /// Returns `Ok(None)` when the stream could not be established (navigation
    /// failed or no timeline data arrived in time); the browser is already
    /// released in that case. Failing to launch or prepare a page is an error.
    pub async fn open(
        &self,
        url: &str,
        credential: &SessionCredential,
    ) -> Result<Option<MediaStream>> {
        let browser = ChromeBrowser::launch(&self.settings).await?;

        let page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                release_quietly(&browser).await;
                return Err(e);
            }
        };

        let session = StreamSession::new();
        let channel = InterceptionChannel::new(session.clone(), self.endpoint.clone());

        if let Err(e) = prepare_page(&browser, &page, credential, channel).await {
            release_quietly(&browser).await;
            return Err(e);
        }

        let startup = session.arm_arrival();
        let stream = MediaStream::new(
            session,
            Arc::new(ChromePage::new(page.clone())),
            Box::new(browser),
            self.scroll.clone(),
            self.stream.clone(),
        );

        tracing::debug!("Navigating to {}", url);
        if let Err(e) = page.goto(url).await {
            tracing::error!("Failed to navigate to {}: {}", url, e);
            stream.close().await;
            return Ok(None);
        }

        Ok(stream.establish(startup).await)
    }
}

async fn prepare_page(
    browser: &ChromeBrowser,
    page: &Page,
    credential: &SessionCredential,
    channel: InterceptionChannel,
) -> Result<()> {
    set_session_cookies(page, &credential.cookies).await?;
    let pump = spawn_interception(page, channel).await?;
    browser.track(pump);
    Ok(())
}

async fn release_quietly(browser: &ChromeBrowser) {
    if let Err(e) = browser.release().await {
        tracing::warn!("Failed to release browser: {}", e);
    }
}
