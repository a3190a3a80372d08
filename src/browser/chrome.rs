//! Chromium backend driven over the DevTools protocol.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::browser::actions::{CellMarker, PageActions, ResourceRelease};
use crate::error::{Error, Result};
use crate::session::SessionCookie;

/// Selector of rendered timeline cells in the main listing.
const CELL_SELECTOR: &str = r#"section div[data-testid="cellInnerDiv"]"#;

/// Content key of a cell: its status link, else its leading text, else its position.
const CELL_KEY_FN: &str = r#"function cellKey(cell, index) {
    const link = cell.querySelector('a[href*="/status/"]');
    if (link) return 'link:' + link.getAttribute('href');
    const text = (cell.textContent || '').trim();
    if (text) return 'text:' + text.slice(0, 256);
    return 'index:' + index;
}"#;

const DISMISS_DIALOG_JS: &str = r#"(() => {
    const dialog = document.querySelector('[data-testid="sheetDialog"]');
    if (!dialog) return false;
    dialog.querySelectorAll('[data-testid="app-bar-close"]').forEach((el) => el.click());
    return true;
})()"#;

/// Browser launch settings.
#[derive(Debug, Clone, Default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub executable: Option<PathBuf>,
}

/// A launched Chromium instance plus the tasks that depend on it.
pub struct ChromeBrowser {
    browser: AsyncMutex<Option<Browser>>,
    handler: JoinHandle<()>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl ChromeBrowser {
    /// Launch a browser and start driving its protocol handler.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = chromiumoxide::BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {}", e);
                }
            }
        });

        tracing::debug!("Browser launched (headless: {})", settings.headless);

        Ok(Self {
            browser: AsyncMutex::new(Some(browser)),
            handler,
            tasks: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Open a blank page.
    pub async fn new_page(&self) -> Result<Page> {
        let guard = self.browser.lock().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| Error::Browser("browser already closed".into()))?;
        Ok(browser.new_page("about:blank").await?)
    }

    /// Tie a background task to the browser's lifetime.
    pub fn track(&self, task: JoinHandle<()>) {
        self.tasks.lock().push(task);
    }
}

#[async_trait]
impl ResourceRelease for ChromeBrowser {
    async fn release(&self) -> Result<()> {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }

        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            tracing::debug!("Failed to reap browser process: {}", e);
        }
        self.handler.abort();

        closed.map(|_| ()).map_err(Error::from)
    }
}

/// [`PageActions`] backed by script evaluation on a live page.
#[derive(Clone)]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn evaluate(&self, expression: String) -> Result<Option<serde_json::Value>> {
        let result = self.page.evaluate(expression).await?;
        Ok(result.value().cloned())
    }
}

#[async_trait]
impl PageActions for ChromePage {
    async fn dismiss_dialog(&self) -> Result<bool> {
        let value = self.evaluate(DISMISS_DIALOG_JS.to_string()).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn last_cell(&self) -> Result<Option<CellMarker>> {
        let expression = format!(
            "(() => {{
                {cell_key}
                const cells = document.querySelectorAll('{selector}');
                if (cells.length === 0) return null;
                return cellKey(cells[cells.length - 1], cells.length - 1);
            }})()",
            cell_key = CELL_KEY_FN,
            selector = CELL_SELECTOR,
        );

        let value = self.evaluate(expression).await?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_str())
            .map(CellMarker::new))
    }

    async fn scroll_into_view(&self, marker: &CellMarker) -> Result<()> {
        let expression = format!(
            "(() => {{
                {cell_key}
                const key = {key};
                const cells = Array.from(document.querySelectorAll('{selector}'));
                for (let i = cells.length - 1; i >= 0; i--) {{
                    if (cellKey(cells[i], i) === key) {{
                        cells[i].scrollIntoView();
                        return true;
                    }}
                }}
                if (cells.length === 0) return false;
                cells[cells.length - 1].scrollIntoView();
                return true;
            }})()",
            cell_key = CELL_KEY_FN,
            key = serde_json::to_string(marker.as_str())?,
            selector = CELL_SELECTOR,
        );

        self.evaluate(expression).await?;
        Ok(())
    }
}

/// Attach session cookies to a page before any navigation.
pub async fn set_session_cookies(page: &Page, cookies: &[SessionCookie]) -> Result<()> {
    let params: Vec<CookieParam> = cookies.iter().map(to_cookie_param).collect();
    page.execute(SetCookiesParams::new(params)).await?;
    Ok(())
}

/// Read the cookies visible to the page's current URL.
pub async fn page_cookies(page: &Page) -> Result<Vec<SessionCookie>> {
    let cookies = page.get_cookies().await?;
    Ok(cookies.iter().map(from_cookie).collect())
}

fn to_cookie_param(cookie: &SessionCookie) -> CookieParam {
    let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
    param.domain = Some(cookie.domain.clone());
    param.path = Some(cookie.path.clone());
    param.secure = Some(cookie.secure);
    param.http_only = Some(cookie.http_only);
    if cookie.expires > 0.0 {
        param.expires = Some(TimeSinceEpoch::new(cookie.expires));
    }
    param
}

fn from_cookie(cookie: &Cookie) -> SessionCookie {
    SessionCookie {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        expires: cookie.expires,
        http_only: cookie.http_only,
        secure: cookie.secure,
    }
}
