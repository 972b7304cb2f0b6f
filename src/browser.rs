//! Headless Chrome session via chromiumoxide

use anyhow::{anyhow, bail, Context, Result};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

use crate::links::{AnchorSource, PageAnchors};

/// A running headless Chrome, launched once per scan.
///
/// Must be released with [`BrowserSession::close`]; the CDP handler task
/// lives exactly as long as the session.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: String,
    timeout: Duration,
}

impl BrowserSession {
    /// Launch headless Chrome
    pub async fn launch(user_agent: &str, timeout: Duration) -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--headless=new")
            .request_timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Browser config error: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome. Is Chrome/Chromium installed?")?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        tracing::debug!("browser session started");

        Ok(Self {
            browser,
            handler,
            user_agent: user_agent.to_string(),
            timeout,
        })
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed.context("Failed to close Chrome")?;
        tracing::debug!("browser session closed");
        Ok(())
    }
}

impl AnchorSource for BrowserSession {
    /// Load `url` in a fresh tab and read the `href` of every anchor.
    ///
    /// Scripts on the page run before the DOM is queried. The resolved
    /// `href` property is preferred; the raw attribute is the fallback.
    async fn anchor_hrefs(&self, url: &str) -> Result<PageAnchors> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(SetUserAgentOverrideParams::new(self.user_agent.as_str()))
            .await?;

        match tokio::time::timeout(self.timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let msg = e.to_string();
                bail!("Failed to load {}: {} ({})", url, classify_error(&msg), msg);
            }
            Err(_) => bail!("Failed to load {}: navigation timeout", url),
        }

        let elements = page
            .find_elements("a")
            .await
            .with_context(|| format!("Failed to query anchors on {}", url))?;

        // The DOM property is already resolved against <base> and the page URL.
        let mut hrefs = Vec::with_capacity(elements.len());
        for element in &elements {
            let href = match element.property("href").await? {
                Some(value) => value.as_str().map(String::from),
                None => None,
            };
            let href = match href {
                Some(href) => Some(href),
                None => element.attribute("href").await?,
            };
            hrefs.push(href);
        }

        let base = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|u| Url::parse(&u).ok())
            .or_else(|| Url::parse(url).ok());

        page.close().await?;

        Ok(PageAnchors { hrefs, base })
    }
}

fn classify_error(error: &str) -> &'static str {
    if error.contains("ERR_NAME_NOT_RESOLVED") {
        "DNS_FAILED"
    } else if error.contains("ERR_CONNECTION_REFUSED") {
        "CONNECTION_REFUSED"
    } else if error.contains("ERR_CONNECTION_TIMED_OUT") {
        "TIMEOUT"
    } else if error.contains("ERR_CERT") || error.contains("SSL") {
        "SSL_ERROR"
    } else {
        "NETWORK_ERROR"
    }
}
