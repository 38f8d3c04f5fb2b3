//! Chromium-based page reader using chromiumoxide.
//!
//! Runs a persistent browser profile so the reservation site's login session
//! survives restarts. The profile directory is created by `slotwatch login`
//! and reused headless by `slotwatch watch`.

use super::PageReader;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Desktop user agent presented while watching headless.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/124.0.0.0 Safari/537.36";

/// Find the Chrome/Chromium binary path.
pub fn find_chrome() -> Option<PathBuf> {
    // 1. WATCH_CHROME_PATH env
    if let Ok(p) = std::env::var("WATCH_CHROME_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Remove stale singleton lock files left by an unclean shutdown.
///
/// Chrome refuses to reuse a profile directory while these exist.
pub fn cleanup_stale_locks(profile_dir: &Path) {
    for name in ["SingletonLock", "SingletonCookie", "SingletonSocket"] {
        let p = profile_dir.join(name);
        if p.exists() {
            if let Err(e) = std::fs::remove_file(&p) {
                debug!("could not remove stale lock {}: {e}", p.display());
            }
        }
    }
}

/// A persistent-profile Chromium session holding one page.
pub struct ChromiumReader {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromiumReader {
    /// Launch Chromium against `profile_dir` and open a blank page.
    ///
    /// `headed` opens a visible window (used by `slotwatch login`); otherwise
    /// the browser runs headless with an automation-masking configuration.
    pub async fn launch(profile_dir: &Path, headed: bool) -> Result<Self> {
        let chrome_path = find_chrome().context(
            "Chrome/Chromium not found. Install it or set WATCH_CHROME_PATH.",
        )?;

        cleanup_stale_locks(profile_dir);

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--window-size=1400,1100");
        if headed {
            builder = builder.with_head();
        } else {
            builder = builder.arg("--headless=new");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        if !headed {
            page.set_user_agent(USER_AGENT)
                .await
                .context("failed to set user agent")?;
        }

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }
}

#[async_trait]
impl PageReader for ChromiumReader {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let result = tokio::time::timeout(timeout, self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                Ok(())
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {}s", timeout.as_secs()),
        }
    }

    async fn row_status_text(&mut self) -> Result<String> {
        let script = r#"
            (() => {
                const rows = document.querySelectorAll('table tbody tr');
                for (const row of rows) {
                    const text = row.innerText || '';
                    if (text.toLowerCase().includes('visas')) {
                        const cells = row.querySelectorAll('td');
                        if (cells.length > 3) {
                            return cells[3].innerText.trim();
                        }
                    }
                }
                return null;
            })()
        "#;

        let result = self
            .page
            .evaluate(script)
            .await
            .context("row lookup failed")?;

        let text: Option<String> = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert row text: {e:?}"))?;

        match text {
            Some(t) if !t.is_empty() => Ok(t),
            _ => bail!("services row not found on page"),
        }
    }

    async fn body_text(&mut self, max_chars: usize) -> Result<String> {
        let script = format!(
            "document.body ? document.body.innerText.slice(0, {max_chars}) : ''"
        );

        let result = self
            .page
            .evaluate(script)
            .await
            .context("failed to read body text")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert body text: {e:?}"))
    }

    async fn capture(&mut self) -> Result<(Vec<u8>, String)> {
        let png = self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .context("screenshot failed")?;

        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to get HTML")?;
        let html: String = result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert HTML result: {e:?}"))?;

        Ok((png, html))
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            debug!("browser close: {e}");
        }
        self.handler_task.abort();
        Ok(())
    }
}
