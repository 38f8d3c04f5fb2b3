//! Page reader abstraction over the browser session.
//!
//! Defines the `PageReader` trait that the poll cycle drives. The production
//! implementation is Chromium via chromiumoxide; tests substitute scripted
//! readers.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Navigation timeout for one target fetch.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(90);

/// A live browsing session pointed at one page at a time.
///
/// The session is a single shared browsing context; callers navigate and read
/// sequentially, never concurrently.
#[async_trait]
pub trait PageReader: Send {
    /// Navigate to a URL, waiting at most `timeout` for the load.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Status text of the services-table row this watcher cares about.
    ///
    /// Fails when the row cannot be located; callers fall back to
    /// [`PageReader::body_text`].
    async fn row_status_text(&mut self) -> Result<String>;

    /// Visible page body text, truncated to at most `max_chars`.
    async fn body_text(&mut self, max_chars: usize) -> Result<String>;

    /// Full-page screenshot bytes plus serialized page HTML.
    async fn capture(&mut self) -> Result<(Vec<u8>, String)>;

    /// Release the browsing session.
    async fn close(&mut self) -> Result<()>;
}
