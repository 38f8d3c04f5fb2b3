//! `slotwatch login` — sign in once through a visible browser so the session
//! persists in the profile directory for headless watching.

use super::DEFAULT_LOGIN_URL;
use crate::config::Config;
use crate::reader::chromium::ChromiumReader;
use crate::reader::{PageReader, NAVIGATION_TIMEOUT};
use anyhow::{Context, Result};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let url = config
        .login_url
        .clone()
        .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());

    std::fs::create_dir_all(&config.session_dir).with_context(|| {
        format!(
            "failed to create session directory {}",
            config.session_dir.display()
        )
    })?;

    let mut reader = ChromiumReader::launch(&config.session_dir, true).await?;
    reader.goto(&url, NAVIGATION_TIMEOUT).await?;

    println!("A browser window is open with the watcher's profile.");
    println!("Sign in to the reservation site, then come back here.");
    println!("Press Enter to save the session and close the browser...");
    let mut line = String::new();
    BufReader::new(stdin()).read_line(&mut line).await?;

    reader.close().await?;
    println!("Session saved to {}", config.session_dir.display());

    Ok(())
}
