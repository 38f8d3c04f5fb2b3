//! `slotwatch watch` — run the polling watcher until stopped.

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::extract::StatusMatcher;
use crate::notify::Dispatcher;
use crate::reader::chromium::ChromiumReader;
use crate::watch::{spawn_signal_listener, WatchLoop, WatchSettings};
use anyhow::Result;
use tracing::{info, warn};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    config.ensure_session_dir()?;

    let store = ArtifactStore::new(&config.artifact_dir)?;
    let matcher = StatusMatcher::with_extra_phrases(&config.extra_negative_phrases);
    let dispatcher = Dispatcher::from_config(&config)?;
    match dispatcher.channel_names().as_slice() {
        [] => warn!("no notifier credentials configured; findings will only be logged"),
        names => info!("notification channels: {}", names.join(", ")),
    }

    let reader = ChromiumReader::launch(&config.session_dir, false).await?;
    info!("browser session ready, profile {}", config.session_dir.display());

    let mut watch_loop = WatchLoop::new(
        WatchSettings::from(&config),
        config.targets.clone(),
        matcher,
        store,
        dispatcher,
        reader,
    );
    spawn_signal_listener(watch_loop.stop_flag());

    watch_loop.run().await
}
