//! `slotwatch check` — run a single poll cycle and print each status.

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::cycle::run_cycle;
use crate::extract::StatusMatcher;
use crate::reader::chromium::ChromiumReader;
use crate::reader::PageReader;
use anyhow::Result;

pub async fn run(json: bool) -> Result<()> {
    let config = Config::from_env()?;
    config.ensure_session_dir()?;

    let store = ArtifactStore::new(&config.artifact_dir)?;
    let matcher = StatusMatcher::with_extra_phrases(&config.extra_negative_phrases);

    let mut reader = ChromiumReader::launch(&config.session_dir, false).await?;
    let result = run_cycle(&mut reader, &matcher, &store, &config.targets).await;
    reader.close().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.readings)?);
        return Ok(());
    }

    for reading in &result.readings {
        println!("{}", reading.summary());
    }
    println!();
    if result.triggered.is_empty() {
        println!("No target is currently bookable.");
    } else {
        println!(
            "{} target(s) look bookable; artifacts saved under {}",
            result.triggered.len(),
            store.dir().display()
        );
    }

    Ok(())
}
