//! One poll cycle: evaluate every configured target sequentially.
//!
//! Targets share a single browsing context, so they are processed one at a
//! time. A failure on one target never aborts evaluation of the others.

use crate::artifacts::ArtifactStore;
use crate::config::Target;
use crate::extract::{truncate_chars, StatusMatcher, BODY_FALLBACK_MAX_CHARS};
use crate::reader::{PageReader, NAVIGATION_TIMEOUT};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Longest status text kept on a reading.
const RAW_TEXT_MAX_CHARS: usize = BODY_FALLBACK_MAX_CHARS;
/// Length of the one-line summary used in heartbeats and logs.
const SUMMARY_MAX_CHARS: usize = 160;

/// Result of evaluating one target in one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReading {
    pub target: String,
    pub raw_text: String,
    pub available: bool,
    pub error: Option<String>,
}

impl StatusReading {
    fn ok(target: &Target, raw_text: String, available: bool) -> Self {
        Self {
            target: target.name.clone(),
            raw_text: truncate_chars(&raw_text, RAW_TEXT_MAX_CHARS),
            available,
            error: None,
        }
    }

    fn failed(target: &Target, error: String) -> Self {
        Self {
            target: target.name.clone(),
            raw_text: String::new(),
            available: false,
            error: Some(error),
        }
    }

    /// One-line form used in heartbeat reports and logs.
    pub fn summary(&self) -> String {
        if let Some(err) = &self.error {
            return format!("- {}: check failed: {err}", self.target);
        }
        let short = truncate_chars(&self.raw_text, SUMMARY_MAX_CHARS).replace('\n', " ");
        let verdict = if self.available {
            "possibly bookable"
        } else {
            "not open"
        };
        format!("- {}: {verdict} | {short}", self.target)
    }
}

/// A target that read as available, with its evidence capture.
#[derive(Debug, Clone)]
pub struct Triggered {
    pub name: String,
    pub url: String,
    /// `(png, html)` paths; `None` when the capture itself failed.
    pub artifacts: Option<(PathBuf, PathBuf)>,
}

/// Aggregate outcome of one sweep over all targets.
#[derive(Debug, Clone, Default)]
pub struct CycleResult {
    pub readings: Vec<StatusReading>,
    pub triggered: Vec<Triggered>,
}

/// Run one sweep. Never fails; per-target errors land in the readings.
pub async fn run_cycle<R: PageReader + ?Sized>(
    reader: &mut R,
    matcher: &StatusMatcher,
    store: &ArtifactStore,
    targets: &[Target],
) -> CycleResult {
    let mut result = CycleResult::default();

    for target in targets {
        let reading = check_one(reader, matcher, target).await;
        info!("{}", reading.summary());

        if reading.available {
            let artifacts = match capture_artifacts(reader, store, target).await {
                Ok(paths) => Some(paths),
                Err(e) => {
                    warn!("{}: artifact capture failed: {e:#}", target.name);
                    None
                }
            };
            result.triggered.push(Triggered {
                name: target.name.clone(),
                url: target.url.clone(),
                artifacts,
            });
        }

        result.readings.push(reading);
    }

    result
}

async fn check_one<R: PageReader + ?Sized>(
    reader: &mut R,
    matcher: &StatusMatcher,
    target: &Target,
) -> StatusReading {
    if let Err(e) = reader.goto(&target.url, NAVIGATION_TIMEOUT).await {
        return StatusReading::failed(target, format!("{e:#}"));
    }

    // Prefer the structured row; fall back to a bounded prefix of the page
    // body when the row cannot be located.
    let raw_text = match reader.row_status_text().await {
        Ok(text) => text,
        Err(row_err) => match reader.body_text(BODY_FALLBACK_MAX_CHARS).await {
            Ok(text) => text,
            Err(body_err) => {
                return StatusReading::failed(
                    target,
                    format!("{row_err:#}; body fallback failed: {body_err:#}"),
                );
            }
        },
    };

    let available = matcher.is_available(&raw_text);
    StatusReading::ok(target, raw_text, available)
}

async fn capture_artifacts<R: PageReader + ?Sized>(
    reader: &mut R,
    store: &ArtifactStore,
    target: &Target,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    let (png, html) = reader.capture().await?;
    store.save(&target.name, &png, &html)
}
