//! The top-level watch loop.
//!
//! Runs poll cycles at a configured interval, gates alerts through the
//! cooldown, emits heartbeats on their own cadence, and honors cancellation
//! at one-second sleep ticks. The loop is the supervisor: nothing raised by
//! page reading or notification dispatch crosses it.

use crate::artifacts::ArtifactStore;
use crate::config::{Config, Target};
use crate::cycle::{run_cycle, CycleResult, StatusReading, Triggered};
use crate::extract::StatusMatcher;
use crate::notify::Dispatcher;
use crate::reader::PageReader;
use crate::throttle::Cooldown;
use anyhow::Result;
use chrono::{Local, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Shortest sleep between cycles, so an instantly-failing cycle cannot spin.
pub const SLEEP_FLOOR: Duration = Duration::from_secs(5);
/// Granularity at which cancellation is observed during sleeps.
pub const SLEEP_TICK: Duration = Duration::from_secs(1);

pub const ALERT_SUBJECT: &str = "Prenot@Mi VISA BOOK Alert";
pub const HEARTBEAT_SUBJECT: &str = "Prenot@Mi Slot Monitor Heartbeat";

/// Lifecycle of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// Timing knobs for the loop.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub interval: Duration,
    pub heartbeat_interval: Duration,
    pub cooldown: Duration,
}

impl From<&Config> for WatchSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            interval: cfg.check_interval,
            heartbeat_interval: cfg.heartbeat_interval,
            cooldown: cfg.cooldown,
        }
    }
}

/// Drift-correcting sleep: the cadence self-corrects for slow cycles but
/// never drops below the floor.
pub fn sleep_duration(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(SLEEP_FLOOR)
}

/// Combined alert body, one entry per triggered target.
pub fn alert_message(triggered: &[Triggered]) -> String {
    let mut lines =
        vec!["Possible VISAS BOOK opening detected. Confirm and book manually right away:"
            .to_string()];
    for t in triggered {
        lines.push(format!("- {}: {}", t.name, t.url));
        if let Some((png, html)) = &t.artifacts {
            lines.push(format!("  screenshot: {}", png.display()));
            lines.push(format!("  html: {}", html.display()));
        }
    }
    lines.join("\n")
}

/// Heartbeat body: timestamp plus one line per target.
pub fn heartbeat_report(readings: &[StatusReading]) -> String {
    let mut lines = vec![
        format!("time: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        "watcher still running, latest status:".to_string(),
    ];
    lines.extend(readings.iter().map(StatusReading::summary));
    lines.join("\n")
}

/// The scheduling loop. Owns the gates, the reader, and the dispatcher for
/// its whole lifetime.
pub struct WatchLoop<R> {
    settings: WatchSettings,
    targets: Vec<Target>,
    matcher: StatusMatcher,
    store: ArtifactStore,
    dispatcher: Dispatcher,
    reader: R,
    alert_gate: Cooldown,
    heartbeat_gate: Cooldown,
    stop: Arc<AtomicBool>,
    state: LoopState,
}

impl<R: PageReader> WatchLoop<R> {
    pub fn new(
        settings: WatchSettings,
        targets: Vec<Target>,
        matcher: StatusMatcher,
        store: ArtifactStore,
        dispatcher: Dispatcher,
        reader: R,
    ) -> Self {
        let alert_gate = Cooldown::new(settings.cooldown);
        let heartbeat_gate = Cooldown::new(settings.heartbeat_interval);
        Self {
            settings,
            targets,
            matcher,
            store,
            dispatcher,
            reader,
            alert_gate,
            heartbeat_gate,
            stop: Arc::new(AtomicBool::new(false)),
            state: LoopState::Running,
        }
    }

    /// Flag the signal handler flips to request a graceful stop.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One iteration: sweep all targets, then run the alert and heartbeat
    /// gates against the sweep's outcome.
    pub async fn tick(&mut self) -> CycleResult {
        let result = run_cycle(&mut self.reader, &self.matcher, &self.store, &self.targets).await;
        let now = Utc::now();

        if !result.triggered.is_empty() && self.alert_gate.ready(now) {
            let body = alert_message(&result.triggered);
            match self.dispatcher.send(ALERT_SUBJECT, &body).await {
                Ok(()) => {
                    info!("alert dispatched for {} target(s)", result.triggered.len());
                    // A failed send leaves the gate unset; the next cycle's
                    // check retries.
                    self.alert_gate.record(now);
                }
                Err(e) => warn!("alert dispatch failed, will retry next cycle: {e}"),
            }
        }

        if self.heartbeat_gate.ready(now) {
            let report = heartbeat_report(&result.readings);
            match self.dispatcher.send(HEARTBEAT_SUBJECT, &report).await {
                Ok(()) => info!("heartbeat dispatched"),
                Err(e) => warn!("heartbeat dispatch failed: {e}"),
            }
            // The next heartbeat goes out a full period later either way.
            self.heartbeat_gate.record(now);
        }

        result
    }

    /// Run until the stop flag is raised, then release the session.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "watch loop started: {} target(s), interval {}s, heartbeat {}s, cooldown {}s",
            self.targets.len(),
            self.settings.interval.as_secs(),
            self.settings.heartbeat_interval.as_secs(),
            self.settings.cooldown.as_secs()
        );

        while !self.stop.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            self.tick().await;
            let elapsed = cycle_start.elapsed();
            if self.sleep_between_cycles(elapsed).await {
                break;
            }
        }

        self.state = LoopState::Stopping;
        info!("stop requested, releasing browser session");
        if let Err(e) = self.reader.close().await {
            warn!("session close failed: {e:#}");
        }
        self.state = LoopState::Stopped;
        info!("watcher stopped");
        Ok(())
    }

    /// Sleep in one-second ticks, checking the stop flag at each tick.
    /// Returns true when a stop was observed.
    async fn sleep_between_cycles(&self, elapsed: Duration) -> bool {
        let sleep_for = sleep_duration(self.settings.interval, elapsed);
        info!("next check in {}s", sleep_for.as_secs());

        let mut remaining = sleep_for;
        while !remaining.is_zero() {
            if self.stop.load(Ordering::SeqCst) {
                return true;
            }
            let step = remaining.min(SLEEP_TICK);
            tokio::time::sleep(step).await;
            remaining -= step;
        }
        self.stop.load(Ordering::SeqCst)
    }
}

/// Flip `stop` on SIGINT or SIGTERM. The loop observes the flag at its next
/// tick; in-flight steps are never interrupted.
pub fn spawn_signal_listener(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    warn!("SIGTERM handler unavailable: {e}");
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        info!("shutdown signal received");
        stop.store(true, Ordering::SeqCst);
    });
}
