//! End-to-end watch-loop scenarios against scripted page readers and
//! notifiers. No browser, no network.

use anyhow::{bail, Result};
use async_trait::async_trait;
use slotwatch::artifacts::ArtifactStore;
use slotwatch::config::Target;
use slotwatch::extract::StatusMatcher;
use slotwatch::notify::{Dispatcher, Notifier, NotifyError};
use slotwatch::reader::PageReader;
use slotwatch::watch::{LoopState, WatchLoop, WatchSettings, ALERT_SUBJECT, HEARTBEAT_SUBJECT};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ── Scripted collaborators ──

#[derive(Clone)]
enum PageScript {
    /// Navigation itself fails.
    FailNavigation(String),
    /// The services row is present with this text.
    Row(String),
    /// Row lookup fails; this is the body-text fallback.
    BodyOnly(String),
}

struct MockReader {
    scripts: HashMap<String, PageScript>,
    current: Option<PageScript>,
    navigations: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl MockReader {
    fn new(scripts: Vec<(&str, PageScript)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(url, s)| (url.to_string(), s))
                .collect(),
            current: None,
            navigations: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl PageReader for MockReader {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(url) {
            Some(PageScript::FailNavigation(msg)) => {
                self.current = None;
                bail!("{msg}")
            }
            Some(script) => {
                self.current = Some(script.clone());
                Ok(())
            }
            None => {
                self.current = None;
                bail!("no script for {url}")
            }
        }
    }

    async fn row_status_text(&mut self) -> Result<String> {
        match &self.current {
            Some(PageScript::Row(text)) => Ok(text.clone()),
            _ => bail!("services row not found on page"),
        }
    }

    async fn body_text(&mut self, max_chars: usize) -> Result<String> {
        match &self.current {
            Some(PageScript::Row(text)) | Some(PageScript::BodyOnly(text)) => {
                Ok(text.chars().take(max_chars).collect())
            }
            _ => bail!("no page loaded"),
        }
    }

    async fn capture(&mut self) -> Result<(Vec<u8>, String)> {
        Ok((vec![0x89, 0x50, 0x4e, 0x47], "<html>captured</html>".to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Outbox {
    messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl Outbox {
    fn with_subject(&self, subject: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

struct MockNotifier {
    outbox: Outbox,
    fail: bool,
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.outbox
            .messages
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        if self.fail {
            Err(NotifyError::SendFailed("mock channel down".to_string()))
        } else {
            Ok(())
        }
    }
}

// ── Harness ──

const NOT_OPEN: &str = "Booking calendar not yet available. Please check later.";

fn target(name: &str) -> Target {
    Target {
        name: name.to_string(),
        url: format!("https://example.org/{}", name.to_lowercase()),
    }
}

fn settings() -> WatchSettings {
    WatchSettings {
        interval: Duration::from_secs(10),
        heartbeat_interval: Duration::from_secs(1800),
        cooldown: Duration::from_secs(600),
    }
}

fn make_loop(
    targets: Vec<Target>,
    reader: MockReader,
    failing_notifier: bool,
) -> (WatchLoop<MockReader>, Outbox, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::new(tmp.path().join("artifacts")).unwrap();
    let outbox = Outbox::default();
    let dispatcher = Dispatcher::new(vec![Box::new(MockNotifier {
        outbox: outbox.clone(),
        fail: failing_notifier,
    })]);
    let watch_loop = WatchLoop::new(
        settings(),
        targets,
        StatusMatcher::new(),
        store,
        dispatcher,
        reader,
    );
    (watch_loop, outbox, tmp)
}

fn artifact_files(tmp: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(tmp.path().join("artifacts"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Scenarios ──

#[tokio::test]
async fn test_both_targets_unavailable_yields_no_alert_but_a_heartbeat() {
    let reader = MockReader::new(vec![
        ("https://example.org/boston", PageScript::Row(NOT_OPEN.to_string())),
        ("https://example.org/newyork", PageScript::Row(NOT_OPEN.to_string())),
    ]);
    let (mut wl, outbox, _tmp) = make_loop(
        vec![target("BOSTON"), target("NEWYORK")],
        reader,
        false,
    );

    let result = wl.tick().await;

    assert!(result.triggered.is_empty());
    assert_eq!(result.readings.len(), 2);
    assert!(result.readings.iter().all(|r| !r.available && r.error.is_none()));

    assert!(outbox.with_subject(ALERT_SUBJECT).is_empty());
    // The heartbeat gate fires on the very first cycle and reports both.
    let heartbeats = outbox.with_subject(HEARTBEAT_SUBJECT);
    assert_eq!(heartbeats.len(), 1);
    assert!(heartbeats[0].contains("- BOSTON: not open"));
    assert!(heartbeats[0].contains("- NEWYORK: not open"));
}

#[tokio::test]
async fn test_one_bookable_target_triggers_one_combined_alert() {
    let reader = MockReader::new(vec![
        ("https://example.org/boston", PageScript::Row("BOOK NOW".to_string())),
        ("https://example.org/newyork", PageScript::Row("not yet available".to_string())),
    ]);
    let (mut wl, outbox, tmp) = make_loop(
        vec![target("BOSTON"), target("NEWYORK")],
        reader,
        false,
    );

    let result = wl.tick().await;

    assert_eq!(result.triggered.len(), 1);
    assert_eq!(result.triggered[0].name, "BOSTON");

    // One artifact pair, for BOSTON only.
    let files = artifact_files(&tmp);
    assert_eq!(files.len(), 2);
    assert!(files.iter().any(|f| f.ends_with("_BOSTON.png")));
    assert!(files.iter().any(|f| f.ends_with("_BOSTON.html")));

    let alerts = outbox.with_subject(ALERT_SUBJECT);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("- BOSTON: https://example.org/boston"));
    assert!(alerts[0].contains("screenshot: "));
    assert!(!alerts[0].contains("- NEWYORK"));
}

#[tokio::test]
async fn test_failing_target_is_isolated_from_the_rest() {
    let reader = MockReader::new(vec![
        (
            "https://example.org/boston",
            PageScript::FailNavigation("navigation timed out after 90s".to_string()),
        ),
        ("https://example.org/newyork", PageScript::Row("Book an appointment".to_string())),
    ]);
    let (mut wl, outbox, _tmp) = make_loop(
        vec![target("BOSTON"), target("NEWYORK")],
        reader,
        false,
    );

    let result = wl.tick().await;

    assert_eq!(result.readings.len(), 2);
    let boston = &result.readings[0];
    assert!(boston.error.as_deref().unwrap_or("").contains("timed out"));
    assert!(!boston.available);

    assert_eq!(result.triggered.len(), 1);
    assert_eq!(result.triggered[0].name, "NEWYORK");
    assert_eq!(outbox.with_subject(ALERT_SUBJECT).len(), 1);
}

#[tokio::test]
async fn test_body_fallback_is_used_when_row_is_missing() {
    let reader = MockReader::new(vec![(
        "https://example.org/boston",
        PageScript::BodyOnly("  \n  ".to_string()),
    )]);
    let (mut wl, _outbox, _tmp) = make_loop(vec![target("BOSTON")], reader, false);

    let result = wl.tick().await;

    // Fallback succeeded: whitespace body, no error, not available.
    let reading = &result.readings[0];
    assert!(reading.error.is_none());
    assert!(!reading.available);
    assert!(result.triggered.is_empty());
}

#[tokio::test]
async fn test_alert_cooldown_deduplicates_consecutive_cycles() {
    let reader = MockReader::new(vec![(
        "https://example.org/boston",
        PageScript::Row("BOOK NOW".to_string()),
    )]);
    let (mut wl, outbox, _tmp) = make_loop(vec![target("BOSTON")], reader, false);

    wl.tick().await;
    wl.tick().await;
    wl.tick().await;

    // Still bookable every cycle, but the cooldown admits a single alert
    // (and the heartbeat its single report).
    assert_eq!(outbox.with_subject(ALERT_SUBJECT).len(), 1);
    assert_eq!(outbox.with_subject(HEARTBEAT_SUBJECT).len(), 1);
}

#[tokio::test]
async fn test_failed_alert_dispatch_retries_next_cycle() {
    let reader = MockReader::new(vec![(
        "https://example.org/boston",
        PageScript::Row("BOOK NOW".to_string()),
    )]);
    let (mut wl, outbox, _tmp) = make_loop(vec![target("BOSTON")], reader, true);

    wl.tick().await;
    wl.tick().await;

    // Alert send failed, so the throttle was never recorded: attempted twice.
    assert_eq!(outbox.with_subject(ALERT_SUBJECT).len(), 2);
    // Heartbeat records regardless of dispatch outcome: attempted once.
    assert_eq!(outbox.with_subject(HEARTBEAT_SUBJECT).len(), 1);
}

#[tokio::test]
async fn test_stop_during_sleep_exits_within_a_tick() {
    let reader = MockReader::new(vec![(
        "https://example.org/boston",
        PageScript::Row(NOT_OPEN.to_string()),
    )]);
    let navigations = reader.navigations.clone();
    let closed = reader.closed.clone();
    let (mut wl, _outbox, _tmp) = make_loop(vec![target("BOSTON")], reader, false);
    let stop = wl.stop_flag();

    let handle = tokio::spawn(async move {
        wl.run().await.unwrap();
        wl
    });

    // Let the first cycle finish and the loop enter its sleep, then stop.
    tokio::time::sleep(Duration::from_millis(300)).await;
    stop.store(true, Ordering::SeqCst);

    let wl = tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("loop did not stop within one tick of the request")
        .unwrap();

    assert_eq!(wl.state(), LoopState::Stopped);
    // No second cycle started after the stop request.
    assert_eq!(navigations.load(Ordering::SeqCst), 1);
    assert!(closed.load(Ordering::SeqCst), "browser session must be released");
}
