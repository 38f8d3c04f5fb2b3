//! Time-gated firing: alert cooldown and heartbeat cadence.
//!
//! One type serves both gates. The alert throttle is global across targets
//! (all targets triggered in a cycle share one decision); the heartbeat is an
//! independent instance with its own period.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A gate that permits firing at most once per period.
#[derive(Debug, Clone)]
pub struct Cooldown {
    period: Duration,
    last_fired: Option<DateTime<Utc>>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_fired: None,
        }
    }

    /// True iff the gate has never fired or the period has fully elapsed.
    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => {
                let elapsed = now.signed_duration_since(last);
                elapsed >= chrono::Duration::from_std(self.period).unwrap_or(chrono::Duration::MAX)
            }
        }
    }

    /// Mark the gate as fired at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_fired = Some(now);
    }

    pub fn last_fired(&self) -> Option<DateTime<Utc>> {
        self.last_fired
    }
}
