//! Adaptive poll scheduler.
//!
//! Two modes: `Normal` polls at a wide random interval, `Flash` polls
//! at a short interval for a while after new products or restocks were
//! seen. Flash expiry is evaluated fresh on every query, so leaving
//! flash mode needs no event.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Current polling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    Normal,
    Flash,
}

/// Timing parameters of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleParams {
    /// How long flash mode lasts after the latest activity.
    pub flash_duration: Duration,
    /// Base sleep while in flash mode.
    pub flash_interval: Duration,
    /// Upper bound of the random jitter added in flash mode.
    pub flash_jitter: Duration,
    /// Lower bound of the normal sleep range.
    pub normal_min: Duration,
    /// Upper bound of the normal sleep range.
    pub normal_max: Duration,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            flash_duration: Duration::from_secs(180),
            flash_interval: Duration::from_secs(5),
            flash_jitter: Duration::from_secs(2),
            normal_min: Duration::from_secs(15),
            normal_max: Duration::from_secs(30),
        }
    }
}

/// Chooses the sleep between cycles.
#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    params: ScheduleParams,
    /// Flash mode lasts until this instant.
    flash_until: Option<DateTime<Utc>>,
}

impl AdaptiveScheduler {
    pub fn new(params: ScheduleParams) -> Self {
        Self {
            params,
            flash_until: None,
        }
    }

    /// Enter (or extend) flash mode from `now`.
    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        let window = chrono::Duration::from_std(self.params.flash_duration)
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.flash_until = Some(now + window);
    }

    pub fn mode(&self, now: DateTime<Utc>) -> PollMode {
        match self.flash_until {
            Some(until) if now < until => PollMode::Flash,
            _ => PollMode::Normal,
        }
    }

    pub fn flash_until(&self) -> Option<DateTime<Utc>> {
        self.flash_until
    }

    /// Sleep before the next cycle.
    pub fn next_delay<R: Rng>(&self, now: DateTime<Utc>, rng: &mut R) -> Duration {
        match self.mode(now) {
            PollMode::Flash => {
                self.params.flash_interval + random_between(rng, Duration::ZERO, self.params.flash_jitter)
            }
            PollMode::Normal => random_between(rng, self.params.normal_min, self.params.normal_max),
        }
    }
}

fn random_between<R: Rng>(rng: &mut R, low: Duration, high: Duration) -> Duration {
    let low_ms = u64::try_from(low.as_millis()).unwrap_or(u64::MAX);
    let high_ms = u64::try_from(high.as_millis()).unwrap_or(u64::MAX);
    if high_ms <= low_ms {
        return Duration::from_millis(low_ms);
    }
    Duration::from_millis(rng.gen_range(low_ms..=high_ms))
}
