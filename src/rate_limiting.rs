// ABOUTME: Fixed-window request rate limiting and daily Spoonacular quota tracking
// ABOUTME: Guards both inbound API traffic and outbound calls to the recipe API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Rate Limiting and Quota
//!
//! Two independent guards:
//!
//! - [`FixedWindowRateLimiter`] counts requests per key in fixed windows. The
//!   window starts on the first request, requests beyond `limit` are rejected
//!   and the count starts over once the window has elapsed.
//! - [`ApiQuotaTracker`] counts Spoonacular points per UTC day against the
//!   plan's daily allowance.

use chrono::{DateTime, Days, Duration as ChronoDuration, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::AppError;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window resets, never negative
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        u64::try_from((self.reset_at - Utc::now()).num_seconds()).unwrap_or(0)
    }

    /// Convert a rejection into the 429 error
    #[must_use]
    pub fn to_error(&self) -> AppError {
        AppError::rate_limit_exceeded(self.limit, self.reset_at)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-key fixed-window counter
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl FixedWindowRateLimiter {
    /// Create a limiter allowing `limit` requests per `window`
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    /// Requests allowed per window
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Count a request for `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut entry = self.windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            debug!(key, "Rate limit window expired, starting a new one");
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        entry.count = entry.count.saturating_add(1);
        let count = entry.count;
        let elapsed = now.saturating_duration_since(entry.started);
        drop(entry);

        let remaining_window = self.window.saturating_sub(elapsed);
        let reset_at = Utc::now()
            + ChronoDuration::from_std(remaining_window).unwrap_or_else(|_| ChronoDuration::zero());

        RateLimitDecision {
            allowed: count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            reset_at,
        }
    }

    /// Drop windows that have fully elapsed, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of keys currently tracked
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Daily quota snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// UTC day the counters refer to
    pub day: NaiveDate,
    /// Points spent today
    pub used: u32,
    /// Daily allowance
    pub limit: u32,
    /// Points left today
    pub remaining: u32,
    /// Next UTC midnight
    pub resets_at: DateTime<Utc>,
}

/// Returned when a call would exceed the daily allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("daily recipe API quota exhausted")]
pub struct QuotaExceeded {
    /// Quota state at rejection time
    pub status: QuotaStatus,
}

impl From<QuotaExceeded> for AppError {
    fn from(err: QuotaExceeded) -> Self {
        Self::quota_exceeded(err.status.used, err.status.limit, err.status.resets_at)
    }
}

#[derive(Debug, Clone, Copy)]
struct DailyUsage {
    day: NaiveDate,
    used: u32,
}

/// Spoonacular point usage per UTC day
#[derive(Debug)]
pub struct ApiQuotaTracker {
    daily_limit: u32,
    usage: Mutex<DailyUsage>,
}

impl ApiQuotaTracker {
    /// Create a tracker with nothing spent today
    #[must_use]
    pub fn new(daily_limit: u32) -> Self {
        Self::with_usage(daily_limit, Utc::now().date_naive(), 0)
    }

    /// Create a tracker that resumes from persisted usage
    #[must_use]
    pub const fn with_usage(daily_limit: u32, day: NaiveDate, used: u32) -> Self {
        Self {
            daily_limit,
            usage: Mutex::new(DailyUsage { day, used }),
        }
    }

    /// Daily allowance
    #[must_use]
    pub const fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Current state
    #[must_use]
    pub fn status(&self) -> QuotaStatus {
        self.status_at(Utc::now())
    }

    /// State as of `now`, rolling the day over when needed
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> QuotaStatus {
        self.with_current_day(now, |usage| self.snapshot(usage))
    }

    /// Fail without consuming when fewer than `cost` points are left
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] when the allowance cannot cover `cost`
    pub fn check_available(&self, cost: u32) -> Result<QuotaStatus, QuotaExceeded> {
        self.check_available_at(cost, Utc::now())
    }

    /// [`check_available`](Self::check_available) with an explicit clock
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] when the allowance cannot cover `cost`
    pub fn check_available_at(
        &self,
        cost: u32,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, QuotaExceeded> {
        self.with_current_day(now, |usage| {
            let status = self.snapshot(usage);
            if usage.used.saturating_add(cost) > self.daily_limit {
                Err(QuotaExceeded { status })
            } else {
                Ok(status)
            }
        })
    }

    /// Consume `cost` points if the allowance covers them
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] and consumes nothing when it does not
    pub fn try_consume(&self, cost: u32) -> Result<QuotaStatus, QuotaExceeded> {
        self.try_consume_at(cost, Utc::now())
    }

    /// [`try_consume`](Self::try_consume) with an explicit clock
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] and consumes nothing when it does not
    pub fn try_consume_at(
        &self,
        cost: u32,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, QuotaExceeded> {
        self.with_current_day(now, |usage| {
            if usage.used.saturating_add(cost) > self.daily_limit {
                return Err(QuotaExceeded {
                    status: self.snapshot(usage),
                });
            }
            usage.used += cost;
            Ok(self.snapshot(usage))
        })
    }

    /// Record points reported by upstream after a call, even past the limit
    pub fn record(&self, cost: u32) -> QuotaStatus {
        self.with_current_day(Utc::now(), |usage| {
            usage.used = usage.used.saturating_add(cost);
            if usage.used > self.daily_limit {
                warn!(
                    used = usage.used,
                    limit = self.daily_limit,
                    "Spoonacular usage exceeded the daily quota"
                );
            }
            self.snapshot(usage)
        })
    }

    fn snapshot(&self, usage: &DailyUsage) -> QuotaStatus {
        QuotaStatus {
            day: usage.day,
            used: usage.used,
            limit: self.daily_limit,
            remaining: self.daily_limit.saturating_sub(usage.used),
            resets_at: next_utc_midnight(usage.day),
        }
    }

    fn with_current_day<R>(&self, now: DateTime<Utc>, f: impl FnOnce(&mut DailyUsage) -> R) -> R {
        let mut guard = self
            .usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let today = now.date_naive();
        if guard.day != today {
            debug!(previous = %guard.day, %today, "Quota day rolled over");
            *guard = DailyUsage {
                day: today,
                used: 0,
            };
        }
        f(&mut guard)
    }
}

fn next_utc_midnight(day: NaiveDate) -> DateTime<Utc> {
    day.checked_add_days(Days::new(1))
        .unwrap_or(day)
        .and_hms_opt(0, 0, 0)
        .map_or_else(Utc::now, |dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_allows_limit_then_rejects() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_at("k", now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
        assert!(!limiter.check_at("k", now).allowed);
        // Other keys are independent
        assert!(limiter.check_at("other", now).allowed);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert!(limiter.check_at("k", start).allowed);
        assert!(!limiter.check_at("k", start + Duration::from_secs(5)).allowed);
        assert!(limiter.check_at("k", start + Duration::from_secs(10)).allowed);
    }

    #[test]
    fn test_quota_rejects_without_consuming() {
        let tracker = ApiQuotaTracker::new(5);
        assert!(tracker.try_consume(4).is_ok());
        let err = tracker.try_consume(2).unwrap_err();
        assert_eq!(err.status.used, 4);
        assert_eq!(tracker.status().remaining, 1);
    }

    #[test]
    fn test_quota_rolls_over_at_utc_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let tracker = ApiQuotaTracker::with_usage(10, day, 10);
        let same_day = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 1).unwrap();

        assert!(tracker.check_available_at(1, same_day).is_err());
        let status = tracker.try_consume_at(1, next_day).unwrap();
        assert_eq!(status.used, 1);
        assert_eq!(
            status.resets_at,
            Utc.with_ymd_and_hms(2024, 3, 12, 0, 0, 0).unwrap()
        );
    }
}
