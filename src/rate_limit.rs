use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppResult, MarketError};

/// Cap on tracked callers. Expired windows are swept first, then the oldest is evicted.
const MAX_TRACKED: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: DateTime<Utc>,
    count: u32,
}

/// Fixed-window submission counter keyed by caller.
pub struct SubmissionLimiter {
    max_attempts: u32,
    window: chrono::Duration,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<Uuid, Window>>,
}

impl SubmissionLimiter {
    /// Returns `None` when `max_attempts` is zero, i.e. throttling is off.
    pub fn new(max_attempts: u32, window: Duration, clock: Arc<dyn Clock>) -> Option<Self> {
        if max_attempts == 0 {
            return None;
        }
        let window =
            chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(365));
        Some(Self {
            max_attempts,
            window,
            clock,
            windows: Mutex::new(HashMap::new()),
        })
    }

    /// Records an attempt by `user_id`, failing once the window's budget is spent.
    pub fn check(&self, user_id: Uuid) -> AppResult<()> {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= MAX_TRACKED && !windows.contains_key(&user_id) {
            let window = self.window;
            windows.retain(|_, w| now - w.started < window);

            if windows.len() >= MAX_TRACKED {
                let oldest = windows
                    .iter()
                    .min_by_key(|(_, w)| w.started)
                    .map(|(id, _)| *id);
                if let Some(id) = oldest {
                    windows.remove(&id);
                }
            }
        }

        let entry = windows.entry(user_id).or_insert(Window {
            started: now,
            count: 0,
        });
        if now - entry.started >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_attempts {
            tracing::warn!("Submission limit reached for user {}", user_id);
            return Err(MarketError::RateLimited);
        }
        entry.count += 1;
        Ok(())
    }

    fn tracked(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or_default()
    }
}

impl std::fmt::Debug for SubmissionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionLimiter")
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .field("tracked", &self.tracked())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max: u32) -> (SubmissionLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let limiter =
            SubmissionLimiter::new(max, Duration::from_secs(15 * 60), clock.clone()).unwrap();
        (limiter, clock)
    }

    #[test]
    fn test_zero_disables() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        assert!(SubmissionLimiter::new(0, Duration::from_secs(60), clock).is_none());
    }

    #[test]
    fn test_blocks_after_max_attempts() {
        let (limiter, _clock) = limiter(5);
        let user = Uuid::new_v4();
        for _ in 0..5 {
            limiter.check(user).unwrap();
        }
        assert!(matches!(limiter.check(user), Err(MarketError::RateLimited)));
    }

    #[test]
    fn test_window_resets() {
        let (limiter, clock) = limiter(2);
        let user = Uuid::new_v4();
        limiter.check(user).unwrap();
        limiter.check(user).unwrap();
        assert!(limiter.check(user).is_err());

        clock.advance(chrono::Duration::minutes(15));
        limiter.check(user).unwrap();
    }

    #[test]
    fn test_users_are_independent() {
        let (limiter, _clock) = limiter(1);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        limiter.check(alice).unwrap();
        assert!(limiter.check(alice).is_err());
        limiter.check(bob).unwrap();
    }

    #[test]
    fn test_expired_windows_swept_at_capacity() {
        let (limiter, clock) = limiter(1);
        for _ in 0..MAX_TRACKED {
            limiter.check(Uuid::new_v4()).unwrap();
        }
        assert_eq!(limiter.tracked(), MAX_TRACKED);

        clock.advance(chrono::Duration::minutes(16));
        limiter.check(Uuid::new_v4()).unwrap();
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_oldest_window_evicted_when_nothing_expired() {
        let (limiter, clock) = limiter(1);
        let first = Uuid::new_v4();
        limiter.check(first).unwrap();
        clock.advance(chrono::Duration::seconds(1));
        for _ in 1..MAX_TRACKED {
            limiter.check(Uuid::new_v4()).unwrap();
        }
        assert_eq!(limiter.tracked(), MAX_TRACKED);

        let newcomer = Uuid::new_v4();
        limiter.check(newcomer).unwrap();
        assert_eq!(limiter.tracked(), MAX_TRACKED);
        assert!(limiter.check(newcomer).is_err());

        // The evicted caller starts a fresh window.
        let before = limiter.tracked();
        limiter.check(first).unwrap();
        assert_eq!(limiter.tracked(), before);
    }
}
