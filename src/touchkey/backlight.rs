//! Backlight inactivity timer.
//!
//! Pure timestamp logic, no hardware: the owner rearms it on every key
//! event and "on" command, and polls it with the current time. Expiry is
//! reported once, then the timer is idle until rearmed.

use crate::config::{clamp_backlight_timeout, BACKLIGHT_TIMEOUT_DEFAULT_MS};

/// Single-shot countdown with a bounded timeout.
#[derive(Debug, Clone)]
pub struct BacklightTimer {
    timeout_ms: u32,
    deadline_us: Option<u64>,
}

impl BacklightTimer {
    /// New idle timer. `timeout_ms` is clamped to 500..=30000.
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms: clamp_backlight_timeout(timeout_ms),
            deadline_us: None,
        }
    }

    #[inline]
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Change the timeout; returns the value actually stored.
    ///
    /// An armed deadline keeps the timeout it was armed with.
    pub fn set_timeout_ms(&mut self, timeout_ms: u32) -> u32 {
        self.timeout_ms = clamp_backlight_timeout(timeout_ms);
        self.timeout_ms
    }

    /// (Re)start the countdown from `now_us`.
    #[inline]
    pub fn rearm(&mut self, now_us: u64) {
        self.deadline_us = Some(now_us.saturating_add(u64::from(self.timeout_ms) * 1000));
    }

    /// Stop the countdown without firing.
    #[inline]
    pub fn cancel(&mut self) {
        self.deadline_us = None;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.deadline_us.is_some()
    }

    #[inline]
    pub fn deadline_us(&self) -> Option<u64> {
        self.deadline_us
    }

    /// Returns `true` exactly once when `now_us` reaches the deadline.
    pub fn poll(&mut self, now_us: u64) -> bool {
        match self.deadline_us {
            Some(deadline) if now_us >= deadline => {
                self.deadline_us = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for BacklightTimer {
    fn default() -> Self {
        Self::new(BACKLIGHT_TIMEOUT_DEFAULT_MS)
    }
}
