// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared polling cadence logic.
//!
//! [`PollingState`] tracks the adaptive interval of the device coordinator:
//! an actionable command arms a fixed number of accelerated polls, after
//! which the interval reverts to the default. [`RefreshBackoff`] spaces out
//! retries after consecutive transient fetch failures.

use std::time::Duration;

/// Outcome of advancing the polling state by one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTransition {
    /// Fast polling is armed; one tick was consumed.
    Ticked {
        /// Accelerated polls remaining after this cycle.
        remaining: u32,
    },
    /// Ticks ran out and the interval reverted to the default.
    Reverted,
    /// Nothing changed (already at the default interval).
    Unchanged,
}

/// Adaptive polling cadence for the device coordinator.
///
/// All transitions happen at poll boundaries: [`tick`](Self::tick) is called
/// exactly once per cycle before the fetch, and [`arm`](Self::arm) only
/// changes the interval observed by the *next* cycle.
///
/// # Invariants
///
/// - Arming while already armed is a no-op; simultaneous triggers never
///   stack extra acceleration.
/// - The interval reverts to the default exactly once after the ticks are
///   exhausted; further cycles leave it untouched.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use petkit_lib::coordinator::PollingState;
///
/// let mut state = PollingState::new(Duration::from_secs(60), Duration::from_secs(10));
/// assert_eq!(state.current_interval(), Duration::from_secs(60));
///
/// assert!(state.arm(2));
/// assert_eq!(state.current_interval(), Duration::from_secs(10));
///
/// // Second arm while active is a no-op
/// assert!(!state.arm(50));
/// ```
#[derive(Debug, Clone)]
pub struct PollingState {
    default_interval: Duration,
    fast_interval: Duration,
    current: Duration,
    ticks: u32,
}

impl PollingState {
    /// Creates a new polling state at the default interval.
    #[must_use]
    pub fn new(default_interval: Duration, fast_interval: Duration) -> Self {
        Self {
            default_interval,
            fast_interval,
            current: default_interval,
            ticks: 0,
        }
    }

    /// Returns the interval the next poll cycle should use.
    #[must_use]
    pub fn current_interval(&self) -> Duration {
        self.current
    }

    /// Returns true if accelerated polling is armed.
    #[must_use]
    pub fn is_fast_polling(&self) -> bool {
        self.ticks > 0
    }

    /// Returns the accelerated polls remaining.
    #[must_use]
    pub fn ticks_remaining(&self) -> u32 {
        self.ticks
    }

    /// Arms `ticks` accelerated polls at the fast interval.
    ///
    /// Returns false (and changes nothing) if fast polling is already
    /// armed.
    pub fn arm(&mut self, ticks: u32) -> bool {
        if self.ticks > 0 {
            return false;
        }
        self.ticks = ticks;
        self.current = self.fast_interval;
        true
    }

    /// Advances the state by one poll cycle.
    ///
    /// Consumes one tick while armed; on the first cycle after exhaustion
    /// the interval is reset to the default. The reset is check-before-write
    /// so an already-default interval is never rewritten.
    pub fn tick(&mut self) -> PollTransition {
        if self.ticks > 0 {
            self.ticks -= 1;
            PollTransition::Ticked {
                remaining: self.ticks,
            }
        } else if self.current != self.default_interval {
            self.current = self.default_interval;
            PollTransition::Reverted
        } else {
            PollTransition::Unchanged
        }
    }
}

/// Backoff schedule for consecutive transient refresh failures.
///
/// The first failed cycle retries after the normal interval; repeated
/// failures double the delay up to a cap. A successful cycle resets the
/// attempt counter (managed by the caller).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use petkit_lib::coordinator::RefreshBackoff;
///
/// let backoff = RefreshBackoff::new(Duration::from_secs(60));
/// assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(60));
/// assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct RefreshBackoff {
    /// Delay after the first failure.
    initial_delay: Duration,
    /// Cap for the delay growth.
    max_delay: Duration,
    /// Multiplier applied per additional failure.
    multiplier: f32,
}

impl RefreshBackoff {
    /// Default cap on the retry delay.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(15 * 60);

    /// Creates a backoff schedule starting from the given delay.
    #[must_use]
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: 2.0,
        }
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sets the growth multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given failed attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        // Safe: initial_delay is seconds/minutes, nowhere near u128 max
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Safe: delay_ms is positive (from Duration) and within practical bounds
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }
}
