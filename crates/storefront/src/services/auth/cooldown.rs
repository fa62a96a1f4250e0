//! Resend cooldown for OTP codes.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Seconds a customer must wait before requesting another code.
pub const RESEND_COOLDOWN_SECS: u32 = 60;

/// Countdown that gates the "resend code" action.
///
/// The counter only moves down, one step per second, and stops at zero.
/// Because the gate lives in the session between requests, [`sync`] replays
/// the whole seconds that passed since the last update.
///
/// [`sync`]: ResendCooldown::sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResendCooldown {
    remaining: u32,
    /// Instant the current `remaining` value was last accurate.
    anchor: DateTime<Utc>,
}

impl ResendCooldown {
    /// A cooldown that has already elapsed.
    #[must_use]
    pub const fn ready(now: DateTime<Utc>) -> Self {
        Self {
            remaining: 0,
            anchor: now,
        }
    }

    /// A full cooldown starting at `now`.
    #[must_use]
    pub const fn start(now: DateTime<Utc>) -> Self {
        Self {
            remaining: RESEND_COOLDOWN_SECS,
            anchor: now,
        }
    }

    /// Advance by one second.
    pub fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        self.anchor += TimeDelta::seconds(1);
    }

    /// Apply every whole second elapsed between the anchor and `now`.
    ///
    /// A clock that moved backwards changes nothing.
    pub fn sync(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.anchor).num_seconds();
        if elapsed <= 0 {
            return;
        }
        let steps = u32::try_from(elapsed).unwrap_or(u32::MAX);
        self.remaining = self.remaining.saturating_sub(steps);
        self.anchor += TimeDelta::seconds(elapsed);
    }

    /// Seconds left before a resend is allowed.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub const fn can_resend(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_resend_allowed_after_exactly_sixty_ticks() {
        let mut cooldown = ResendCooldown::start(t0());
        for _ in 0..59 {
            cooldown.tick();
            assert!(!cooldown.can_resend());
        }
        cooldown.tick();
        assert!(cooldown.can_resend());
        assert_eq!(cooldown.remaining(), 0);
    }

    #[test]
    fn test_never_goes_negative() {
        let mut cooldown = ResendCooldown::start(t0());
        for _ in 0..200 {
            cooldown.tick();
        }
        assert_eq!(cooldown.remaining(), 0);
        assert!(cooldown.can_resend());
    }

    #[test]
    fn test_sync_applies_whole_seconds() {
        let mut cooldown = ResendCooldown::start(t0());
        cooldown.sync(t0() + TimeDelta::milliseconds(1_500));
        assert_eq!(cooldown.remaining(), 59);

        // The half second carried over is not lost
        cooldown.sync(t0() + TimeDelta::milliseconds(2_000));
        assert_eq!(cooldown.remaining(), 58);

        cooldown.sync(t0() + TimeDelta::seconds(59));
        assert!(!cooldown.can_resend());
        cooldown.sync(t0() + TimeDelta::seconds(60));
        assert!(cooldown.can_resend());
    }

    #[test]
    fn test_sync_ignores_clock_going_backwards() {
        let mut cooldown = ResendCooldown::start(t0());
        cooldown.sync(t0() - TimeDelta::seconds(30));
        assert_eq!(cooldown.remaining(), RESEND_COOLDOWN_SECS);
    }

    #[test]
    fn test_ready_allows_resend() {
        assert!(ResendCooldown::ready(t0()).can_resend());
    }
}
