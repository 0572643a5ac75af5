//! Per-seat reward vectors.
//!
//! ## Base rewards
//!
//! Winning seats get 1.0 and losing seats 0.0. When the game ended on
//! `invalid_clue` the losing spymaster is charged -1.0 instead.
//!
//! ## Speed modifier
//!
//! Optional. [`SpeedTracker`] records response latency per seat and turns
//! it into a multiplier in `[1 - SPEED_PENALTY_MAX, 1 + SPEED_BONUS_MAX]`.

use std::time::Duration;

use tracing::debug;

use super::state::EndReason;
use crate::core::{Role, Seat, SeatMap, Team};

/// Latency charged for a timed-out query.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
/// Average latency at or below which a bonus applies.
pub const FAST_RESPONSE_THRESHOLD: Duration = Duration::from_secs(5);
/// Average latency at or above which a penalty applies.
pub const SLOW_RESPONSE_THRESHOLD: Duration = Duration::from_secs(20);
pub const SPEED_BONUS_MAX: f64 = 0.3;
pub const SPEED_PENALTY_MAX: f64 = 0.2;

/// Base reward per seat for a finished game.
///
/// ```
/// use clue_arena::core::{Seat, Team};
/// use clue_arena::game::{reward::base_rewards, EndReason};
///
/// let r = base_rewards(Team::Red, EndReason::InvalidClue);
/// assert_eq!(r.as_array(), &[1.0, 1.0, -1.0, 0.0]);
/// ```
#[must_use]
pub fn base_rewards(winner: Team, reason: EndReason) -> SeatMap<f64> {
    SeatMap::new(|seat| {
        if seat.team == winner {
            1.0
        } else if reason == EndReason::InvalidClue && seat.role == Role::Spymaster {
            -1.0
        } else {
            0.0
        }
    })
}

#[derive(Clone, Debug, Default)]
struct SeatLatency {
    samples: Vec<Duration>,
    timeouts: u32,
}

impl SeatLatency {
    fn average(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        Some(total / self.samples.len() as u32)
    }

    fn timeout_rate(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            f64::from(self.timeouts) / self.samples.len() as f64
        }
    }
}

/// Response latency per seat over one game.
#[derive(Clone, Debug)]
pub struct SpeedTracker {
    seats: SeatMap<SeatLatency>,
}

impl Default for SpeedTracker {
    fn default() -> Self {
        Self {
            seats: SeatMap::new(|_| SeatLatency::default()),
        }
    }
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one query. Timeouts are charged the full timeout.
    pub fn record(&mut self, seat: Seat, elapsed: Duration, timed_out: bool) {
        let entry = &mut self.seats[seat];
        if timed_out {
            entry.timeouts += 1;
            entry.samples.push(RESPONSE_TIMEOUT);
        } else {
            entry.samples.push(elapsed);
        }
    }

    /// Average latency for `seat`, if it was queried.
    #[must_use]
    pub fn average(&self, seat: Seat) -> Option<Duration> {
        self.seats[seat].average()
    }

    /// Reward multiplier for `seat`; 1.0 when no queries were recorded.
    #[must_use]
    pub fn multiplier(&self, seat: Seat) -> f64 {
        let entry = &self.seats[seat];
        let Some(avg) = entry.average() else {
            return 1.0;
        };
        if entry.timeout_rate() > 0.5 {
            return 1.0 - SPEED_PENALTY_MAX;
        }

        let avg = avg.as_secs_f64();
        let fast = FAST_RESPONSE_THRESHOLD.as_secs_f64();
        let slow = SLOW_RESPONSE_THRESHOLD.as_secs_f64();
        if avg <= fast {
            1.0 + (1.0 - avg / fast) * SPEED_BONUS_MAX
        } else if avg >= slow {
            let span = RESPONSE_TIMEOUT.as_secs_f64() - slow;
            let ratio = ((avg - slow) / span).min(1.0);
            1.0 - ratio * SPEED_PENALTY_MAX
        } else {
            1.0
        }
    }

    /// Scale `rewards` by each seat's multiplier.
    #[must_use]
    pub fn apply(&self, rewards: &SeatMap<f64>) -> SeatMap<f64> {
        rewards.map(|seat, reward| {
            let m = self.multiplier(seat);
            if (m - 1.0).abs() > f64::EPSILON {
                debug!(seat = %seat, multiplier = m, "speed multiplier applied");
            }
            reward * m
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_rewards() {
        assert_eq!(
            base_rewards(Team::Blue, EndReason::Assassin).as_array(),
            &[0.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(
            base_rewards(Team::Blue, EndReason::InvalidClue).as_array(),
            &[-1.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_multiplier_neutral_without_samples() {
        assert_eq!(SpeedTracker::new().multiplier(Seat::RED_OPERATIVE), 1.0);
    }

    #[test]
    fn test_fast_bonus() {
        let mut t = SpeedTracker::new();
        t.record(Seat::RED_SPYMASTER, Duration::ZERO, false);
        assert!((t.multiplier(Seat::RED_SPYMASTER) - 1.3).abs() < 1e-9);

        let mut t = SpeedTracker::new();
        t.record(Seat::RED_SPYMASTER, Duration::from_millis(2_500), false);
        assert!((t.multiplier(Seat::RED_SPYMASTER) - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_slow_penalty_and_neutral_band() {
        let mut t = SpeedTracker::new();
        t.record(Seat::BLUE_SPYMASTER, Duration::from_secs(25), false);
        assert!((t.multiplier(Seat::BLUE_SPYMASTER) - 0.9).abs() < 1e-9);

        t.record(Seat::BLUE_OPERATIVE, Duration::from_secs(10), false);
        assert_eq!(t.multiplier(Seat::BLUE_OPERATIVE), 1.0);
    }

    #[test]
    fn test_mostly_timeouts_max_penalty() {
        let mut t = SpeedTracker::new();
        t.record(Seat::RED_OPERATIVE, Duration::from_secs(1), false);
        t.record(Seat::RED_OPERATIVE, Duration::ZERO, true);
        t.record(Seat::RED_OPERATIVE, Duration::ZERO, true);
        assert!((t.multiplier(Seat::RED_OPERATIVE) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_apply() {
        let mut t = SpeedTracker::new();
        t.record(Seat::RED_SPYMASTER, Duration::ZERO, false);
        let scaled = t.apply(&base_rewards(Team::Red, EndReason::AllRevealed));
        assert!((scaled[Seat::RED_SPYMASTER] - 1.3).abs() < 1e-9);
        assert_eq!(scaled[Seat::RED_OPERATIVE], 1.0);
        assert_eq!(scaled[Seat::BLUE_SPYMASTER], 0.0);
    }
}
