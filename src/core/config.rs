//! Arena configuration.
//!
//! Every section has sensible defaults and `with_*` builders, and the whole
//! tree can be loaded from a (possibly partial) JSON document:
//!
//! ```
//! use clue_arena::core::ArenaConfig;
//!
//! let config = ArenaConfig::from_json_str(r#"{ "allocation": { "min_games": 300 } }"#).unwrap();
//! assert_eq!(config.allocation.min_games, 300);
//! assert_eq!(config.game.turn_attempts, 3);
//! ```
//!
//! All durations are whole seconds.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::retry::RetryPolicy;

/// Configuration problems detected while loading or validating.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Turn dispatch and match rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Query attempts per turn.
    pub turn_attempts: u32,

    /// Timeout for a single query attempt.
    pub turn_timeout_secs: u64,

    /// An empty answer faster than this means the agent is saturated;
    /// retrying will not help.
    pub saturation_secs: u64,

    /// Hard cap on turns before the game is decided on remaining cards.
    pub max_turns: u32,

    /// Apply the response-speed multiplier to rewards.
    pub speed_modifier: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_attempts: 3,
            turn_timeout_secs: 30,
            saturation_secs: 3,
            max_turns: 60,
            speed_modifier: false,
        }
    }
}

impl GameConfig {
    /// Set attempts per turn.
    #[must_use]
    pub fn with_turn_attempts(mut self, attempts: u32) -> Self {
        self.turn_attempts = attempts;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn with_turn_timeout(mut self, secs: u64) -> Self {
        self.turn_timeout_secs = secs;
        self
    }

    /// Set the turn cap.
    #[must_use]
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Enable the speed multiplier.
    #[must_use]
    pub fn with_speed_modifier(mut self, enabled: bool) -> Self {
        self.speed_modifier = enabled;
        self
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn saturation(&self) -> Duration {
        Duration::from_secs(self.saturation_secs)
    }
}

/// Rolling windows shared by the selector and the allocator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Coarse window capping repeat selection.
    pub epoch_secs: i64,

    /// Rolling window for fairness and allocation aggregates.
    pub scoring_window_secs: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            epoch_secs: 24 * 3600,
            scoring_window_secs: 6 * 3600,
        }
    }
}

/// Fairness selector thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Identities with less stake are never selected.
    pub min_stake: f64,

    /// Timeout for one reachability probe.
    pub probe_timeout_secs: u64,

    /// Window average below this disqualifies a reachable candidate.
    pub score_floor: f64,

    /// Second-slot candidates may exceed the median window count by this much.
    pub median_slack: u64,

    /// Abort second-slot selection when the minimum count exceeds this.
    pub second_slot_cap: u64,

    /// Pool reconstructions allowed while looking for player 2.
    pub max_pool_rebuilds: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_stake: 0.0,
            probe_timeout_secs: 10,
            score_floor: -0.5,
            median_slack: 2,
            second_slot_cap: 50,
            max_pool_rebuilds: 3,
        }
    }
}

impl SelectionConfig {
    /// Set the minimum stake.
    #[must_use]
    pub fn with_min_stake(mut self, stake: f64) -> Self {
        self.min_stake = stake;
        self
    }

    /// Set the score floor.
    #[must_use]
    pub fn with_score_floor(mut self, floor: f64) -> Self {
        self.score_floor = floor;
        self
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Local ledger placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Root directory; each competition gets `<data_dir>/<competition>/scores.db`.
    pub data_dir: PathBuf,

    /// This validator's own identity, skipped when building fact rows.
    pub validator_hotkey: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            validator_hotkey: String::new(),
        }
    }
}

/// Backend synchronization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Backend base URL, e.g. `https://backend.example.org/api/v1`.
    pub backend_url: String,

    /// Page size requested from `/scores/sync`.
    pub page_limit: u32,

    /// Pages pulled per cycle before yielding.
    pub max_pages_per_cycle: u32,

    /// Per-request timeout.
    pub request_timeout_secs: u64,

    /// Push cadence.
    pub push_interval_secs: u64,

    /// Pull cadence.
    pub pull_interval_secs: u64,

    /// Retry policy for a single pull page.
    pub retry: RetryPolicy,

    /// Consecutive failures before the breaker opens.
    pub breaker_threshold: u32,

    /// Time the breaker stays open.
    pub breaker_recovery_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            page_limit: 500,
            max_pages_per_cycle: 50,
            request_timeout_secs: 10,
            push_interval_secs: 60,
            pull_interval_secs: 300,
            retry: RetryPolicy::default(),
            breaker_threshold: 5,
            breaker_recovery_secs: 60,
        }
    }
}

impl SyncConfig {
    /// Set the backend URL.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Weight allocation safeguards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Allocation cadence.
    pub interval_secs: u64,

    /// Ledger data older than this forces the burn vector.
    pub staleness_secs: i64,

    /// Games required in-window before a competition can have a winner.
    pub min_games: u64,

    /// Identities need at least `median - count_slack` records.
    pub count_slack: u64,

    /// Sentinel uid receiving burned weight.
    pub burn_uid: u16,

    /// Share of every vector blended onto the burn uid, in `[0, 1]`.
    pub burn_ratio: f64,

    /// Stake required to receive weight.
    pub min_stake: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1_200,
            staleness_secs: 3_600,
            min_games: 100,
            count_slack: 5,
            burn_uid: 0,
            burn_ratio: 0.0,
            min_stake: 0.0,
        }
    }
}

impl AllocationConfig {
    /// Set the minimum game count.
    #[must_use]
    pub fn with_min_games(mut self, games: u64) -> Self {
        self.min_games = games;
        self
    }

    /// Set the burn blend ratio.
    #[must_use]
    pub fn with_burn_ratio(mut self, ratio: f64) -> Self {
        self.burn_ratio = ratio;
        self
    }

    /// Set the record-count slack.
    #[must_use]
    pub fn with_count_slack(mut self, slack: u64) -> Self {
        self.count_slack = slack;
        self
    }
}

/// Complete arena configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub game: GameConfig,
    pub windows: WindowConfig,
    pub selection: SelectionConfig,
    pub ledger: LedgerConfig,
    pub sync: SyncConfig,
    pub allocation: AllocationConfig,
}

impl ArenaConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ArenaConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or corrupt the loops.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.turn_attempts == 0 {
            return Err(invalid("game.turn_attempts", "must be at least 1"));
        }
        if self.game.turn_timeout_secs == 0 {
            return Err(invalid("game.turn_timeout_secs", "must be positive"));
        }
        if self.game.saturation_secs >= self.game.turn_timeout_secs {
            return Err(invalid(
                "game.saturation_secs",
                "must be shorter than the turn timeout",
            ));
        }
        if self.game.max_turns == 0 {
            return Err(invalid("game.max_turns", "must be at least 1"));
        }
        if self.windows.scoring_window_secs <= 0 || self.windows.epoch_secs <= 0 {
            return Err(invalid("windows", "window lengths must be positive"));
        }
        if self.sync.page_limit == 0 {
            return Err(invalid("sync.page_limit", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.allocation.burn_ratio) {
            return Err(invalid(
                "allocation.burn_ratio",
                format!("{} is outside [0, 1]", self.allocation.burn_ratio),
            ));
        }
        if self.allocation.staleness_secs <= 0 {
            return Err(invalid("allocation.staleness_secs", "must be positive"));
        }
        Ok(())
    }
}
