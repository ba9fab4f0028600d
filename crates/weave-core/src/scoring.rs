//! Relationship health scoring.
//!
//! A friend's health score (0-100) has two parts:
//!
//! ```text
//! score = clamp(base + momentum, 0, 100)
//! base     = level * 2^(-days_since / half_life[tier])
//! momentum = momentum_score * weight * (1 - hours_since_update / window)
//! ```
//!
//! `level` is 100 when the friend has a completed weave and the configured
//! baseline (50) otherwise, in which case decay runs from `created_at`.
//! Inner Circle has the shortest half-life, so neglect shows up there first.
//! Momentum is a short-lived bonus after a weave and fades to zero at the end
//! of its window (24h by default).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::friend::Friend;
use crate::storage::ScoringConfig;
use crate::weave::Interaction;

pub const MAX_SCORE: f64 = 100.0;

/// Exponential half-life decay: `base * 2^(-age_days / half_life_days)`.
pub fn decayed_weight(base_weight: f64, age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 || age_days < 0.0 {
        return base_weight;
    }
    base_weight * (2.0_f64).powf(-age_days / half_life_days)
}

fn fractional_days(duration: Duration) -> f64 {
    (duration.num_seconds() as f64 / 86_400.0).max(0.0)
}

/// How a score was assembled, for display and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base: f64,
    pub momentum: f64,
    pub total: f64,
    /// Days since the last completed weave, if there is one
    pub days_since_last: Option<f64>,
}

/// Health score calculator.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    /// Create a new calculator with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config.
    pub fn with_config(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Decayed long-run score before momentum.
    pub fn base_score(&self, friend: &Friend, now: DateTime<Utc>) -> f64 {
        let half_life = self.config.half_life_days.get(friend.tier);
        match friend.last_interaction_at {
            Some(last) => decayed_weight(MAX_SCORE, fractional_days(now - last), half_life),
            None => decayed_weight(
                self.config.baseline_score,
                fractional_days(now - friend.created_at),
                half_life,
            ),
        }
    }

    /// Remaining fraction of momentum at `now`: 1.0 when just updated,
    /// 0.0 at or beyond the window.
    fn momentum_fade(&self, updated: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let hours = (now - updated).num_seconds() as f64 / 3_600.0;
        if hours < 0.0 {
            return 1.0;
        }
        (1.0 - hours / self.config.momentum_window_hours).max(0.0)
    }

    /// Short-term bonus from recent activity.
    pub fn momentum_bonus(&self, friend: &Friend, now: DateTime<Utc>) -> f64 {
        if friend.momentum_score <= 0.0 {
            return 0.0;
        }
        match friend.momentum_last_updated {
            Some(updated) => {
                friend.momentum_score * self.config.momentum_weight * self.momentum_fade(updated, now)
            }
            None => 0.0,
        }
    }

    /// Whether any momentum is still contributing.
    pub fn has_active_momentum(&self, friend: &Friend, now: DateTime<Utc>) -> bool {
        self.momentum_bonus(friend, now) > 0.0
    }

    pub fn breakdown(&self, friend: &Friend, now: DateTime<Utc>) -> ScoreBreakdown {
        let base = self.base_score(friend, now);
        let momentum = self.momentum_bonus(friend, now);
        ScoreBreakdown {
            base,
            momentum,
            total: (base + momentum).clamp(0.0, MAX_SCORE),
            days_since_last: friend
                .last_interaction_at
                .map(|last| fractional_days(now - last)),
        }
    }

    /// Current health score in `[0, 100]`.
    pub fn current_score(&self, friend: &Friend, now: DateTime<Utc>) -> f64 {
        let score = self.breakdown(friend, now).total;
        tracing::trace!(friend = %friend.id, score, "scored friend");
        score
    }

    /// Weighted mean score over non-dormant friends; closer tiers weigh more.
    /// Returns 0.0 when there is nobody to average.
    pub fn weighted_network_health(&self, friends: &[Friend], now: DateTime<Utc>) -> f64 {
        let (weighted_sum, total_weight) = friends
            .iter()
            .filter(|f| !f.is_dormant)
            .fold((0.0, 0.0), |(sum, weight), friend| {
                let w = self.config.tier_weights.get(friend.tier);
                (sum + self.current_score(friend, now) * w, weight + w)
            });

        if total_weight <= 0.0 {
            return 0.0;
        }
        (weighted_sum / total_weight).clamp(0.0, MAX_SCORE)
    }

    /// Cached fields after logging `weave` for `friend`.
    ///
    /// Planned/cancelled weaves and weaves that don't involve the friend
    /// leave the record unchanged. Otherwise `last_interaction_at` moves
    /// forward and momentum is bumped (on top of whatever is still active)
    /// up to the configured cap.
    pub fn apply_interaction(
        &self,
        friend: &Friend,
        weave: &Interaction,
        now: DateTime<Utc>,
    ) -> Friend {
        let mut updated = friend.clone();
        if !weave.is_completed() || !weave.involves(&friend.id) {
            return updated;
        }

        updated.last_interaction_at = updated.last_interaction_at.max(Some(weave.occurred_at));

        let carried = match friend.momentum_last_updated {
            Some(at) if friend.momentum_score > 0.0 => {
                friend.momentum_score * self.momentum_fade(at, now)
            }
            _ => 0.0,
        };
        updated.momentum_score = (carried + self.config.momentum_bump).min(self.config.momentum_cap);
        updated.momentum_last_updated = Some(now);

        tracing::debug!(
            friend = %friend.id,
            momentum = updated.momentum_score,
            "applied weave to friend"
        );
        updated
    }
}

/// Recompute `last_interaction_at` from a friend's full history.
pub fn refresh_from_history(friend: &Friend, interactions: &[Interaction]) -> Friend {
    let mut updated = friend.clone();
    updated.last_interaction_at = interactions
        .iter()
        .filter(|w| w.is_completed() && w.involves(&friend.id))
        .map(|w| w.occurred_at)
        .max();
    updated
}

/// Current score with the default tunables.
pub fn calculate_current_score(friend: &Friend, now: DateTime<Utc>) -> f64 {
    ScoreCalculator::new().current_score(friend, now)
}

/// Weighted network health with the default tunables.
pub fn calculate_weighted_network_health(friends: &[Friend], now: DateTime<Utc>) -> f64 {
    ScoreCalculator::new().weighted_network_health(friends, now)
}
