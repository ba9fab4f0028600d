//! TOML-based engine configuration.
//!
//! Stores the tunables of the health and suggestion engine:
//! - Score decay half-lives and momentum weighting
//! - Tier-fit expected intervals and classification bands
//! - Trigger thresholds and lookahead windows
//! - Guaranteed-suggestion floors and selection pools
//! - Aggregator caps
//!
//! Configuration is stored at `~/.config/weave/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::friend::Tier;

/// One value per care tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub inner_circle: T,
    pub close_friends: T,
    pub community: T,
}

impl<T: Copy> TierTable<T> {
    pub fn new(inner_circle: T, close_friends: T, community: T) -> Self {
        Self {
            inner_circle,
            close_friends,
            community,
        }
    }

    pub fn get(&self, tier: Tier) -> T {
        match tier {
            Tier::InnerCircle => self.inner_circle,
            Tier::CloseFriends => self.close_friends,
            Tier::Community => self.community,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, T)> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}

/// Health score tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Starting level for friends with no completed weave yet
    #[serde(default = "default_baseline_score")]
    pub baseline_score: f64,
    /// Multiplier applied to `momentum_score` while momentum is active
    #[serde(default = "default_momentum_weight")]
    pub momentum_weight: f64,
    #[serde(default = "default_momentum_window_hours")]
    pub momentum_window_hours: f64,
    /// Momentum added per logged weave
    #[serde(default = "default_momentum_bump")]
    pub momentum_bump: f64,
    #[serde(default = "default_momentum_cap")]
    pub momentum_cap: f64,
    /// Days for the base score to halve, per tier
    #[serde(default = "default_half_life_days")]
    pub half_life_days: TierTable<f64>,
    /// Weight of each tier in the network average
    #[serde(default = "default_tier_weights")]
    pub tier_weights: TierTable<f64>,
}

/// Tier fit tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierFitConfig {
    /// actual/expected ratio bounds for a great fit
    #[serde(default = "default_great_band")]
    pub great_band: (f64, f64),
    /// actual/expected ratio bounds for a good fit
    #[serde(default = "default_good_band")]
    pub good_band: (f64, f64),
    /// Below this many completed weaves the analysis is preliminary
    #[serde(default = "default_confident_interactions")]
    pub confident_interactions: usize,
    #[serde(default = "default_expected_interval_days")]
    pub expected_interval_days: TierTable<f64>,
}

/// Triggered suggestion thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    /// Inner Circle friends below this score are critical
    #[serde(default = "default_critical_drift_score")]
    pub critical_drift_score: f64,
    /// Close Friends below this score are drifting
    #[serde(default = "default_high_drift_score")]
    pub high_drift_score: f64,
    /// Community friends below this score need maintenance
    #[serde(default = "default_maintain_score")]
    pub maintain_score: f64,
    #[serde(default = "default_reflect_window_hours")]
    pub reflect_window_hours: i64,
    #[serde(default = "default_intention_reminder_days")]
    pub intention_reminder_days: i64,
    #[serde(default = "default_momentum_celebrate_score")]
    pub momentum_celebrate_score: f64,
}

/// Guaranteed suggestion tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuaranteedConfig {
    #[serde(default = "default_nudge_floor_normal")]
    pub nudge_floor_normal: f64,
    #[serde(default = "default_nudge_floor_resting")]
    pub nudge_floor_resting: f64,
    /// Lowest-scoring friends the gentle nudge picks from
    #[serde(default = "default_nudge_pool")]
    pub nudge_pool: usize,
    /// Chance of a time/day-specific wildcard over a generic one
    #[serde(default = "default_wildcard_context_chance")]
    pub wildcard_context_chance: f64,
    #[serde(default = "default_community_pool")]
    pub community_pool: usize,
    /// Upper bound of the random jitter added to scores in the variety step
    #[serde(default = "default_variety_jitter")]
    pub variety_jitter: f64,
    /// Reach-out fallback runs while fewer than this many were produced
    #[serde(default = "default_fallback_minimum")]
    pub fallback_minimum: usize,
}

/// Final list assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_max_guaranteed")]
    pub max_guaranteed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total: Option<usize>,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/weave/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed RNG seed for reproducible suggestions (None = entropy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tier_fit: TierFitConfig,
    #[serde(default)]
    pub triggers: TriggerConfig,
    #[serde(default)]
    pub guaranteed: GuaranteedConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

// Default functions
fn default_half_life_days() -> TierTable<f64> {
    TierTable::new(10.0, 21.0, 45.0)
}
fn default_baseline_score() -> f64 {
    50.0
}
fn default_momentum_weight() -> f64 {
    1.0
}
fn default_momentum_window_hours() -> f64 {
    24.0
}
fn default_momentum_bump() -> f64 {
    15.0
}
fn default_momentum_cap() -> f64 {
    30.0
}
fn default_tier_weights() -> TierTable<f64> {
    TierTable::new(3.0, 2.0, 1.0)
}
fn default_expected_interval_days() -> TierTable<f64> {
    TierTable::new(7.0, 21.0, 60.0)
}
fn default_great_band() -> (f64, f64) {
    (0.7, 1.3)
}
fn default_good_band() -> (f64, f64) {
    (0.5, 2.0)
}
fn default_confident_interactions() -> usize {
    5
}
fn default_lookahead_days() -> i64 {
    7
}
fn default_critical_drift_score() -> f64 {
    30.0
}
fn default_high_drift_score() -> f64 {
    35.0
}
fn default_maintain_score() -> f64 {
    20.0
}
fn default_reflect_window_hours() -> i64 {
    48
}
fn default_intention_reminder_days() -> i64 {
    7
}
fn default_momentum_celebrate_score() -> f64 {
    85.0
}
fn default_nudge_floor_normal() -> f64 {
    40.0
}
fn default_nudge_floor_resting() -> f64 {
    20.0
}
fn default_nudge_pool() -> usize {
    5
}
fn default_wildcard_context_chance() -> f64 {
    0.6
}
fn default_community_pool() -> usize {
    3
}
fn default_variety_jitter() -> f64 {
    25.0
}
fn default_fallback_minimum() -> usize {
    3
}
fn default_max_guaranteed() -> usize {
    3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_days: default_half_life_days(),
            baseline_score: default_baseline_score(),
            momentum_weight: default_momentum_weight(),
            momentum_window_hours: default_momentum_window_hours(),
            momentum_bump: default_momentum_bump(),
            momentum_cap: default_momentum_cap(),
            tier_weights: default_tier_weights(),
        }
    }
}

impl Default for TierFitConfig {
    fn default() -> Self {
        Self {
            expected_interval_days: default_expected_interval_days(),
            great_band: default_great_band(),
            good_band: default_good_band(),
            confident_interactions: default_confident_interactions(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
            critical_drift_score: default_critical_drift_score(),
            high_drift_score: default_high_drift_score(),
            maintain_score: default_maintain_score(),
            reflect_window_hours: default_reflect_window_hours(),
            intention_reminder_days: default_intention_reminder_days(),
            momentum_celebrate_score: default_momentum_celebrate_score(),
        }
    }
}

impl Default for GuaranteedConfig {
    fn default() -> Self {
        Self {
            nudge_floor_normal: default_nudge_floor_normal(),
            nudge_floor_resting: default_nudge_floor_resting(),
            nudge_pool: default_nudge_pool(),
            wildcard_context_chance: default_wildcard_context_chance(),
            community_pool: default_community_pool(),
            variety_jitter: default_variety_jitter(),
            fallback_minimum: default_fallback_minimum(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_guaranteed: default_max_guaranteed(),
            max_total: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            scoring: ScoringConfig::default(),
            tier_fit: TierFitConfig::default(),
            triggers: TriggerConfig::default(),
            guaranteed: GuaranteedConfig::default(),
            aggregator: AggregatorConfig::default(),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || invalid(key, "unknown config key");
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(invalid(key, "config key is empty"));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let new_value = match obj.get(part) {
                Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(key, e.to_string()))?,
                ),
                Some(serde_json::Value::Number(_)) => parse_number(key, value)?,
                Some(serde_json::Value::Object(_)) | Some(serde_json::Value::Array(_)) => {
                    serde_json::from_str(value).map_err(|e| invalid(key, e.to_string()))?
                }
                Some(_) => serde_json::Value::String(value.into()),
                // Optional numeric fields are omitted while unset
                None if matches!(key, "seed" | "aggregator.max_total") => {
                    parse_number(key, value)?
                }
                None => return Err(unknown()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the user config file.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the user config path, writing defaults if the file is missing.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            return Ok(cfg);
        }
        Self::load_from(&path)
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: EngineConfig = toml::from_str(&content).map_err(ConfigError::from)?;
        cfg.validate()?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default engine config");
                Self::default()
            }
        }
    }

    /// Persist to the user config path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The result is validated before
    /// it replaces `self`; nothing is written to disk.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject configurations that would break engine invariants.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (tier, half_life) in self.scoring.half_life_days.iter() {
            if half_life <= 0.0 {
                return Err(invalid(
                    &format!("scoring.half_life_days.{}", tier.key()),
                    "must be positive",
                ));
            }
        }
        if !(0.0..=100.0).contains(&self.scoring.baseline_score) {
            return Err(invalid("scoring.baseline_score", "must be within 0-100"));
        }
        if self.scoring.momentum_window_hours <= 0.0 {
            return Err(invalid("scoring.momentum_window_hours", "must be positive"));
        }
        if self.scoring.tier_weights.iter().any(|(_, w)| w < 0.0) {
            return Err(invalid("scoring.tier_weights", "weights must not be negative"));
        }

        let intervals = &self.tier_fit.expected_interval_days;
        if !(0.0 < intervals.inner_circle
            && intervals.inner_circle < intervals.close_friends
            && intervals.close_friends < intervals.community)
        {
            return Err(invalid(
                "tier_fit.expected_interval_days",
                "must be positive and increase from inner_circle to community",
            ));
        }
        let (great_lo, great_hi) = self.tier_fit.great_band;
        let (good_lo, good_hi) = self.tier_fit.good_band;
        if !(good_lo <= great_lo && great_lo <= 1.0 && 1.0 <= great_hi && great_hi <= good_hi) {
            return Err(invalid(
                "tier_fit",
                "great_band must contain 1.0 and sit inside good_band",
            ));
        }
        if self.tier_fit.confident_interactions < 2 {
            return Err(invalid("tier_fit.confident_interactions", "must be at least 2"));
        }

        if self.triggers.lookahead_days < 0 {
            return Err(invalid("triggers.lookahead_days", "must not be negative"));
        }
        if self.guaranteed.nudge_floor_resting >= self.guaranteed.nudge_floor_normal {
            return Err(invalid(
                "guaranteed.nudge_floor_resting",
                "must be below nudge_floor_normal",
            ));
        }
        if !(0.0..=1.0).contains(&self.guaranteed.wildcard_context_chance) {
            return Err(invalid("guaranteed.wildcard_context_chance", "must be within 0-1"));
        }
        if self.guaranteed.nudge_pool == 0 || self.guaranteed.community_pool == 0 {
            return Err(invalid("guaranteed", "selection pools must hold at least one friend"));
        }
        if self.guaranteed.variety_jitter < 0.0 {
            return Err(invalid("guaranteed.variety_jitter", "must not be negative"));
        }
        if self.aggregator.max_guaranteed == 0 {
            return Err(invalid("aggregator.max_guaranteed", "must be at least 1"));
        }
        if self.aggregator.max_total == Some(0) {
            return Err(invalid("aggregator.max_total", "must be at least 1"));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> std::result::Result<serde_json::Value, ConfigError> {
    if let Ok(n) = value.parse::<u64>() {
        Ok(serde_json::Value::Number(n.into()))
    } else if let Ok(n) = value.parse::<f64>() {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))
    } else {
        Err(invalid(key, format!("cannot parse '{value}' as number")))
    }
}
