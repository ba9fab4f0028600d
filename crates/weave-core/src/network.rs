//! Network-wide health: one compact score plus a per-tier fit breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::friend::Tier;
use crate::scoring::ScoreCalculator;
use crate::storage::{EngineConfig, WeaveRepository};
use crate::tier_fit::{FitCategory, TierFitAnalysis, TierFitAnalyzer};

/// Fit counts for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierHealth {
    pub total: usize,
    pub great: usize,
    pub good: usize,
    pub mismatch: usize,
    pub insufficient_data: usize,
}

impl TierHealth {
    fn record(&mut self, category: FitCategory) {
        self.total += 1;
        match category {
            FitCategory::Great => self.great += 1,
            FitCategory::Good => self.good += 1,
            FitCategory::Mismatch => self.mismatch += 1,
            FitCategory::InsufficientData => self.insufficient_data += 1,
        }
    }
}

/// Messaging band for the 0-10 health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    /// 8-10
    Great,
    /// 5-7
    Ok,
    /// 0-4
    NeedsAttention,
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        if score >= 8 {
            HealthStatus::Great
        } else if score >= 5 {
            HealthStatus::Ok
        } else {
            HealthStatus::NeedsAttention
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            HealthStatus::Great => "Your network is thriving",
            HealthStatus::Ok => "Your network is doing okay",
            HealthStatus::NeedsAttention => "A few connections need attention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkHealth {
    /// Weighted health compressed to 0-10
    pub health_score: u8,
    /// Weighted health on the 0-100 scale
    pub weighted_score: f64,
    pub status: HealthStatus,
    pub tier_health: BTreeMap<Tier, TierHealth>,
    pub all_analyses: Vec<TierFitAnalysis>,
    pub mismatches: Vec<TierFitAnalysis>,
}

/// Compress a 0-100 score to the 0-10 display scale.
pub fn compress_score(weighted: f64) -> u8 {
    (weighted / 10.0).round().clamp(0.0, 10.0) as u8
}

/// Runs scoring and tier fit over every non-dormant friend.
#[derive(Debug, Clone, Default)]
pub struct NetworkHealthAggregator {
    scorer: ScoreCalculator,
    analyzer: TierFitAnalyzer,
}

impl NetworkHealthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            scorer: ScoreCalculator::with_config(config.scoring.clone()),
            analyzer: TierFitAnalyzer::with_config(config.tier_fit.clone()),
        }
    }

    pub fn compute<R: WeaveRepository + ?Sized>(&self, repo: &R, now: DateTime<Utc>) -> NetworkHealth {
        let friends = repo.friends();
        let weighted_score = self.scorer.weighted_network_health(friends, now);
        let health_score = compress_score(weighted_score);

        let mut tier_health: BTreeMap<Tier, TierHealth> =
            Tier::ALL.iter().map(|&t| (t, TierHealth::default())).collect();
        let mut all_analyses = Vec::new();

        for friend in friends.iter().filter(|f| !f.is_dormant) {
            let interactions = repo.interactions_for(&friend.id);
            let analysis = self.analyzer.analyze_history(friend, &interactions);
            tier_health
                .entry(friend.tier)
                .or_default()
                .record(analysis.category());
            all_analyses.push(analysis);
        }

        let mismatches: Vec<TierFitAnalysis> = all_analyses
            .iter()
            .filter(|a| a.is_mismatch())
            .cloned()
            .collect();

        tracing::debug!(
            health_score,
            analyzed = all_analyses.len(),
            mismatches = mismatches.len(),
            "computed network health"
        );

        NetworkHealth {
            health_score,
            weighted_score,
            status: HealthStatus::from_score(health_score),
            tier_health,
            all_analyses,
            mismatches,
        }
    }
}

/// Network health with the default tunables.
pub fn compute_network_health<R: WeaveRepository + ?Sized>(
    repo: &R,
    now: DateTime<Utc>,
) -> NetworkHealth {
    NetworkHealthAggregator::new().compute(repo, now)
}
