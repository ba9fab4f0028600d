//! Tier fit analysis.
//!
//! Compares how often a friend is actually seen with the cadence their care
//! tier implies:
//!
//! ```text
//! ratio = mean gap between completed weaves / expected interval[tier]
//! ```
//!
//! | ratio             | fit        |
//! |-------------------|------------|
//! | inside great band | `great`    |
//! | inside good band  | `good`     |
//! | otherwise         | `mismatch` (suggest the tier with the nearest interval, if it differs) |
//!
//! Fewer than two completed weaves give no interval at all, so the result is
//! `insufficient_data` and nothing else is computed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::friend::{Friend, FriendId, Tier};
use crate::storage::{TierFitConfig, WeaveRepository};
use crate::weave::Interaction;

/// Fewest completed weaves that yield an interval.
pub const MIN_INTERACTIONS: usize = 2;

/// Outcome of a tier fit check. `suggested_tier` only exists on a mismatch,
/// and is `None` when the current tier is already the nearest one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "fitCategory",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum TierFit {
    Great { actual_interval_days: f64 },
    Good { actual_interval_days: f64 },
    Mismatch {
        actual_interval_days: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested_tier: Option<Tier>,
    },
    InsufficientData,
}

/// Field-less view of [`TierFit`] for counting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitCategory {
    Great,
    Good,
    Mismatch,
    InsufficientData,
}

impl fmt::Display for FitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitCategory::Great => "great",
            FitCategory::Good => "good",
            FitCategory::Mismatch => "mismatch",
            FitCategory::InsufficientData => "insufficient_data",
        })
    }
}

impl TierFit {
    pub fn category(&self) -> FitCategory {
        match self {
            TierFit::Great { .. } => FitCategory::Great,
            TierFit::Good { .. } => FitCategory::Good,
            TierFit::Mismatch { .. } => FitCategory::Mismatch,
            TierFit::InsufficientData => FitCategory::InsufficientData,
        }
    }

    pub fn actual_interval_days(&self) -> Option<f64> {
        match *self {
            TierFit::Great {
                actual_interval_days,
            }
            | TierFit::Good {
                actual_interval_days,
            }
            | TierFit::Mismatch {
                actual_interval_days,
                ..
            } => Some(actual_interval_days),
            TierFit::InsufficientData => None,
        }
    }

    pub fn suggested_tier(&self) -> Option<Tier> {
        match *self {
            TierFit::Mismatch { suggested_tier, .. } => suggested_tier,
            _ => None,
        }
    }
}

/// Tier fit result for one friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFitAnalysis {
    pub friend_id: FriendId,
    pub friend_name: String,
    pub current_tier: Tier,
    pub interaction_count: usize,
    pub expected_interval_days: f64,
    /// Early read: enough data to classify, not enough to be confident
    pub is_preliminary: bool,
    #[serde(flatten)]
    pub fit: TierFit,
}

impl TierFitAnalysis {
    pub fn category(&self) -> FitCategory {
        self.fit.category()
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self.fit, TierFit::Mismatch { .. })
    }
}

/// Mean gap in days between consecutive timestamps (sorted ascending).
fn mean_gap_days(sorted: &[&Interaction]) -> f64 {
    let gaps: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1].occurred_at - pair[0].occurred_at).num_seconds() as f64 / 86_400.0)
        .collect();
    gaps.iter().sum::<f64>() / gaps.len() as f64
}

/// Tier fit analyzer.
#[derive(Debug, Clone, Default)]
pub struct TierFitAnalyzer {
    config: TierFitConfig,
}

impl TierFitAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TierFitConfig) -> Self {
        Self { config }
    }

    pub fn expected_interval_days(&self, tier: Tier) -> f64 {
        self.config.expected_interval_days.get(tier)
    }

    /// Tier whose expected interval is nearest to `actual_days`.
    /// Ties go to the closer tier.
    pub fn nearest_tier(&self, actual_days: f64) -> Tier {
        let mut best = Tier::InnerCircle;
        let mut best_distance = f64::INFINITY;
        for (tier, expected) in self.config.expected_interval_days.iter() {
            let distance = (expected - actual_days).abs();
            if distance < best_distance {
                best = tier;
                best_distance = distance;
            }
        }
        best
    }

    /// Classify an actual interval against `tier`.
    pub fn classify(&self, tier: Tier, actual_interval_days: f64) -> TierFit {
        let ratio = actual_interval_days / self.expected_interval_days(tier);
        let (great_lo, great_hi) = self.config.great_band;
        let (good_lo, good_hi) = self.config.good_band;

        if (great_lo..=great_hi).contains(&ratio) {
            return TierFit::Great {
                actual_interval_days,
            };
        }
        if (good_lo..=good_hi).contains(&ratio) {
            return TierFit::Good {
                actual_interval_days,
            };
        }

        let nearest = self.nearest_tier(actual_interval_days);
        TierFit::Mismatch {
            actual_interval_days,
            suggested_tier: (nearest != tier).then_some(nearest),
        }
    }

    /// Analyze a friend against any slice of weaves; non-completed weaves and
    /// weaves that don't involve the friend are ignored.
    pub fn analyze_history(&self, friend: &Friend, interactions: &[&Interaction]) -> TierFitAnalysis {
        let mut completed: Vec<&Interaction> = interactions
            .iter()
            .copied()
            .filter(|w| w.is_completed() && w.involves(&friend.id))
            .collect();
        completed.sort_by_key(|w| w.occurred_at);

        let interaction_count = completed.len();
        let expected_interval_days = self.expected_interval_days(friend.tier);

        let fit = if interaction_count < MIN_INTERACTIONS {
            TierFit::InsufficientData
        } else {
            self.classify(friend.tier, mean_gap_days(&completed))
        };

        tracing::trace!(
            friend = %friend.id,
            count = interaction_count,
            fit = %fit.category(),
            "analyzed tier fit"
        );

        TierFitAnalysis {
            friend_id: friend.id.clone(),
            friend_name: friend.name.clone(),
            current_tier: friend.tier,
            interaction_count,
            expected_interval_days,
            is_preliminary: (MIN_INTERACTIONS..self.config.confident_interactions).contains(&interaction_count),
            fit,
        }
    }

    /// Analyze a friend by id.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] when the id is unknown.
    pub fn analyze<R: WeaveRepository + ?Sized>(
        &self,
        repo: &R,
        friend_id: &str,
    ) -> Result<TierFitAnalysis> {
        let friend = repo
            .friend(friend_id)
            .ok_or_else(|| CoreError::friend_not_found(friend_id))?;
        let interactions = repo.interactions_for(friend_id);
        Ok(self.analyze_history(friend, &interactions))
    }
}

/// Analyze a friend by id with the default tunables.
pub fn analyze_tier_fit<R: WeaveRepository + ?Sized>(
    repo: &R,
    friend_id: &str,
) -> Result<TierFitAnalysis> {
    TierFitAnalyzer::new().analyze(repo, friend_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryRepository, Snapshot};
    use crate::weave::{InteractionCategory, InteractionStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    fn spaced(friend_id: &str, count: usize, every_days: i64) -> Vec<Interaction> {
        (0..count)
            .map(|i| {
                Interaction::completed(
                    format!("{friend_id}-w{i}"),
                    friend_id,
                    start() + Duration::days(every_days * i as i64),
                    InteractionCategory::Hangout,
                )
            })
            .collect()
    }

    fn analyze(tier: Tier, weaves: &[Interaction]) -> TierFitAnalysis {
        let friend = Friend::new("f", "Friend", tier, start());
        let refs: Vec<&Interaction> = weaves.iter().collect();
        TierFitAnalyzer::new().analyze_history(&friend, &refs)
    }

    #[test]
    fn test_community_friend_seen_every_ten_days_is_mismatch() {
        let analysis = analyze(Tier::Community, &spaced("f", 6, 10));
        assert_eq!(analysis.expected_interval_days, 60.0);
        assert_eq!(analysis.interaction_count, 6);
        assert!(!analysis.is_preliminary);
        match analysis.fit {
            TierFit::Mismatch {
                actual_interval_days,
                suggested_tier,
            } => {
                assert!((actual_interval_days - 10.0).abs() < 1e-9);
                // |7 - 10| < |21 - 10|
                assert_eq!(suggested_tier, Some(Tier::InnerCircle));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_single_weave_is_insufficient_data() {
        let analysis = analyze(Tier::CloseFriends, &spaced("f", 1, 10));
        assert_eq!(analysis.fit, TierFit::InsufficientData);
        assert_eq!(analysis.interaction_count, 1);
        assert_eq!(analysis.fit.suggested_tier(), None);
        assert_eq!(analysis.fit.actual_interval_days(), None);
        assert!(!analysis.is_preliminary);
    }

    #[test]
    fn test_no_weaves_is_insufficient_data() {
        let analysis = analyze(Tier::InnerCircle, &[]);
        assert_eq!(analysis.category(), FitCategory::InsufficientData);
        assert_eq!(analysis.interaction_count, 0);
        assert!(!analysis.is_preliminary);
    }

    #[test]
    fn test_two_weaves_are_preliminary() {
        let analysis = analyze(Tier::CloseFriends, &spaced("f", 2, 21));
        assert_eq!(analysis.category(), FitCategory::Great);
        assert!(analysis.is_preliminary);
    }

    #[test]
    fn test_cadence_on_target_is_great_and_preliminary_when_few() {
        let analysis = analyze(Tier::InnerCircle, &spaced("f", 3, 7));
        assert_eq!(analysis.category(), FitCategory::Great);
        assert!(analysis.is_preliminary);
    }

    #[test]
    fn test_cadence_within_good_band_is_good() {
        // 12 / 7 ~ 1.71
        let analysis = analyze(Tier::InnerCircle, &spaced("f", 5, 12));
        assert_eq!(analysis.category(), FitCategory::Good);
        assert!(!analysis.is_preliminary);
    }

    #[test]
    fn test_inner_circle_seen_daily_is_mismatch_without_better_tier() {
        let analysis = analyze(Tier::InnerCircle, &spaced("f", 6, 1));
        assert_eq!(analysis.category(), FitCategory::Mismatch);
        assert_eq!(analysis.fit.suggested_tier(), None);
    }

    #[test]
    fn test_lapsed_community_friend_is_mismatch_without_better_tier() {
        // 300 / 60 = 5.0, far outside the good band, and Community is already nearest
        let analysis = analyze(Tier::Community, &spaced("f", 6, 300));
        assert!(analysis.is_mismatch());
        assert!((analysis.fit.actual_interval_days().unwrap() - 300.0).abs() < 1e-9);
        assert_eq!(analysis.fit.suggested_tier(), None);

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["fitCategory"], "mismatch");
        assert!(json.get("suggestedTier").is_none());
    }

    #[test]
    fn test_lapsed_inner_circle_suggests_looser_tier() {
        let analysis = analyze(Tier::InnerCircle, &spaced("f", 4, 45));
        assert_eq!(analysis.fit.suggested_tier(), Some(Tier::Community));
    }

    #[test]
    fn test_only_completed_weaves_count() {
        let mut weaves = spaced("f", 3, 7);
        weaves[2].status = InteractionStatus::Planned;
        let analysis = analyze(Tier::InnerCircle, &weaves);
        assert_eq!(analysis.interaction_count, 2);
    }

    #[test]
    fn test_nearest_tier_breaks_ties_toward_closer_tier() {
        let analyzer = TierFitAnalyzer::new();
        assert_eq!(analyzer.nearest_tier(14.0), Tier::InnerCircle);
        assert_eq!(analyzer.nearest_tier(40.5), Tier::CloseFriends);
        assert_eq!(analyzer.nearest_tier(400.0), Tier::Community);
    }

    #[test]
    fn test_unknown_friend_is_not_found() {
        let repo = InMemoryRepository::from_snapshot(Snapshot::default()).unwrap();
        let err = analyze_tier_fit(&repo, "missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_analyze_by_id_reads_repository() {
        let repo = InMemoryRepository::from_snapshot(Snapshot {
            friends: vec![Friend::new("f", "Friend", Tier::CloseFriends, start())],
            interactions: spaced("f", 5, 21),
            ..Default::default()
        })
        .unwrap();
        let analysis = analyze_tier_fit(&repo, "f").unwrap();
        assert_eq!(analysis.category(), FitCategory::Great);
        assert_eq!(analysis.interaction_count, 5);
    }

    #[test]
    fn test_serializes_with_fit_category_tag() {
        let analysis = analyze(Tier::Community, &spaced("f", 6, 10));
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["fitCategory"], "mismatch");
        assert_eq!(json["suggestedTier"], "InnerCircle");
        assert_eq!(json["currentTier"], "Community");

        let insufficient = analyze(Tier::Community, &[]);
        let json = serde_json::to_value(&insufficient).unwrap();
        assert_eq!(json["fitCategory"], "insufficient_data");
        assert!(json.get("suggestedTier").is_none());
    }
}
