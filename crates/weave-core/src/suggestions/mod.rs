//! Suggestion generation.
//!
//! Two layers feed one list:
//!
//! - **Triggered** suggestions react to something about a specific friend
//!   (a birthday, a drifting score, an unresolved intention).
//! - **Guaranteed** suggestions are proactive fallbacks so the list is never
//!   empty, even when everyone is healthy.
//!
//! [`SuggestionEngine`] runs both, dedups against the session's existing
//! suggestions and applies season gating and caps. Which categories are
//! singletons, guaranteed, or season-gated is declared once in
//! [`CATEGORY_TABLE`].

mod aggregator;
mod guaranteed;
mod templates;
mod triggered;

pub use aggregator::{dedup, GenerationContext, SuggestionEngine};
pub use guaranteed::{generate_guaranteed_suggestions, GuaranteedGenerator};
pub use templates::{Template, TemplateRegistry, TimeOfDay};
pub use triggered::{generate_triggered_suggestions, TriggeredGenerator};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::friend::{Friend, FriendId, Tier};
use crate::season::Season;
use crate::weave::InteractionCategory;

/// How soon a suggestion should be acted on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionCategory {
    // Guaranteed
    DailyReflect,
    GentleNudge,
    Wildcard,
    CommunityCheckin,
    SetIntention,
    Variety,
    ReachOut,
    // Triggered
    Birthday,
    Anniversary,
    LifeEvent,
    IntentionReminder,
    CriticalDrift,
    HighDrift,
    Maintain,
    Reflect,
    Momentum,
    TierReview,
}

/// Declarative per-category rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTraits {
    /// At most one suggestion of this category per cycle
    pub singleton: bool,
    /// Produced by the guaranteed layer
    pub guaranteed: bool,
    /// Dropped while resting unless urgency is high or above
    pub season_gated: bool,
}

const fn traits(singleton: bool, guaranteed: bool, season_gated: bool) -> CategoryTraits {
    CategoryTraits {
        singleton,
        guaranteed,
        season_gated,
    }
}

pub const CATEGORY_TABLE: [(SuggestionCategory, CategoryTraits); 17] = [
    (SuggestionCategory::DailyReflect, traits(true, true, false)),
    (SuggestionCategory::GentleNudge, traits(true, true, false)),
    (SuggestionCategory::Wildcard, traits(true, true, false)),
    (SuggestionCategory::CommunityCheckin, traits(true, true, true)),
    (SuggestionCategory::SetIntention, traits(true, true, true)),
    (SuggestionCategory::Variety, traits(true, true, true)),
    (SuggestionCategory::ReachOut, traits(true, true, false)),
    (SuggestionCategory::Birthday, traits(false, false, false)),
    (SuggestionCategory::Anniversary, traits(false, false, false)),
    (SuggestionCategory::LifeEvent, traits(false, false, false)),
    (SuggestionCategory::IntentionReminder, traits(false, false, true)),
    (SuggestionCategory::CriticalDrift, traits(false, false, false)),
    (SuggestionCategory::HighDrift, traits(false, false, false)),
    (SuggestionCategory::Maintain, traits(false, false, true)),
    (SuggestionCategory::Reflect, traits(false, false, false)),
    (SuggestionCategory::Momentum, traits(false, false, true)),
    (SuggestionCategory::TierReview, traits(false, false, true)),
];

impl SuggestionCategory {
    pub fn traits(&self) -> CategoryTraits {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, traits)| *traits)
            .unwrap_or(traits(false, false, false))
    }

    pub fn is_singleton(&self) -> bool {
        self.traits().singleton
    }

    pub fn is_guaranteed(&self) -> bool {
        self.traits().guaranteed
    }

    /// Whether a suggestion of this category survives `season` at `urgency`.
    pub fn allowed_in(&self, season: Season, urgency: Urgency) -> bool {
        !(season.is_resting() && self.traits().season_gated && urgency < Urgency::High)
    }

    /// Stable key, used in suggestion ids.
    pub fn key(&self) -> &'static str {
        match self {
            SuggestionCategory::DailyReflect => "daily-reflect",
            SuggestionCategory::GentleNudge => "gentle-nudge",
            SuggestionCategory::Wildcard => "wildcard",
            SuggestionCategory::CommunityCheckin => "community-checkin",
            SuggestionCategory::SetIntention => "set-intention",
            SuggestionCategory::Variety => "variety",
            SuggestionCategory::ReachOut => "reach-out",
            SuggestionCategory::Birthday => "birthday",
            SuggestionCategory::Anniversary => "anniversary",
            SuggestionCategory::LifeEvent => "life-event",
            SuggestionCategory::IntentionReminder => "intention-reminder",
            SuggestionCategory::CriticalDrift => "critical-drift",
            SuggestionCategory::HighDrift => "high-drift",
            SuggestionCategory::Maintain => "maintain",
            SuggestionCategory::Reflect => "reflect",
            SuggestionCategory::Momentum => "momentum",
            SuggestionCategory::TierReview => "tier-review",
        }
    }
}

impl fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Who a suggestion is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SuggestionTarget {
    General,
    Friend {
        friend_id: FriendId,
        friend_name: String,
    },
}

impl SuggestionTarget {
    pub fn friend(friend: &Friend) -> Self {
        SuggestionTarget::Friend {
            friend_id: friend.id.clone(),
            friend_name: friend.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReachChannel {
    Phone,
    Email,
}

/// What the UI should open when the suggestion is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SuggestionAction {
    /// Log a weave that already happened
    Log {
        category: Option<InteractionCategory>,
    },
    /// Plan a weave
    Plan {
        category: Option<InteractionCategory>,
    },
    /// Add a reflection to a logged weave
    Reflect { interaction_id: String },
    /// Answer a journal prompt
    Reflection { prompt_id: String },
    ReachOut { channel: ReachChannel },
    SetIntention,
    ReviewTier { suggested_tier: Tier },
    OpenProfile,
}

impl SuggestionAction {
    /// Reach out directly when the friend has a channel, otherwise plan.
    pub fn reach_out_or_plan(friend: &Friend, category: Option<InteractionCategory>) -> Self {
        if friend.phone.as_deref().is_some_and(|p| !p.trim().is_empty()) {
            SuggestionAction::ReachOut {
                channel: ReachChannel::Phone,
            }
        } else if friend.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
            SuggestionAction::ReachOut {
                channel: ReachChannel::Email,
            }
        } else {
            SuggestionAction::Plan { category }
        }
    }
}

/// A single actionable recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Same category + subject + day always gives the same id
    pub id: String,
    pub target: SuggestionTarget,
    pub category: SuggestionCategory,
    pub urgency: Urgency,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub action_label: String,
    pub action: SuggestionAction,
    pub dismissible: bool,
    pub created_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn friend_id(&self) -> Option<&str> {
        match &self.target {
            SuggestionTarget::Friend { friend_id, .. } if !friend_id.is_empty() => {
                Some(friend_id.as_str())
            }
            _ => None,
        }
    }

    pub fn is_general(&self) -> bool {
        self.friend_id().is_none()
    }
}

/// `<category>-<subject>-<YYYY-MM-DD>`; subject is a friend id or a day index.
pub fn suggestion_id(category: SuggestionCategory, subject: impl fmt::Display, date: NaiveDate) -> String {
    format!("{}-{}-{}", category.key(), subject, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_is_in_the_table_once() {
        for (category, _) in CATEGORY_TABLE {
            let count = CATEGORY_TABLE.iter().filter(|(c, _)| *c == category).count();
            assert_eq!(count, 1, "{category} listed {count} times");
        }
    }

    #[test]
    fn test_guaranteed_categories_are_singletons() {
        for (category, traits) in CATEGORY_TABLE {
            if traits.guaranteed {
                assert!(traits.singleton, "{category} should be a singleton");
            }
        }
        assert!(SuggestionCategory::Variety.is_guaranteed());
        assert!(!SuggestionCategory::Birthday.is_guaranteed());
    }

    #[test]
    fn test_resting_gates_low_urgency_proactive_categories() {
        let gated = SuggestionCategory::CommunityCheckin;
        assert!(!gated.allowed_in(Season::Resting, Urgency::Low));
        assert!(gated.allowed_in(Season::Resting, Urgency::High));
        assert!(gated.allowed_in(Season::Normal, Urgency::Low));
        assert!(SuggestionCategory::ReachOut.allowed_in(Season::Resting, Urgency::Low));
        assert!(SuggestionCategory::Wildcard.allowed_in(Season::Resting, Urgency::Low));
    }

    #[test]
    fn test_id_is_deterministic_per_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            suggestion_id(SuggestionCategory::GentleNudge, "ana", date),
            "gentle-nudge-ana-2025-03-09"
        );
        assert_eq!(
            suggestion_id(SuggestionCategory::DailyReflect, 6, date),
            "daily-reflect-6-2025-03-09"
        );
    }

    #[test]
    fn test_urgency_orders_low_to_critical() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::High < Urgency::Critical);
    }

    #[test]
    fn test_action_serializes_with_type_tag() {
        let action = SuggestionAction::ReviewTier {
            suggested_tier: Tier::CloseFriends,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "review-tier");
        assert_eq!(json["suggestedTier"], "CloseFriends");
    }
}
