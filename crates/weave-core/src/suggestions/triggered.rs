//! Event-driven suggestions.
//!
//! Each rule looks at one friend and may propose a draft. Rules are listed in
//! priority order; a friend keeps the most urgent draft, and on a tie the
//! earlier rule wins.

use chrono::{DateTime, NaiveDate, Utc};

use super::aggregator::GenerationContext;
use super::{suggestion_id, Suggestion, SuggestionAction, SuggestionCategory, SuggestionTarget, Urgency};
use crate::friend::{Friend, Tier};
use crate::scoring::ScoreCalculator;
use crate::storage::{ScoringConfig, TriggerConfig};
use crate::weave::{Importance, InteractionCategory};

/// A suggestion before it is bound to a friend and a date.
struct Draft {
    category: SuggestionCategory,
    urgency: Urgency,
    title: String,
    subtitle: String,
    icon: &'static str,
    action_label: &'static str,
    action: SuggestionAction,
}

impl Draft {
    fn finish(self, friend: &Friend, today: NaiveDate, created_at: DateTime<Utc>) -> Suggestion {
        Suggestion {
            id: suggestion_id(self.category, &friend.id, today),
            target: SuggestionTarget::friend(friend),
            category: self.category,
            urgency: self.urgency,
            title: self.title,
            subtitle: self.subtitle,
            icon: self.icon.to_string(),
            action_label: self.action_label.to_string(),
            action: self.action,
            dismissible: true,
            created_at,
        }
    }
}

fn plural_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

/// Triggered suggestion generator.
#[derive(Debug, Clone, Default)]
pub struct TriggeredGenerator {
    config: TriggerConfig,
    scorer: ScoreCalculator,
}

impl TriggeredGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TriggerConfig, scoring: ScoringConfig) -> Self {
        Self {
            config,
            scorer: ScoreCalculator::with_config(scoring),
        }
    }

    /// At most one suggestion per non-dormant friend, most urgent first.
    pub fn generate(&self, friends: &[Friend], ctx: &GenerationContext<'_>) -> Vec<Suggestion> {
        let today = ctx.today();
        let now = ctx.now_utc();

        let mut suggestions: Vec<Suggestion> = friends
            .iter()
            .filter(|f| !f.is_dormant)
            .filter_map(|friend| {
                self.best_draft(friend, ctx)
                    .map(|draft| draft.finish(friend, today, now))
            })
            .collect();

        // Stable, so equal urgencies keep friend order
        suggestions.sort_by(|a, b| b.urgency.cmp(&a.urgency));

        tracing::debug!(count = suggestions.len(), "generated triggered suggestions");
        suggestions
    }

    fn best_draft(&self, friend: &Friend, ctx: &GenerationContext<'_>) -> Option<Draft> {
        let today = ctx.today();
        let now = ctx.now_utc();
        let score = self.scorer.current_score(friend, now);

        let candidates = [
            self.birthday(friend, today),
            self.anniversary(friend, today),
            self.life_event(friend, ctx),
            self.intention_reminder(friend, ctx),
            self.drift(friend, score),
            self.reflect(friend, ctx),
            self.momentum(friend, score, now),
            self.tier_review(friend, ctx),
        ];

        candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<Draft>, draft| match best {
                Some(b) if b.urgency >= draft.urgency => Some(b),
                _ => Some(draft),
            })
    }

    fn birthday(&self, friend: &Friend, today: NaiveDate) -> Option<Draft> {
        let birthday = friend.birthday?;
        let days = birthday.days_until(today)?;
        if days > self.config.lookahead_days {
            return None;
        }

        let name = friend.first_name();
        let (urgency, title) = match days {
            0 => (Urgency::Critical, format!("It's {name}'s birthday today")),
            1 => (Urgency::High, format!("{name}'s birthday is tomorrow")),
            2..=3 => (Urgency::High, format!("{name}'s birthday is in {days} days")),
            _ => (Urgency::Medium, format!("{name}'s birthday is in {days} days")),
        };
        let subtitle = match birthday.years_at_next(today) {
            Some(age) => format!("They're turning {age}"),
            None => "Make sure they feel remembered".to_string(),
        };

        Some(Draft {
            category: SuggestionCategory::Birthday,
            urgency,
            title,
            subtitle,
            icon: "cake",
            action_label: "Celebrate",
            action: SuggestionAction::reach_out_or_plan(friend, Some(InteractionCategory::Celebration)),
        })
    }

    fn anniversary(&self, friend: &Friend, today: NaiveDate) -> Option<Draft> {
        let anniversary = friend.anniversary?;
        let days = anniversary.days_until(today)?;
        if days > self.config.lookahead_days {
            return None;
        }

        let name = friend.first_name();
        let (urgency, title) = if days == 0 {
            (Urgency::High, format!("It's {name}'s anniversary today"))
        } else {
            (
                Urgency::Medium,
                format!("{name}'s anniversary is in {}", plural_days(days)),
            )
        };
        let subtitle = match anniversary.years_at_next(today) {
            Some(years) if years > 0 => format!("Marking {years} years"),
            _ => "A good excuse to say something kind".to_string(),
        };

        Some(Draft {
            category: SuggestionCategory::Anniversary,
            urgency,
            title,
            subtitle,
            icon: "heart",
            action_label: "Reach out",
            action: SuggestionAction::reach_out_or_plan(friend, Some(InteractionCategory::Celebration)),
        })
    }

    /// The most important event within the lookahead, past or upcoming.
    fn life_event(&self, friend: &Friend, ctx: &GenerationContext<'_>) -> Option<Draft> {
        let today = ctx.today();
        let window = self.config.lookahead_days;

        let (event, delta) = ctx
            .life_events
            .iter()
            .filter(|e| e.friend_id == friend.id)
            .map(|e| (e, (e.event_date - today).num_days()))
            .filter(|(_, delta)| delta.abs() <= window)
            .min_by(|(a, da), (b, db)| {
                b.importance
                    .cmp(&a.importance)
                    .then(da.abs().cmp(&db.abs()))
            })?;

        let mut urgency = match event.importance {
            Importance::Low => Urgency::Low,
            Importance::Medium => Urgency::Medium,
            Importance::High => Urgency::High,
            Importance::Critical => Urgency::Critical,
        };
        if event.kind.is_support() {
            urgency = urgency.max(Urgency::High);
        }

        let name = friend.first_name();
        let title = match delta {
            0 => format!("{name}'s {} is today", event.title),
            d if d > 0 => format!("{name}'s {} is in {}", event.title, plural_days(d)),
            _ => format!("Check in on {name} after their {}", event.kind.label()),
        };
        let (subtitle, category) = if event.kind.is_support() {
            (
                "Showing up matters more than the right words",
                InteractionCategory::FavorSupport,
            )
        } else {
            ("Let them know you remembered", InteractionCategory::Celebration)
        };

        Some(Draft {
            category: SuggestionCategory::LifeEvent,
            urgency,
            title,
            subtitle: subtitle.to_string(),
            icon: "calendar-heart",
            action_label: "Reach out",
            action: SuggestionAction::reach_out_or_plan(friend, Some(category)),
        })
    }

    fn intention_reminder(&self, friend: &Friend, ctx: &GenerationContext<'_>) -> Option<Draft> {
        let now = ctx.now_utc();
        let intention = ctx
            .intentions
            .iter()
            .filter(|i| i.is_active() && i.friend_ids.iter().any(|id| *id == friend.id))
            .filter(|i| (now - i.created_at).num_days() >= self.config.intention_reminder_days)
            .min_by_key(|i| i.created_at)?;

        let age = (now - intention.created_at).num_days();
        Some(Draft {
            category: SuggestionCategory::IntentionReminder,
            urgency: Urgency::Medium,
            title: format!("You wanted to: {}", intention.description),
            subtitle: format!("Set {} ago for {}", plural_days(age), friend.first_name()),
            icon: "target",
            action_label: "Plan it",
            action: SuggestionAction::Plan {
                category: intention.category,
            },
        })
    }

    fn drift(&self, friend: &Friend, score: f64) -> Option<Draft> {
        let name = friend.first_name();
        let (category, urgency, title, icon) = match friend.tier {
            Tier::InnerCircle if score < self.config.critical_drift_score => (
                SuggestionCategory::CriticalDrift,
                Urgency::Critical,
                format!("{name} is drifting away"),
                "alert",
            ),
            Tier::CloseFriends if score < self.config.high_drift_score => (
                SuggestionCategory::HighDrift,
                Urgency::High,
                format!("Reconnect with {name}"),
                "link",
            ),
            Tier::Community if score < self.config.maintain_score => (
                SuggestionCategory::Maintain,
                Urgency::Low,
                format!("Keep in touch with {name}"),
                "wave",
            ),
            _ => return None,
        };

        let subtitle = match friend.last_interaction_at {
            Some(_) => format!("{} connection score is {score:.0}", friend.tier.label()),
            None => "You haven't logged a weave together yet".to_string(),
        };

        Some(Draft {
            category,
            urgency,
            title,
            subtitle,
            icon,
            action_label: "Reach out",
            action: SuggestionAction::reach_out_or_plan(friend, None),
        })
    }

    /// Recent unreflected weave. Group weaves are claimed by their first friend.
    fn reflect(&self, friend: &Friend, ctx: &GenerationContext<'_>) -> Option<Draft> {
        let now = ctx.now_utc();
        let weave = ctx
            .interactions
            .iter()
            .filter(|w| w.is_completed() && !w.has_reflection())
            .filter(|w| w.friend_ids.first() == Some(&friend.id))
            .filter(|w| {
                let age = (now - w.occurred_at).num_hours();
                (0..=self.config.reflect_window_hours).contains(&age)
            })
            .max_by_key(|w| w.occurred_at)?;

        Some(Draft {
            category: SuggestionCategory::Reflect,
            urgency: Urgency::Low,
            title: format!(
                "How was your {} with {}?",
                weave.category.label().to_lowercase(),
                friend.first_name()
            ),
            subtitle: "A few words now help you remember later".to_string(),
            icon: "pen",
            action_label: "Reflect",
            action: SuggestionAction::Reflect {
                interaction_id: weave.id.clone(),
            },
        })
    }

    fn momentum(&self, friend: &Friend, score: f64, now: DateTime<Utc>) -> Option<Draft> {
        if score < self.config.momentum_celebrate_score || !self.scorer.has_active_momentum(friend, now) {
            return None;
        }
        Some(Draft {
            category: SuggestionCategory::Momentum,
            urgency: Urgency::Low,
            title: format!("You're on a roll with {}", friend.first_name()),
            subtitle: "Keep the momentum going".to_string(),
            icon: "flame",
            action_label: "Plan next",
            action: SuggestionAction::Plan { category: None },
        })
    }

    fn tier_review(&self, friend: &Friend, ctx: &GenerationContext<'_>) -> Option<Draft> {
        let analysis = ctx
            .tier_analyses
            .iter()
            .find(|a| a.friend_id == friend.id && a.is_mismatch() && !a.is_preliminary)?;
        let suggested_tier = analysis.fit.suggested_tier()?;
        let subtitle = match analysis.fit.actual_interval_days() {
            Some(days) => format!("You connect about every {days:.0} days"),
            None => "Your rhythm doesn't match this tier".to_string(),
        };

        Some(Draft {
            category: SuggestionCategory::TierReview,
            urgency: Urgency::Low,
            title: format!("Move {} to {}?", friend.first_name(), suggested_tier.label()),
            subtitle,
            icon: "layers",
            action_label: "Review",
            action: SuggestionAction::ReviewTier { suggested_tier },
        })
    }
}

/// Triggered suggestions with the default thresholds.
pub fn generate_triggered_suggestions(friends: &[Friend], ctx: &GenerationContext<'_>) -> Vec<Suggestion> {
    TriggeredGenerator::new().generate(friends, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friend::PartialDate;
    use crate::tier_fit::TierFitAnalyzer;
    use crate::weave::{Intention, IntentionStatus, Interaction, LifeEvent, LifeEventKind};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn ctx<'a>() -> GenerationContext<'a> {
        GenerationContext::at_utc(now())
    }

    /// Recently seen, so no drift rule fires.
    fn healthy(id: &str, tier: Tier) -> Friend {
        let mut friend = Friend::new(id, id.to_uppercase(), tier, now() - Duration::days(200));
        friend.last_interaction_at = Some(now() - Duration::days(1));
        friend
    }

    #[test]
    fn test_birthday_urgency_by_distance() {
        let gen = TriggeredGenerator::new();
        let cases = [
            (PartialDate::new(6, 10), Some(Urgency::Critical)),
            (PartialDate::new(6, 13), Some(Urgency::High)),
            (PartialDate::new(6, 17), Some(Urgency::Medium)),
            (PartialDate::new(6, 18), None),
        ];
        for (birthday, expected) in cases {
            let mut friend = healthy("ana", Tier::CloseFriends);
            friend.birthday = Some(birthday);
            let out = gen.generate(&[friend], &ctx());
            assert_eq!(out.first().map(|s| s.urgency), expected, "{birthday:?}");
        }
    }

    #[test]
    fn test_one_suggestion_per_friend_keeps_most_urgent() {
        let mut friend = Friend::new("bo", "Bo", Tier::InnerCircle, now() - Duration::days(300));
        friend.last_interaction_at = Some(now() - Duration::days(60));
        friend.anniversary = Some(PartialDate::new(6, 12));

        let out = generate_triggered_suggestions(&[friend], &ctx());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, SuggestionCategory::CriticalDrift);
        assert_eq!(out[0].id, "critical-drift-bo-2025-06-10");
    }

    #[test]
    fn test_equal_urgency_prefers_earlier_rule() {
        let mut friend = Friend::new("cy", "Cy", Tier::InnerCircle, now() - Duration::days(300));
        friend.last_interaction_at = Some(now() - Duration::days(60));
        friend.birthday = Some(PartialDate::new(6, 10));

        let out = generate_triggered_suggestions(&[friend], &ctx());
        assert_eq!(out[0].category, SuggestionCategory::Birthday);
        assert_eq!(out[0].urgency, Urgency::Critical);
    }

    #[test]
    fn test_drift_thresholds_per_tier() {
        let lapsed = |id: &str, tier| {
            let mut f = Friend::new(id, id, tier, now() - Duration::days(400));
            f.last_interaction_at = Some(now() - Duration::days(300));
            f
        };
        let out = generate_triggered_suggestions(
            &[
                lapsed("c", Tier::Community),
                lapsed("b", Tier::CloseFriends),
                lapsed("a", Tier::InnerCircle),
            ],
            &ctx(),
        );
        let categories: Vec<_> = out.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                SuggestionCategory::CriticalDrift,
                SuggestionCategory::HighDrift,
                SuggestionCategory::Maintain
            ]
        );
    }

    #[test]
    fn test_dormant_friends_are_skipped() {
        let mut friend = Friend::new("d", "D", Tier::InnerCircle, now() - Duration::days(400));
        friend.is_dormant = true;
        friend.birthday = Some(PartialDate::new(6, 10));
        assert!(generate_triggered_suggestions(&[friend], &ctx()).is_empty());
    }

    #[test]
    fn test_support_life_event_is_at_least_high() {
        let friend = healthy("ed", Tier::Community);
        let events = vec![LifeEvent {
            id: "e1".into(),
            friend_id: "ed".into(),
            kind: LifeEventKind::Loss,
            title: "loss".into(),
            event_date: now().date_naive() - Duration::days(2),
            importance: Importance::Low,
        }];
        let context = ctx().with_life_events(&events);
        let out = generate_triggered_suggestions(&[friend], &context);
        assert_eq!(out[0].category, SuggestionCategory::LifeEvent);
        assert_eq!(out[0].urgency, Urgency::High);
        assert!(out[0].title.starts_with("Check in on ED"));
    }

    #[test]
    fn test_stale_intention_gets_reminder() {
        let friend = healthy("fay", Tier::CloseFriends);
        let intentions = vec![
            Intention {
                id: "i1".into(),
                friend_ids: vec!["fay".into()],
                description: "go climbing".into(),
                category: Some(InteractionCategory::ActivityHobby),
                created_at: now() - Duration::days(10),
                status: IntentionStatus::Active,
            },
            Intention {
                id: "i2".into(),
                friend_ids: vec!["fay".into()],
                description: "fresh idea".into(),
                category: None,
                created_at: now() - Duration::days(1),
                status: IntentionStatus::Active,
            },
        ];
        let context = ctx().with_intentions(&intentions);
        let out = generate_triggered_suggestions(&[friend], &context);
        assert_eq!(out[0].category, SuggestionCategory::IntentionReminder);
        assert_eq!(out[0].title, "You wanted to: go climbing");
    }

    #[test]
    fn test_recent_unreflected_weave_prompts_reflection() {
        let friend = healthy("gus", Tier::Community);
        let mut reflected = Interaction::completed("w1", "gus", now() - Duration::hours(3), InteractionCategory::Call);
        reflected.reflection = Some("great".into());
        let weaves = vec![
            Interaction::completed("w0", "gus", now() - Duration::hours(30), InteractionCategory::MealDrink),
            reflected,
        ];
        let context = ctx().with_interactions(&weaves);
        let out = generate_triggered_suggestions(&[friend], &context);
        assert_eq!(
            out[0].action,
            SuggestionAction::Reflect {
                interaction_id: "w0".into()
            }
        );
    }

    #[test]
    fn test_momentum_celebrates_strong_active_friendships() {
        let mut friend = healthy("hal", Tier::CloseFriends);
        friend.last_interaction_at = Some(now());
        friend.momentum_score = 15.0;
        friend.momentum_last_updated = Some(now() - Duration::hours(2));
        let out = generate_triggered_suggestions(&[friend], &ctx());
        assert_eq!(out[0].category, SuggestionCategory::Momentum);
    }

    #[test]
    fn test_tier_review_needs_confident_mismatch() {
        let friend = healthy("ivy", Tier::Community);
        let weaves: Vec<Interaction> = (0..6)
            .map(|i| {
                Interaction::completed(
                    format!("w{i}"),
                    "ivy",
                    now() - Duration::days(1 + 10 * i),
                    InteractionCategory::Hangout,
                )
            })
            .collect();
        let refs: Vec<&Interaction> = weaves.iter().collect();
        let analysis = TierFitAnalyzer::new().analyze_history(&friend, &refs);
        assert!(analysis.is_mismatch());

        let analyses = vec![analysis.clone()];
        let context = ctx().with_tier_analyses(&analyses);
        let out = generate_triggered_suggestions(std::slice::from_ref(&friend), &context);
        assert_eq!(out[0].category, SuggestionCategory::TierReview);

        let mut preliminary = analysis;
        preliminary.is_preliminary = true;
        let analyses = vec![preliminary];
        let context = ctx().with_tier_analyses(&analyses);
        assert!(generate_triggered_suggestions(&[friend], &context).is_empty());
    }

    #[test]
    fn test_tier_review_skips_mismatch_without_better_tier() {
        let friend = healthy("jo", Tier::Community);
        let weaves: Vec<Interaction> = (0..6)
            .map(|i| {
                Interaction::completed(
                    format!("w{i}"),
                    "jo",
                    now() - Duration::days(1 + 300 * i),
                    InteractionCategory::Hangout,
                )
            })
            .collect();
        let refs: Vec<&Interaction> = weaves.iter().collect();
        let analysis = TierFitAnalyzer::new().analyze_history(&friend, &refs);
        assert!(analysis.is_mismatch());
        assert_eq!(analysis.fit.suggested_tier(), None);

        let analyses = vec![analysis];
        let context = ctx().with_tier_analyses(&analyses);
        assert!(generate_triggered_suggestions(&[friend], &context).is_empty());
    }
}
