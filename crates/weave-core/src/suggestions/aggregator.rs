//! Final suggestion list: triggered first, then guaranteed, deduped, gated
//! by season and capped.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use std::collections::HashSet;

use super::guaranteed::GuaranteedGenerator;
use super::templates::TemplateRegistry;
use super::triggered::TriggeredGenerator;
use super::{Suggestion, SuggestionCategory};
use crate::friend::Friend;
use crate::season::Season;
use crate::storage::{AggregatorConfig, EngineConfig, WeaveRepository};
use crate::tier_fit::{TierFitAnalysis, TierFitAnalyzer};
use crate::weave::{Intention, Interaction, LifeEvent};

/// Everything a generation cycle reads besides the friend list.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Local time of the run; dates and time-of-day come from its offset
    pub now: DateTime<FixedOffset>,
    pub season: Season,
    pub interactions: &'a [Interaction],
    pub life_events: &'a [LifeEvent],
    pub intentions: &'a [Intention],
    pub tier_analyses: &'a [TierFitAnalysis],
    /// Suggestions already shown or dismissed this session
    pub existing: &'a [Suggestion],
}

impl<'a> GenerationContext<'a> {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now,
            season: Season::default(),
            interactions: &[],
            life_events: &[],
            intentions: &[],
            tier_analyses: &[],
            existing: &[],
        }
    }

    pub fn at_utc(now: DateTime<Utc>) -> Self {
        Self::new(now.fixed_offset())
    }

    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }

    pub fn with_interactions(mut self, interactions: &'a [Interaction]) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn with_life_events(mut self, life_events: &'a [LifeEvent]) -> Self {
        self.life_events = life_events;
        self
    }

    pub fn with_intentions(mut self, intentions: &'a [Intention]) -> Self {
        self.intentions = intentions;
        self
    }

    pub fn with_tier_analyses(mut self, tier_analyses: &'a [TierFitAnalysis]) -> Self {
        self.tier_analyses = tier_analyses;
        self
    }

    pub fn with_existing(mut self, existing: &'a [Suggestion]) -> Self {
        self.existing = existing;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.now.with_timezone(&Utc)
    }
}

/// Drop suggestions that repeat an id, a friend, or a singleton category
/// already present in `seen` or earlier in `suggestions`. Order is kept.
pub fn dedup(suggestions: Vec<Suggestion>, seen: &[Suggestion]) -> Vec<Suggestion> {
    let mut ids: HashSet<String> = seen.iter().map(|s| s.id.clone()).collect();
    let mut friends: HashSet<String> = seen
        .iter()
        .filter_map(|s| s.friend_id().map(str::to_string))
        .collect();
    let mut categories: HashSet<SuggestionCategory> = seen
        .iter()
        .map(|s| s.category)
        .filter(SuggestionCategory::is_singleton)
        .collect();

    suggestions
        .into_iter()
        .filter(|s| {
            if ids.contains(&s.id) {
                return false;
            }
            if let Some(friend_id) = s.friend_id() {
                if friends.contains(friend_id) {
                    return false;
                }
            }
            if s.category.is_singleton() && categories.contains(&s.category) {
                return false;
            }

            ids.insert(s.id.clone());
            if let Some(friend_id) = s.friend_id() {
                friends.insert(friend_id.to_string());
            }
            if s.category.is_singleton() {
                categories.insert(s.category);
            }
            true
        })
        .collect()
}

/// Runs both generators and assembles the list the UI shows.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    config: AggregatorConfig,
    triggered: TriggeredGenerator,
    guaranteed: GuaranteedGenerator,
    analyzer: TierFitAnalyzer,
    rng: Mcg128Xsl64,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config. A configured `seed` makes every run reproducible.
    pub fn with_config(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            triggered: TriggeredGenerator::with_config(config.triggers, config.scoring.clone()),
            guaranteed: GuaranteedGenerator::with_config(config.guaranteed, config.scoring),
            analyzer: TierFitAnalyzer::with_config(config.tier_fit),
            config: config.aggregator,
            rng,
        }
    }

    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.guaranteed = self.guaranteed.with_templates(templates);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
    }

    /// One generation cycle.
    ///
    /// Never empty while at least one friend is not dormant.
    pub fn generate(&mut self, friends: &[Friend], ctx: &GenerationContext<'_>) -> Vec<Suggestion> {
        let season = ctx.season;

        let mut triggered = dedup(self.triggered.generate(friends, ctx), ctx.existing);
        triggered.retain(|s| s.category.allowed_in(season, s.urgency));

        let mut exclusion: Vec<Suggestion> = ctx.existing.to_vec();
        exclusion.extend(triggered.iter().cloned());

        let mut guaranteed = dedup(
            self.guaranteed
                .generate(friends, &exclusion, season, ctx.now, &mut self.rng),
            &exclusion,
        );
        guaranteed.retain(|s| s.category.allowed_in(season, s.urgency));
        guaranteed.truncate(self.config.max_guaranteed);

        let triggered_count = triggered.len();
        let guaranteed_count = guaranteed.len();
        let mut suggestions = triggered;
        suggestions.extend(guaranteed);
        if let Some(max_total) = self.config.max_total {
            suggestions.truncate(max_total.max(1));
        }

        if suggestions.is_empty() && friends.iter().any(|f| !f.is_dormant) {
            // Everything was suppressed: surface one fresh guaranteed pick
            tracing::debug!("all suggestions suppressed, ignoring session state");
            suggestions.extend(
                self.guaranteed
                    .generate(friends, &[], season, ctx.now, &mut self.rng)
                    .into_iter()
                    .find(|s| s.category.allowed_in(season, s.urgency)),
            );
        }

        tracing::debug!(
            triggered = triggered_count,
            guaranteed = guaranteed_count,
            total = suggestions.len(),
            %season,
            "generated suggestions"
        );
        suggestions
    }

    /// Generate for a repository, running tier fit on the way.
    pub fn generate_from_repo<R: WeaveRepository + ?Sized>(
        &mut self,
        repo: &R,
        now: DateTime<FixedOffset>,
        season: Season,
        existing: &[Suggestion],
    ) -> Vec<Suggestion> {
        let friends = repo.friends();
        let analyses: Vec<TierFitAnalysis> = friends
            .iter()
            .filter(|f| !f.is_dormant)
            .map(|f| self.analyzer.analyze_history(f, &repo.interactions_for(&f.id)))
            .collect();

        let ctx = GenerationContext::new(now)
            .with_season(season)
            .with_interactions(repo.interactions())
            .with_life_events(repo.life_events())
            .with_intentions(repo.intentions())
            .with_tier_analyses(&analyses)
            .with_existing(existing);
        self.generate(friends, &ctx)
    }
}
