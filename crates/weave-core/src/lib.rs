//! # Weave Core Library
//!
//! Relationship health and suggestion engine for Weave. Everything here is
//! pure and synchronous: callers pass in friend and weave snapshots plus a
//! clock, and get scores, tier-fit reads and suggestions back. The `weave`
//! CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Scoring**: decayed per-friend health (0-100) with a short-lived
//!   momentum bonus, and a tier-weighted network average
//! - **Tier fit**: compares a friend's actual weave rhythm with what their
//!   tier expects
//! - **Network health**: one 0-10 score plus a per-tier fit breakdown
//! - **Suggestions**: event-driven triggers plus a guaranteed fallback layer,
//!   deduped and gated by the user's social season
//! - **Storage**: TOML engine configuration and a JSON snapshot repository
//!
//! ## Key Components
//!
//! - [`ScoreCalculator`]: Health score and momentum
//! - [`TierFitAnalyzer`]: Tier fit classification
//! - [`NetworkHealthAggregator`]: Network-wide health
//! - [`SuggestionEngine`]: Suggestion generation cycle
//! - [`EngineConfig`]: Engine configuration management

pub mod error;
pub mod friend;
pub mod network;
pub mod scoring;
pub mod season;
pub mod storage;
pub mod suggestions;
pub mod tier_fit;
pub mod weave;

pub use error::{ConfigError, CoreError, ValidationError};
pub use friend::{Friend, FriendId, PartialDate, Tier};
pub use network::{compute_network_health, HealthStatus, NetworkHealth, NetworkHealthAggregator, TierHealth};
pub use scoring::{calculate_current_score, calculate_weighted_network_health, ScoreBreakdown, ScoreCalculator};
pub use season::Season;
pub use storage::{EngineConfig, InMemoryRepository, Snapshot, WeaveRepository};
pub use suggestions::{
    generate_guaranteed_suggestions, generate_triggered_suggestions, GenerationContext, Suggestion,
    SuggestionAction, SuggestionCategory, SuggestionEngine, SuggestionTarget, TemplateRegistry, Urgency,
};
pub use tier_fit::{analyze_tier_fit, FitCategory, TierFit, TierFitAnalysis, TierFitAnalyzer};
pub use weave::{Intention, Interaction, InteractionCategory, InteractionStatus, LifeEvent};
