//! Interaction ("weave") records and the other per-friend signals the
//! suggestion engine reads: life events and intentions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::friend::FriendId;

/// Lifecycle of a weave.
///
/// ```text
///   PLANNED ──> COMPLETED
///      │
///      └──────> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Planned,
    Completed,
    Cancelled,
}

impl InteractionStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &InteractionStatus) -> bool {
        matches!(
            (self, to),
            (
                InteractionStatus::Planned,
                InteractionStatus::Completed | InteractionStatus::Cancelled
            )
        )
    }
}

impl Default for InteractionStatus {
    fn default() -> Self {
        InteractionStatus::Completed
    }
}

/// What kind of time was spent together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionCategory {
    Text,
    VoiceNote,
    Call,
    VideoCall,
    MealDrink,
    Hangout,
    DeepTalk,
    EventParty,
    ActivityHobby,
    FavorSupport,
    Celebration,
}

impl InteractionCategory {
    pub const ALL: [InteractionCategory; 11] = [
        InteractionCategory::Text,
        InteractionCategory::VoiceNote,
        InteractionCategory::Call,
        InteractionCategory::VideoCall,
        InteractionCategory::MealDrink,
        InteractionCategory::Hangout,
        InteractionCategory::DeepTalk,
        InteractionCategory::EventParty,
        InteractionCategory::ActivityHobby,
        InteractionCategory::FavorSupport,
        InteractionCategory::Celebration,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InteractionCategory::Text => "Text",
            InteractionCategory::VoiceNote => "Voice note",
            InteractionCategory::Call => "Call",
            InteractionCategory::VideoCall => "Video call",
            InteractionCategory::MealDrink => "Meal or drink",
            InteractionCategory::Hangout => "Hangout",
            InteractionCategory::DeepTalk => "Deep talk",
            InteractionCategory::EventParty => "Event or party",
            InteractionCategory::ActivityHobby => "Activity",
            InteractionCategory::FavorSupport => "Favor or support",
            InteractionCategory::Celebration => "Celebration",
        }
    }

    /// Lightweight, remote categories that can be done from a phone.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            InteractionCategory::Text
                | InteractionCategory::VoiceNote
                | InteractionCategory::Call
                | InteractionCategory::VideoCall
        )
    }
}

impl fmt::Display for InteractionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rough length of a weave.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeaveDuration {
    Quick,
    Standard,
    Extended,
}

/// How the weave felt, from draining to deeply connecting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Draining,
    Neutral,
    Warm,
    Connected,
}

/// A single logged or planned weave. One weave may involve several friends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub friend_ids: Vec<FriendId>,
    pub occurred_at: DateTime<Utc>,
    pub category: InteractionCategory,
    #[serde(default)]
    pub status: InteractionStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub reflection: Option<String>,
    #[serde(default)]
    pub duration: Option<WeaveDuration>,
    #[serde(default)]
    pub vibe: Option<Vibe>,
}

impl Interaction {
    /// A completed weave with a single friend.
    pub fn completed(
        id: impl Into<String>,
        friend_id: impl Into<FriendId>,
        occurred_at: DateTime<Utc>,
        category: InteractionCategory,
    ) -> Self {
        Self {
            id: id.into(),
            friend_ids: vec![friend_id.into()],
            occurred_at,
            category,
            status: InteractionStatus::Completed,
            note: None,
            reflection: None,
            duration: None,
            vibe: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == InteractionStatus::Completed
    }

    pub fn involves(&self, friend_id: &str) -> bool {
        self.friend_ids.iter().any(|id| id == friend_id)
    }

    pub fn has_reflection(&self) -> bool {
        self.reflection
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// Completed weaves involving `friend_id`, oldest first.
pub fn completed_for<'a>(interactions: &'a [Interaction], friend_id: &str) -> Vec<&'a Interaction> {
    let mut completed: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.is_completed() && i.involves(friend_id))
        .collect();
    completed.sort_by_key(|i| i.occurred_at);
    completed
}

/// Kind of life event worth acknowledging.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LifeEventKind {
    NewJob,
    Moving,
    Wedding,
    Baby,
    Loss,
    Health,
    Graduation,
    Other,
}

impl LifeEventKind {
    pub fn label(&self) -> &'static str {
        match self {
            LifeEventKind::NewJob => "new job",
            LifeEventKind::Moving => "move",
            LifeEventKind::Wedding => "wedding",
            LifeEventKind::Baby => "new baby",
            LifeEventKind::Loss => "loss",
            LifeEventKind::Health => "health news",
            LifeEventKind::Graduation => "graduation",
            LifeEventKind::Other => "life event",
        }
    }

    /// Events where showing up matters more than celebrating.
    pub fn is_support(&self) -> bool {
        matches!(self, LifeEventKind::Loss | LifeEventKind::Health)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Medium
    }
}

/// Something happening in a friend's life around a given date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    pub id: String,
    pub friend_id: FriendId,
    pub kind: LifeEventKind,
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub importance: Importance,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntentionStatus {
    Active,
    Converted,
    Dismissed,
}

impl Default for IntentionStatus {
    fn default() -> Self {
        IntentionStatus::Active
    }
}

/// A note-to-self to connect with someone ("grab coffee with Sam").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intention {
    pub id: String,
    pub friend_ids: Vec<FriendId>,
    pub description: String,
    #[serde(default)]
    pub category: Option<InteractionCategory>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: IntentionStatus,
}

impl Intention {
    pub fn is_active(&self) -> bool {
        self.status == IntentionStatus::Active
    }
}
