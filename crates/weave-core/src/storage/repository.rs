//! Read-only data access for the engine.
//!
//! The app's real persistence layer lives elsewhere; the engine only needs
//! to look friends up by id and list their weaves. [`InMemoryRepository`]
//! serves a validated [`Snapshot`], which is also what the CLI loads from
//! JSON.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Result, ValidationError};
use crate::friend::{Friend, Tier};
use crate::weave::{Intention, Interaction, LifeEvent};

/// Read access to friend and weave records.
pub trait WeaveRepository {
    fn friend(&self, id: &str) -> Option<&Friend>;

    fn friends(&self) -> &[Friend];

    fn interactions(&self) -> &[Interaction];

    /// Every weave involving `friend_id`, regardless of status.
    fn interactions_for(&self, friend_id: &str) -> Vec<&Interaction>;

    fn life_events(&self) -> &[LifeEvent];

    fn intentions(&self) -> &[Intention];

    /// Non-dormant friends in `tier`.
    fn friends_in_tier(&self, tier: Tier) -> Vec<&Friend> {
        self.friends()
            .iter()
            .filter(|f| f.tier == tier && !f.is_dormant)
            .collect()
    }
}

/// Serialized form of everything the engine reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub friends: Vec<Friend>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub life_events: Vec<LifeEvent>,
    #[serde(default)]
    pub intentions: Vec<Intention>,
}

/// Snapshot-backed repository with id indexes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    snapshot: Snapshot,
    friend_index: HashMap<String, usize>,
    interaction_index: HashMap<String, Vec<usize>>,
}

impl InMemoryRepository {
    /// Validate a snapshot and build the indexes.
    ///
    /// Each friend's cached `last_interaction_at` is brought forward to its
    /// latest completed weave when the cache is stale.
    pub fn from_snapshot(mut snapshot: Snapshot) -> Result<Self> {
        validate(&snapshot)?;

        let friend_index: HashMap<String, usize> = snapshot
            .friends
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();

        let mut interaction_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, weave) in snapshot.interactions.iter().enumerate() {
            for friend_id in &weave.friend_ids {
                interaction_index.entry(friend_id.clone()).or_default().push(i);
            }
        }

        for friend in &mut snapshot.friends {
            let latest = interaction_index
                .get(&friend.id)
                .into_iter()
                .flatten()
                .map(|&i| &snapshot.interactions[i])
                .filter(|w| w.is_completed())
                .map(|w| w.occurred_at)
                .max();
            if latest > friend.last_interaction_at {
                tracing::trace!(friend = %friend.id, "refreshing cached last interaction");
                friend.last_interaction_at = latest;
            }
        }

        tracing::debug!(
            friends = snapshot.friends.len(),
            interactions = snapshot.interactions.len(),
            "loaded snapshot"
        );

        Ok(Self {
            snapshot,
            friend_index,
            interaction_index,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

impl WeaveRepository for InMemoryRepository {
    fn friend(&self, id: &str) -> Option<&Friend> {
        self.friend_index.get(id).map(|&i| &self.snapshot.friends[i])
    }

    fn friends(&self) -> &[Friend] {
        &self.snapshot.friends
    }

    fn interactions(&self) -> &[Interaction] {
        &self.snapshot.interactions
    }

    fn interactions_for(&self, friend_id: &str) -> Vec<&Interaction> {
        self.interaction_index
            .get(friend_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&i| &self.snapshot.interactions[i])
                    .collect()
            })
            .unwrap_or_default()
    }

    fn life_events(&self) -> &[LifeEvent] {
        &self.snapshot.life_events
    }

    fn intentions(&self) -> &[Intention] {
        &self.snapshot.intentions
    }
}

fn validate(snapshot: &Snapshot) -> std::result::Result<(), ValidationError> {
    let mut friend_ids = HashSet::new();
    for friend in &snapshot.friends {
        if friend.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "friend.id".into(),
                message: format!("friend '{}' has an empty id", friend.name),
            });
        }
        if !friend_ids.insert(friend.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                record: "friend",
                id: friend.id.clone(),
            });
        }
        for (field, date) in [("birthday", friend.birthday), ("anniversary", friend.anniversary)] {
            if date.is_some_and(|d| !d.is_valid()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("friend.{field}"),
                    message: format!("'{}' has an impossible {field}", friend.id),
                });
            }
        }
    }

    let check_ref = |record: &'static str, record_id: &str, friend_id: &str| {
        if friend_ids.contains(friend_id) {
            Ok(())
        } else {
            Err(ValidationError::DanglingReference {
                record,
                record_id: record_id.to_string(),
                friend_id: friend_id.to_string(),
            })
        }
    };

    let mut interaction_ids = HashSet::new();
    for weave in &snapshot.interactions {
        if !interaction_ids.insert(weave.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                record: "interaction",
                id: weave.id.clone(),
            });
        }
        if weave.friend_ids.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "interaction.friendIds".into(),
                message: format!("interaction '{}' involves nobody", weave.id),
            });
        }
        for friend_id in &weave.friend_ids {
            check_ref("interaction", &weave.id, friend_id)?;
        }
    }

    for event in &snapshot.life_events {
        check_ref("life event", &event.id, &event.friend_id)?;
    }
    for intention in &snapshot.intentions {
        for friend_id in &intention.friend_ids {
            check_ref("intention", &intention.id, friend_id)?;
        }
    }
    Ok(())
}
