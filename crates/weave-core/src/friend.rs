//! Friend records and care tiers.
//!
//! A [`Friend`] carries a few cached fields (`last_interaction_at`,
//! momentum) that the data-access layer refreshes whenever a weave is
//! logged. The engine treats friends as read-only snapshots.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque friend identifier.
pub type FriendId = String;

/// Care tier assigned by the user, closest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// The handful of people seen every week
    #[serde(alias = "inner-circle", alias = "inner_circle")]
    InnerCircle,
    /// Friends kept up with a couple of times a month
    #[serde(alias = "close-friends", alias = "close_friends")]
    CloseFriends,
    /// Wider circle, checked in with every month or two
    #[serde(alias = "community")]
    Community,
}

impl Tier {
    /// All tiers, closest first.
    pub const ALL: [Tier; 3] = [Tier::InnerCircle, Tier::CloseFriends, Tier::Community];

    /// Human-readable tier name.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::InnerCircle => "Inner Circle",
            Tier::CloseFriends => "Close Friends",
            Tier::Community => "Community",
        }
    }

    /// Stable machine key, used in ids and config tables.
    pub fn key(&self) -> &'static str {
        match self {
            Tier::InnerCircle => "inner-circle",
            Tier::CloseFriends => "close-friends",
            Tier::Community => "community",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Community
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "inner-circle" | "innercircle" | "inner" => Ok(Tier::InnerCircle),
            "close-friends" | "closefriends" | "close" => Ok(Tier::CloseFriends),
            "community" => Ok(Tier::Community),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// A recurring date that may omit the year (birthdays entered without one).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialDate {
    pub month: u32,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl PartialDate {
    pub fn new(month: u32, day: u32) -> Self {
        Self {
            month,
            day,
            year: None,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn is_valid(&self) -> bool {
        // 2000 is a leap year, so Feb 29 passes here
        NaiveDate::from_ymd_opt(2000, self.month, self.day).is_some()
    }

    /// Date this falls on in `year`. Feb 29 lands on Feb 28 outside leap years.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| {
            if self.month == 2 && self.day == 29 {
                NaiveDate::from_ymd_opt(year, 2, 28)
            } else {
                None
            }
        })
    }

    /// Next occurrence on or after `today`.
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        let this_year = self.in_year(today.year())?;
        if this_year >= today {
            Some(this_year)
        } else {
            self.in_year(today.year() + 1)
        }
    }

    /// Days from `today` until the next occurrence (0 when it is today).
    pub fn days_until(&self, today: NaiveDate) -> Option<i64> {
        self.next_occurrence(today)
            .map(|date| (date - today).num_days())
    }

    /// Years elapsed at the next occurrence, when the year is known.
    pub fn years_at_next(&self, today: NaiveDate) -> Option<i32> {
        let year = self.year?;
        let next = self.next_occurrence(today)?;
        Some(next.year() - year)
    }
}

/// A person the user keeps in touch with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
    #[serde(default)]
    pub tier: Tier,
    pub created_at: DateTime<Utc>,
    /// Most recent completed weave, cached by the data-access layer
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub momentum_score: f64,
    #[serde(default)]
    pub momentum_last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_dormant: bool,
    #[serde(default)]
    pub birthday: Option<PartialDate>,
    #[serde(default)]
    pub anniversary: Option<PartialDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Friend {
    /// Create a friend with no history.
    pub fn new(
        id: impl Into<FriendId>,
        name: impl Into<String>,
        tier: Tier,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tier,
            created_at,
            last_interaction_at: None,
            momentum_score: 0.0,
            momentum_last_updated: None,
            is_dormant: false,
            birthday: None,
            anniversary: None,
            phone: None,
            email: None,
        }
    }

    /// Whether a direct "reach out" action can be offered.
    pub fn has_contact_channel(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
            || self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// First name for friendlier suggestion copy.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
