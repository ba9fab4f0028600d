//! Copy for guaranteed suggestions.
//!
//! All wording lives here so it can be swapped (or loaded from JSON) without
//! touching selection logic. Titles may contain `{name}`, which is replaced
//! with the friend's first name.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::weave::InteractionCategory;

/// One piece of suggestion copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub action_label: String,
    #[serde(default)]
    pub category: Option<InteractionCategory>,
}

impl Template {
    pub fn new(id: &str, title: &str, subtitle: &str, icon: &str, action_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            icon: icon.to_string(),
            action_label: action_label.to_string(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: InteractionCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Title with the friend's name substituted for `{name}` and for every
    /// friend marker ("someone", "a friend" in the built-in registry).
    pub fn render_title(&self, first_name: Option<&str>, markers: &[String]) -> String {
        render(&self.title, first_name, markers)
    }

    pub fn render_subtitle(&self, first_name: Option<&str>, markers: &[String]) -> String {
        render(&self.subtitle, first_name, markers)
    }
}

fn render(text: &str, first_name: Option<&str>, markers: &[String]) -> String {
    match first_name {
        Some(name) => markers
            .iter()
            .filter(|m| !m.is_empty())
            .fold(text.replace("{name}", name), |acc, marker| acc.replace(marker.as_str(), name)),
        None => text.replace("{name}", "a friend"),
    }
}

/// Coarse part of the day for contextual wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// 05:00-11:59
    Morning,
    /// 12:00-16:59
    Afternoon,
    /// 17:00-21:59
    Evening,
    /// 22:00-04:59
    Night,
}

impl TimeOfDay {
    pub fn from_time(time: NaiveTime) -> Self {
        match time.hour() {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDayTemplates {
    #[serde(default)]
    pub morning: Vec<Template>,
    #[serde(default)]
    pub afternoon: Vec<Template>,
    #[serde(default)]
    pub evening: Vec<Template>,
    #[serde(default)]
    pub night: Vec<Template>,
}

impl TimeOfDayTemplates {
    pub fn get(&self, time_of_day: TimeOfDay) -> &[Template] {
        match time_of_day {
            TimeOfDay::Morning => &self.morning,
            TimeOfDay::Afternoon => &self.afternoon,
            TimeOfDay::Evening => &self.evening,
            TimeOfDay::Night => &self.night,
        }
    }
}

/// Every template the guaranteed layer draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRegistry {
    /// One prompt per weekday, Monday first
    pub daily_reflect: Vec<Template>,
    pub gentle_nudge: Vec<Template>,
    /// Softer nudges used while resting
    pub gentle_nudge_resting: Vec<Template>,
    pub wildcard_generic: Vec<Template>,
    pub wildcard_time_of_day: TimeOfDayTemplates,
    /// Extra wildcards per weekday, Monday first
    pub wildcard_weekday: Vec<Vec<Template>>,
    /// Title substrings marking a wildcard that must be bound to a friend
    pub friend_markers: Vec<String>,
    pub community_checkin: Vec<Template>,
    pub set_intention: Vec<Template>,
    pub variety: Vec<Template>,
    pub reach_out: Vec<Template>,
}

impl TemplateRegistry {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.daily_reflect.len() != 7 {
            return Err(ValidationError::InvalidValue {
                field: "dailyReflect".to_string(),
                message: format!("expected 7 prompts, got {}", self.daily_reflect.len()),
            });
        }
        if self.wildcard_weekday.len() != 7 {
            return Err(ValidationError::InvalidValue {
                field: "wildcardWeekday".to_string(),
                message: format!("expected 7 days, got {}", self.wildcard_weekday.len()),
            });
        }
        if self.wildcard_generic.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "wildcardGeneric".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The prompt for `date` and its weekday index (Monday = 0).
    pub fn daily_reflect_for(&self, date: NaiveDate) -> Option<(usize, &Template)> {
        let index = date.weekday().num_days_from_monday() as usize;
        self.daily_reflect.get(index).map(|t| (index, t))
    }

    pub fn gentle_nudge_pool(&self, resting: bool) -> &[Template] {
        if resting && !self.gentle_nudge_resting.is_empty() {
            &self.gentle_nudge_resting
        } else {
            &self.gentle_nudge
        }
    }

    /// Time-of-day and weekday wildcards for this moment.
    pub fn contextual_wildcards(&self, weekday: Weekday, time: NaiveTime) -> Vec<&Template> {
        let mut pool: Vec<&Template> = self
            .wildcard_time_of_day
            .get(TimeOfDay::from_time(time))
            .iter()
            .collect();
        if let Some(day) = self
            .wildcard_weekday
            .get(weekday.num_days_from_monday() as usize)
        {
            pool.extend(day.iter());
        }
        pool
    }

    pub fn needs_friend(&self, template: &Template) -> bool {
        self.friend_markers
            .iter()
            .any(|marker| template.title.contains(marker.as_str()))
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        use InteractionCategory as C;

        Self {
            daily_reflect: vec![
                Template::new(
                    "monday-intent",
                    "Who do you want to see this week?",
                    "Start the week with one person in mind",
                    "sunrise",
                    "Reflect",
                ),
                Template::new(
                    "tuesday-gratitude",
                    "Who made you laugh recently?",
                    "Small moments count",
                    "smile",
                    "Reflect",
                ),
                Template::new(
                    "wednesday-energy",
                    "Which conversations gave you energy?",
                    "Notice who lifts you up",
                    "battery",
                    "Reflect",
                ),
                Template::new(
                    "thursday-drift",
                    "Is there someone you miss?",
                    "Drifting happens. Noticing it is the first step",
                    "compass",
                    "Reflect",
                ),
                Template::new(
                    "friday-wins",
                    "What went well with your people this week?",
                    "Celebrate the effort you put in",
                    "star",
                    "Reflect",
                ),
                Template::new(
                    "saturday-presence",
                    "Who would you love to spend today with?",
                    "Weekends are for the people who matter",
                    "sun",
                    "Reflect",
                ),
                Template::new(
                    "sunday-review",
                    "How did your week of connection feel?",
                    "A quiet look back before the week ahead",
                    "moon",
                    "Reflect",
                ),
            ],
            gentle_nudge: vec![
                Template::new(
                    "nudge-thinking",
                    "Let {name} know you're thinking of them",
                    "A quick message goes a long way",
                    "message",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "nudge-catch-up",
                    "Catch up with {name}",
                    "It's been a little while",
                    "phone",
                    "Plan",
                )
                .with_category(C::Call),
                Template::new(
                    "nudge-coffee",
                    "Grab a coffee with {name}",
                    "Low effort, high reward",
                    "coffee",
                    "Plan",
                )
                .with_category(C::MealDrink),
            ],
            gentle_nudge_resting: vec![
                Template::new(
                    "rest-emoji",
                    "Send {name} a quick emoji",
                    "No conversation needed",
                    "heart",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "rest-voice",
                    "Leave {name} a short voice note",
                    "Whenever you have a spare minute",
                    "mic",
                    "Reach out",
                )
                .with_category(C::VoiceNote),
            ],
            wildcard_generic: vec![
                Template::new(
                    "wild-song",
                    "Send {name} a song that reminds you of them",
                    "Music says what words can't",
                    "music",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "wild-photo",
                    "Look through old photos",
                    "Who shows up the most?",
                    "image",
                    "Reflect",
                ),
                Template::new(
                    "wild-compliment",
                    "Tell someone what you appreciate about them",
                    "Specific praise sticks",
                    "sparkles",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "wild-new-thing",
                    "Try something new with a friend",
                    "Shared novelty builds closeness",
                    "rocket",
                    "Plan",
                )
                .with_category(C::ActivityHobby),
            ],
            wildcard_time_of_day: TimeOfDayTemplates {
                morning: vec![Template::new(
                    "wild-morning",
                    "Send someone a good-morning text",
                    "Start their day with a smile",
                    "sunrise",
                    "Reach out",
                )
                .with_category(C::Text)],
                afternoon: vec![Template::new(
                    "wild-lunch",
                    "Invite {name} to lunch this week",
                    "Midday breaks are easy to share",
                    "utensils",
                    "Plan",
                )
                .with_category(C::MealDrink)],
                evening: vec![Template::new(
                    "wild-call",
                    "Call someone on your way home",
                    "Turn a commute into a catch-up",
                    "phone",
                    "Plan",
                )
                .with_category(C::Call)],
                night: vec![Template::new(
                    "wild-gratitude",
                    "Write down one thing a friend did for you",
                    "Gratitude before sleep",
                    "moon",
                    "Reflect",
                )],
            },
            wildcard_weekday: vec![
                vec![],
                vec![],
                vec![Template::new(
                    "wild-midweek",
                    "Plan a midweek dinner with {name}",
                    "Something to look forward to",
                    "utensils",
                    "Plan",
                )
                .with_category(C::MealDrink)],
                vec![],
                vec![Template::new(
                    "wild-weekend",
                    "Make weekend plans with someone",
                    "Before the weekend fills up",
                    "calendar",
                    "Plan",
                )
                .with_category(C::Hangout)],
                vec![Template::new(
                    "wild-saturday",
                    "Go for a walk with {name}",
                    "Fresh air and good company",
                    "footprints",
                    "Plan",
                )
                .with_category(C::ActivityHobby)],
                vec![Template::new(
                    "wild-sunday",
                    "Plan a slow Sunday brunch",
                    "Gather a few favourite people",
                    "coffee",
                    "Plan",
                )
                .with_category(C::MealDrink)],
            ],
            friend_markers: vec![
                "{name}".to_string(),
                "someone".to_string(),
                "a friend".to_string(),
            ],
            community_checkin: vec![
                Template::new(
                    "community-hello",
                    "Say hi to {name}",
                    "Keep your wider circle warm",
                    "wave",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "community-update",
                    "Ask {name} what's new",
                    "A light check-in keeps the door open",
                    "message",
                    "Reach out",
                )
                .with_category(C::Text),
            ],
            set_intention: vec![
                Template::new(
                    "intention-next",
                    "What's next with {name}?",
                    "Set an intention so it doesn't slip",
                    "target",
                    "Set intention",
                ),
                Template::new(
                    "intention-idea",
                    "Jot down an idea for {name}",
                    "A plan for later, not a task for now",
                    "lightbulb",
                    "Set intention",
                ),
            ],
            variety: vec![
                Template::new(
                    "variety-video",
                    "Try a video call with {name}",
                    "Mix up how you connect",
                    "video",
                    "Plan",
                )
                .with_category(C::VideoCall),
                Template::new(
                    "variety-activity",
                    "Do something active with {name}",
                    "A change of scene changes the conversation",
                    "bike",
                    "Plan",
                )
                .with_category(C::ActivityHobby),
                Template::new(
                    "variety-deep",
                    "Have a deeper conversation with {name}",
                    "Go past the usual catch-up",
                    "sofa",
                    "Plan",
                )
                .with_category(C::DeepTalk),
            ],
            reach_out: vec![
                Template::new(
                    "reach-why-not",
                    "Why not reach out to {name}?",
                    "No reason needed",
                    "send",
                    "Reach out",
                )
                .with_category(C::Text),
                Template::new(
                    "reach-hello",
                    "A quick hello to {name}",
                    "It might make their day",
                    "message",
                    "Reach out",
                )
                .with_category(C::Text),
            ],
        }
    }
}
