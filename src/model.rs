use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Number of days tracked by every planner.
pub const DAY_COUNT: u32 = 100;

pub const DEFAULT_PLANNER_TITLE: &str = "New Planner";
pub const MIGRATED_PLANNER_TITLE: &str = "My Self-Care";

pub fn is_valid_day(day: u32) -> bool {
    (1..=DAY_COUNT).contains(&day)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Calm,
    Neutral,
    Tired,
    Sad,
    Stressed,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Neutral,
        Mood::Tired,
        Mood::Sad,
        Mood::Stressed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
            Mood::Sad => "sad",
            Mood::Stressed => "stressed",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Mood::Happy => "🥰",
            Mood::Calm => "😌",
            Mood::Neutral => "😐",
            Mood::Tired => "🥱",
            Mood::Sad => "😢",
            Mood::Stressed => "🤯",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "Happy",
            Mood::Calm => "Calm",
            Mood::Neutral => "Neutral",
            Mood::Tired => "Tired",
            Mood::Sad => "Sad",
            Mood::Stressed => "Stressed",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMood(pub String);

impl fmt::Display for UnknownMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Mood::ALL.iter().map(|m| m.as_str()).collect();
        write!(f, "unknown mood '{}' (expected one of: {})", self.0, known.join(", "))
    }
}

impl std::error::Error for UnknownMood {}

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// Stored moods outside the known set read back as absent instead of
/// failing the whole planner list.
fn lenient_mood<'de, D>(deserializer: D) -> Result<Option<Mood>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok()))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        default,
        deserialize_with = "lenient_mood",
        skip_serializing_if = "Option::is_none"
    )]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<String>>,
}

impl DayEntry {
    /// The value shown for a day nobody has saved yet.
    pub fn empty(day_number: u32) -> Self {
        Self {
            day_number,
            date: None,
            completed: false,
            mood: None,
            content: String::new(),
            activities: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planner {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub entries: BTreeMap<u32, DayEntry>,
}

impl Planner {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            title: title.into(),
            start_date: String::new(),
            goal: String::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Saved entry for `day`, or an untouched default that is not stored.
    pub fn entry(&self, day: u32) -> DayEntry {
        self.entries
            .get(&day)
            .cloned()
            .unwrap_or_else(|| DayEntry::empty(day))
    }

    pub fn completed_days(&self) -> usize {
        self.entries.values().filter(|e| e.completed).count()
    }
}

/// Partial update for a planner; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlannerPatch {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub goal: Option<String>,
    pub entries: Option<BTreeMap<u32, DayEntry>>,
}

impl PlannerPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn start_date(start_date: impl Into<String>) -> Self {
        Self {
            start_date: Some(start_date.into()),
            ..Self::default()
        }
    }

    pub fn goal(goal: impl Into<String>) -> Self {
        Self {
            goal: Some(goal.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.start_date.is_none()
            && self.goal.is_none()
            && self.entries.is_none()
    }

    pub fn apply(self, planner: &mut Planner) {
        if let Some(title) = self.title {
            planner.title = title;
        }
        if let Some(start_date) = self.start_date {
            planner.start_date = start_date;
        }
        if let Some(goal) = self.goal {
            planner.goal = goal;
        }
        if let Some(entries) = self.entries {
            planner.entries = entries;
        }
    }
}
