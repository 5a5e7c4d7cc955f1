use crate::error::{AppError, AppResult};
use super::Settings;
use crate::recurrence::{self, LeapDayPolicy};
use crate::utils::normalize_title;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_REMINDER_DAYS: [u32; 2] = [1, 7];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Birthday,
    Anniversary,
    Custom,
    Holiday,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Birthday => "birthday",
            EventType::Anniversary => "anniversary",
            EventType::Custom => "custom",
            EventType::Holiday => "holiday",
            EventType::Other => "other",
        }
    }

    /// Whether whole-year counts (age, years together) mean anything.
    pub fn has_milestones(&self) -> bool {
        matches!(self, EventType::Birthday | EventType::Anniversary)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "birthday" => Ok(EventType::Birthday),
            "anniversary" => Ok(EventType::Anniversary),
            "custom" => Ok(EventType::Custom),
            "holiday" => Ok(EventType::Holiday),
            "other" => Ok(EventType::Other),
            _ => Err(AppError::validation(format!("Unknown event type: {}", s))),
        }
    }
}

/// A dated reminder. The anchor `date` is fixed at creation; edits go
/// through [`Event::replaced_by`], which swaps the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub is_recurring: bool,
    pub reminder_days: BTreeSet<u32>,
    pub add_to_calendar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(title: &str, date: NaiveDate, event_type: EventType) -> AppResult<Self> {
        let title = normalize_title(title);
        if title.is_empty() {
            return Err(AppError::validation("Please enter a title for this event"));
        }

        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: None,
            date,
            event_type,
            is_recurring: true,
            reminder_days: DEFAULT_REMINDER_DAYS.into_iter().collect(),
            add_to_calendar: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// A new event carrying the user's default reminder offsets and
    /// calendar export choice.
    pub fn new_with_defaults(
        title: &str,
        date: NaiveDate,
        event_type: EventType,
        settings: &Settings,
    ) -> AppResult<Self> {
        Ok(Self::new(title, date, event_type)?
            .with_reminder_days(settings.default_reminder_days.iter().copied())
            .with_calendar_export(settings.calendar_export_default))
    }

    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        self.description = (!description.is_empty()).then(|| description.to_string());
        self
    }

    pub fn recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = is_recurring;
        self
    }

    pub fn with_reminder_days<I: IntoIterator<Item = u32>>(mut self, days: I) -> Self {
        self.reminder_days = days.into_iter().collect();
        self
    }

    pub fn with_calendar_export(mut self, add_to_calendar: bool) -> Self {
        self.add_to_calendar = add_to_calendar;
        self
    }

    /// `edited` with this record's identity and creation time.
    pub fn replaced_by(&self, edited: Event) -> Event {
        Event {
            id: self.id.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
            ..edited
        }
    }

    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        self.next_occurrence_with(today, LeapDayPolicy::default())
    }

    pub fn next_occurrence_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> NaiveDate {
        recurrence::next_occurrence_with(self.date, self.is_recurring, today, policy)
    }

    pub fn days_until(&self, today: NaiveDate) -> i64 {
        self.days_until_with(today, LeapDayPolicy::default())
    }

    pub fn days_until_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> i64 {
        recurrence::days_until_with(self.date, self.is_recurring, today, policy)
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.is_today_with(today, LeapDayPolicy::default())
    }

    pub fn is_today_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> bool {
        recurrence::is_today_with(self.date, self.is_recurring, today, policy)
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.is_upcoming_with(today, LeapDayPolicy::default())
    }

    pub fn is_upcoming_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> bool {
        recurrence::is_upcoming_with(self.date, self.is_recurring, today, policy)
    }

    /// Age or anniversary count as of `today`; `None` for other event types.
    pub fn milestone_years(&self, today: NaiveDate) -> Option<i32> {
        self.event_type
            .has_milestones()
            .then(|| recurrence::years_between(self.date, today))
    }

    /// Same calendar day as `date`: exact for one-off events, month and day
    /// for recurring ones.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        self.falls_on_with(date, LeapDayPolicy::default())
    }

    /// Like [`Event::falls_on`], with a Feb-29 anchor landing on the
    /// policy's substitute day in common years.
    pub fn falls_on_with(&self, date: NaiveDate, policy: LeapDayPolicy) -> bool {
        if self.is_recurring {
            recurrence::falls_on_anniversary(self.date, date, policy)
        } else {
            self.date == date
        }
    }
}
