use super::{Account, Contact, EventType};
use crate::recurrence::{self, LeapDayPolicy};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A birthday reminder owned by one account, either derived from a matched
/// contact or entered by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedBirthday {
    pub id: String,
    pub contact_name: String,
    pub contact_id: Option<String>,
    pub birth_date: NaiveDate,
    pub event_type: EventType,
    pub from_contact: bool,
    pub created_at: DateTime<Utc>,
}

impl DerivedBirthday {
    /// `None` when the account has no birth date on file.
    pub fn from_match(contact: &Contact, account: &Account, created_at: DateTime<Utc>) -> Option<Self> {
        let birth_date = account.birth_date?;
        let contact_name = if contact.display_name.is_empty() {
            account.full_name()
        } else {
            contact.display_name.clone()
        };

        Some(Self {
            id: uuid::Uuid::new_v4().to_string(),
            contact_name,
            contact_id: Some(contact.id.clone()),
            birth_date,
            event_type: EventType::Birthday,
            from_contact: true,
            created_at,
        })
    }

    pub fn manual(contact_name: &str, birth_date: NaiveDate, event_type: EventType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            contact_name: contact_name.trim().to_string(),
            contact_id: None,
            birth_date,
            event_type,
            from_contact: false,
            created_at: Utc::now(),
        }
    }

    pub fn next_occurrence(&self, today: NaiveDate) -> NaiveDate {
        self.next_occurrence_with(today, LeapDayPolicy::default())
    }

    pub fn next_occurrence_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> NaiveDate {
        recurrence::next_occurrence_with(self.birth_date, true, today, policy)
    }

    pub fn days_until(&self, today: NaiveDate) -> i64 {
        self.days_until_with(today, LeapDayPolicy::default())
    }

    pub fn days_until_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> i64 {
        recurrence::days_until_with(self.birth_date, true, today, policy)
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.is_upcoming_with(today, LeapDayPolicy::default())
    }

    pub fn is_upcoming_with(&self, today: NaiveDate, policy: LeapDayPolicy) -> bool {
        recurrence::is_upcoming_with(self.birth_date, true, today, policy)
    }
}
