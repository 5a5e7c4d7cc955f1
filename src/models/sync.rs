use super::{ContactEntry, DerivedBirthday};
use crate::error::AppError;
use crate::recurrence::LeapDayPolicy;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::sync::Arc;

/// Contact synchronization progress. Forward-only through the stages;
/// `Failed` is reachable from any in-progress stage.
#[derive(Debug, Clone)]
pub enum SyncState {
    Idle,
    RequestingPermission,
    FetchingContacts,
    PersistingContacts,
    MatchingAccounts,
    Completed,
    Failed(Arc<AppError>),
}

impl SyncState {
    pub fn name(&self) -> &'static str {
        match self {
            SyncState::Idle => "Idle",
            SyncState::RequestingPermission => "RequestingPermission",
            SyncState::FetchingContacts => "FetchingContacts",
            SyncState::PersistingContacts => "PersistingContacts",
            SyncState::MatchingAccounts => "MatchingAccounts",
            SyncState::Completed => "Completed",
            SyncState::Failed(_) => "Failed",
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            SyncState::RequestingPermission
                | SyncState::FetchingContacts
                | SyncState::PersistingContacts
                | SyncState::MatchingAccounts
        )
    }

    /// Whether a new sync may begin from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, SyncState::Idle | SyncState::Completed)
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            SyncState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: &SyncState) -> bool {
        use SyncState::*;
        match (self, next) {
            (Idle | Completed, RequestingPermission) => true,
            (RequestingPermission, FetchingContacts)
            | (FetchingContacts, PersistingContacts)
            | (PersistingContacts, MatchingAccounts)
            | (MatchingAccounts, Completed) => true,
            (from, Failed(_)) => from.is_in_progress(),
            (Failed(_) | Completed, Idle) => true,
            _ => false,
        }
    }
}

impl PartialEq for SyncState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SyncState::Failed(a), SyncState::Failed(b)) => a.to_string() == b.to_string(),
            _ => self.name() == other.name(),
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Failed(err) => write!(f, "Failed({})", err),
            other => f.write_str(other.name()),
        }
    }
}

/// Aggregate counts shown alongside the synced lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatistics {
    pub total_contacts: usize,
    pub app_users: usize,
    pub birthdays_from_contacts: usize,
    pub manual_birthdays: usize,
    pub upcoming_birthdays: usize,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncStatistics {
    pub fn compute(contacts: &[ContactEntry], birthdays: &[DerivedBirthday], today: NaiveDate) -> Self {
        Self::compute_with(contacts, birthdays, today, LeapDayPolicy::default())
    }

    pub fn compute_with(
        contacts: &[ContactEntry],
        birthdays: &[DerivedBirthday],
        today: NaiveDate,
        policy: LeapDayPolicy,
    ) -> Self {
        let from_contacts = birthdays.iter().filter(|b| b.from_contact).count();
        Self {
            total_contacts: contacts.len(),
            app_users: contacts.iter().filter(|c| c.is_app_user).count(),
            birthdays_from_contacts: from_contacts,
            manual_birthdays: birthdays.len() - from_contacts,
            upcoming_birthdays: birthdays.iter().filter(|b| b.is_upcoming_with(today, policy)).count(),
            last_synced_at: contacts.iter().map(|c| c.synced_at).max(),
        }
    }
}

/// What observers of the pipeline see after every transition.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub contacts: Vec<ContactEntry>,
    /// Sorted by days until the next occurrence, soonest first.
    pub birthdays: Vec<DerivedBirthday>,
    pub statistics: SyncStatistics,
}

impl Default for SyncSnapshot {
    fn default() -> Self {
        Self {
            state: SyncState::Idle,
            contacts: Vec::new(),
            birthdays: Vec::new(),
            statistics: SyncStatistics::default(),
        }
    }
}
