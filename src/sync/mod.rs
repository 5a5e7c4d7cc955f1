//! Contact synchronization pipeline.
//!
//! One sync walks Idle -> RequestingPermission -> FetchingContacts ->
//! PersistingContacts -> MatchingAccounts -> Completed, or drops into
//! Failed from whichever stage errored. Observers follow along through
//! [`SyncPipeline::subscribe`].

use crate::error::{AppError, AppResult};
use crate::matching::MatchingService;
use crate::models::{
    Account, Contact, ContactEntry, DerivedBirthday, EventType, SyncSnapshot, SyncState,
    SyncStatistics,
};
use crate::recurrence::{self, LeapDayPolicy};
use crate::utils::logging::{log_error_with_context, log_sync_stage};
use crate::validation;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

pub mod collaborators;

pub use collaborators::{ContactSource, PermissionProvider, PermissionStatus, RemoteUserStore};

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct SyncPipeline {
    permissions: Arc<dyn PermissionProvider>,
    contact_source: Arc<dyn ContactSource>,
    store: Arc<dyn RemoteUserStore>,
    matcher: MatchingService,
    snapshot: watch::Sender<SyncSnapshot>,
    clock: Clock,
    leap_policy: LeapDayPolicy,
}

impl SyncPipeline {
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        contact_source: Arc<dyn ContactSource>,
        store: Arc<dyn RemoteUserStore>,
    ) -> Self {
        let (snapshot, _) = watch::channel(SyncSnapshot::default());
        Self {
            permissions,
            contact_source,
            store,
            matcher: MatchingService::new(),
            snapshot,
            clock: Arc::new(recurrence::today),
            leap_policy: LeapDayPolicy::default(),
        }
    }

    /// Overrides the source of "today" used for sorting and statistics.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Policy for placing Feb-29 birthdays in common years.
    pub fn with_leap_policy(mut self, leap_policy: LeapDayPolicy) -> Self {
        self.leap_policy = leap_policy;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.snapshot.borrow().state.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Runs a full sync for `account_id` and returns the state it ended in.
    /// Does nothing while another sync is running, or after a failure that
    /// has not been [`reset`](Self::reset).
    pub async fn start_sync(&self, account_id: &str) -> SyncState {
        if !self.begin() {
            let current = self.state();
            debug!("Sync request for {} ignored while {}", account_id, current);
            return current;
        }
        log_sync_stage(account_id, SyncState::RequestingPermission.name());

        match self.run_stages(account_id).await {
            Ok(()) => self.transition(account_id, SyncState::Completed),
            Err(e) => {
                log_error_with_context(&e, "Sync");
                self.transition(account_id, SyncState::Failed(Arc::new(e)));
            }
        }

        self.state()
    }

    /// Returns a finished or failed pipeline to Idle.
    pub fn reset(&self) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.state.can_transition_to(&SyncState::Idle) {
                snapshot.state = SyncState::Idle;
                true
            } else {
                false
            }
        })
    }

    /// Re-reads persisted contacts and birthdays without touching the state.
    pub async fn refresh(&self, account_id: &str) -> AppResult<()> {
        let (contacts, birthdays) = self.load_projection(account_id).await?;
        self.publish_projection(contacts, birthdays);
        Ok(())
    }

    /// Records a birthday typed in by the user, bypassing contact access.
    pub async fn add_manual_birthday(
        &self,
        account_id: &str,
        name: &str,
        birth_date: NaiveDate,
        event_type: EventType,
    ) -> AppResult<DerivedBirthday> {
        validation::validate_name(name).into_result()?;
        if birth_date > (self.clock)() {
            return Err(AppError::validation("Date cannot be in the future"));
        }

        let birthday = DerivedBirthday::manual(name, birth_date, event_type);
        self.store.add_birthday(account_id, &birthday).await?;
        info!("Added manual birthday '{}' for {}", birthday.contact_name, account_id);

        self.refresh(account_id).await?;
        Ok(birthday)
    }

    pub async fn delete_birthday(&self, account_id: &str, birthday_id: &str) -> AppResult<()> {
        self.store.delete_birthday(birthday_id, account_id).await?;
        self.refresh(account_id).await
    }

    /// Claims the pipeline for a new run. Check and set happen in one step.
    fn begin(&self) -> bool {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.state.can_start() {
                snapshot.state = SyncState::RequestingPermission;
                true
            } else {
                false
            }
        })
    }

    fn transition(&self, account_id: &str, next: SyncState) {
        let name = next.name();
        let mut applied = false;
        self.snapshot.send_modify(|snapshot| {
            if snapshot.state.can_transition_to(&next) {
                snapshot.state = next;
                applied = true;
            } else {
                warn!("Ignoring sync transition {} -> {}", snapshot.state, next);
            }
        });

        if applied {
            log_sync_stage(account_id, name);
        }
    }

    async fn run_stages(&self, account_id: &str) -> AppResult<()> {
        self.ensure_permission().await?;

        self.transition(account_id, SyncState::FetchingContacts);
        let contacts = self.contact_source.fetch_contacts().await?;
        let synced_at = Utc::now();
        let mut entries: Vec<ContactEntry> = contacts
            .iter()
            .map(|contact| ContactEntry::from_contact(contact, synced_at))
            .collect();
        info!("Fetched {} contacts for {}", contacts.len(), account_id);

        self.transition(account_id, SyncState::PersistingContacts);
        self.store.save_contacts(account_id, &entries).await?;

        self.transition(account_id, SyncState::MatchingAccounts);
        let directory = self.build_directory(account_id, &contacts).await?;
        let matches = self.matcher.find_matches(&contacts, &directory);

        if !matches.is_empty() {
            let matched: HashMap<&str, &str> = matches
                .iter()
                .map(|m| (m.contact.id.as_str(), m.account.id.as_str()))
                .collect();
            for entry in entries.iter_mut() {
                if let Some(account) = matched.get(entry.id.as_str()) {
                    entry.mark_matched(account);
                }
            }
            self.store.save_contacts(account_id, &entries).await?;
        }

        let birthdays = self.matcher.to_derived_birthdays(&matches);
        self.store.save_birthdays(account_id, &birthdays).await?;
        info!(
            "Matched {} contacts, {} with birthdays, for {}",
            matches.len(),
            birthdays.len(),
            account_id
        );

        // Statistics are best effort; a failed read-back keeps the old ones
        if let Err(e) = self.refresh(account_id).await {
            warn!("Could not refresh sync statistics for {}: {}", account_id, e);
        }

        Ok(())
    }

    async fn ensure_permission(&self) -> AppResult<()> {
        match self.permissions.current_status().await {
            PermissionStatus::Authorized => Ok(()),
            PermissionStatus::Denied => Err(AppError::permission_denied(
                "Contact access was denied.",
            )),
            PermissionStatus::Restricted => Err(AppError::permission_denied(
                "Contact access is restricted on this device.",
            )),
            PermissionStatus::NotDetermined => {
                if self.permissions.request_permission().await? {
                    Ok(())
                } else {
                    Err(AppError::permission_denied("Contact access was denied."))
                }
            }
        }
    }

    /// Visible accounts reachable through any contact email or phone,
    /// excluding the syncing account itself.
    async fn build_directory(&self, account_id: &str, contacts: &[Contact]) -> AppResult<Vec<Account>> {
        let mut seen = HashSet::new();
        let mut directory = Vec::new();

        for contact in contacts {
            let mut found = Vec::new();
            for email in contact.emails.iter().filter(|e| !e.trim().is_empty()) {
                found.extend(self.store.search_by_email(email).await?);
            }
            for phone in contact.phone_numbers.iter().filter(|p| !p.trim().is_empty()) {
                found.extend(self.store.search_by_phone(phone).await?);
            }

            for account in found {
                if account.id != account_id && seen.insert(account.id.clone()) {
                    directory.push(account);
                }
            }
        }

        debug!("Directory for {} has {} accounts", account_id, directory.len());
        Ok(directory)
    }

    async fn load_projection(
        &self,
        account_id: &str,
    ) -> AppResult<(Vec<ContactEntry>, Vec<DerivedBirthday>)> {
        tokio::try_join!(
            self.store.get_contacts(account_id),
            self.store.get_birthdays(account_id)
        )
    }

    fn publish_projection(&self, contacts: Vec<ContactEntry>, mut birthdays: Vec<DerivedBirthday>) {
        let today = (self.clock)();
        let policy = self.leap_policy;
        birthdays.sort_by_cached_key(|b| (b.days_until_with(today, policy), b.contact_name.to_lowercase()));
        let statistics = SyncStatistics::compute_with(&contacts, &birthdays, today, policy);

        self.snapshot.send_modify(|snapshot| {
            snapshot.contacts = contacts;
            snapshot.birthdays = birthdays;
            snapshot.statistics = statistics;
        });
    }
}
