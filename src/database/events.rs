use super::BlobCollection;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventType};
use crate::recurrence::LeapDayPolicy;
use chrono::NaiveDate;
use log::info;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

pub const EVENTS_NAMESPACE: &str = "events";

/// Owner of the local Event collection. Writes read the whole collection,
/// modify it and write it back; the internal lock keeps writes through one
/// instance from interleaving. Date queries resolve Feb-29 anchors with the
/// store's leap day policy.
pub struct EventStore {
    events: BlobCollection<Event>,
    write_lock: Mutex<()>,
    leap_policy: LeapDayPolicy,
}

fn sorted_by_date(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.date.cmp(&b.date));
    events
}

impl EventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            events: BlobCollection::new(pool, EVENTS_NAMESPACE),
            write_lock: Mutex::new(()),
            leap_policy: LeapDayPolicy::default(),
        }
    }

    pub fn with_leap_policy(mut self, leap_policy: LeapDayPolicy) -> Self {
        self.leap_policy = leap_policy;
        self
    }

    pub fn leap_policy(&self) -> LeapDayPolicy {
        self.leap_policy
    }

    /// Inserts the event, replacing any record with the same id.
    pub async fn save(&self, event: &Event) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.events.load().await?;
        events.insert(event.id.clone(), event.clone());
        self.events.store(&events).await?;

        info!("Saved event '{}' ({})", event.title, event.id);
        Ok(())
    }

    /// Upsert keyed by id. An existing record keeps its creation time.
    pub async fn update(&self, event: &Event) -> AppResult<Event> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.events.load().await?;

        let stored = match events.get(&event.id) {
            Some(existing) => existing.replaced_by(event.clone()),
            None => event.clone(),
        };
        events.insert(stored.id.clone(), stored.clone());
        self.events.store(&events).await?;

        info!("Updated event '{}' ({})", stored.title, stored.id);
        Ok(stored)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.events.load().await?;
        if events.remove(id).is_none() {
            return Err(AppError::not_found(format!("event {}", id)));
        }
        self.events.store(&events).await?;

        info!("Deleted event {}", id);
        Ok(())
    }

    /// Store-wide reset.
    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.events.clear().await?;
        info!("Cleared all events");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Event>> {
        Ok(self.events.load().await?.remove(id))
    }

    /// Every event, earliest anchor date first.
    pub async fn all(&self) -> AppResult<Vec<Event>> {
        let events = self.events.load().await?.into_values().collect();
        Ok(sorted_by_date(events))
    }

    pub async fn by_type(&self, event_type: EventType) -> AppResult<Vec<Event>> {
        let events = self
            .events
            .load()
            .await?
            .into_values()
            .filter(|e| e.event_type == event_type)
            .collect();
        Ok(sorted_by_date(events))
    }

    /// Events 1..=30 days away, soonest first, at most `limit` of them.
    pub async fn upcoming(&self, limit: usize, today: NaiveDate) -> AppResult<Vec<Event>> {
        let mut events: Vec<(i64, Event)> = self
            .events
            .load()
            .await?
            .into_values()
            .filter(|e| e.is_upcoming_with(today, self.leap_policy))
            .map(|e| (e.days_until_with(today, self.leap_policy), e))
            .collect();

        events.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.date.cmp(&b.1.date)));
        Ok(events.into_iter().take(limit).map(|(_, e)| e).collect())
    }

    /// Events falling on `date` (month and day only for recurring events).
    pub async fn for_date(&self, date: NaiveDate) -> AppResult<Vec<Event>> {
        let events = self
            .events
            .load()
            .await?
            .into_values()
            .filter(|e| e.falls_on_with(date, self.leap_policy))
            .collect();
        Ok(sorted_by_date(events))
    }

    pub async fn today(&self, today: NaiveDate) -> AppResult<Vec<Event>> {
        let events = self
            .events
            .load()
            .await?
            .into_values()
            .filter(|e| e.is_today_with(today, self.leap_policy))
            .collect();
        Ok(sorted_by_date(events))
    }
}
