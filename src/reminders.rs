use crate::models::Event;
use crate::recurrence::{self, LeapDayPolicy};
use chrono::{Duration, NaiveDate};
use log::debug;

/// One reminder that should fire today.
#[derive(Debug, Clone, PartialEq)]
pub struct DueReminder {
    pub event: Event,
    /// Days between today and the occurrence; 0 for the day itself.
    pub lead_days: u32,
    pub occurrence: NaiveDate,
}

impl DueReminder {
    pub fn is_day_of(&self) -> bool {
        self.lead_days == 0
    }

    pub fn summary(&self) -> String {
        let when = match self.lead_days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };

        match self.event.milestone_years(self.occurrence) {
            Some(years) if years > 0 => {
                format!("{} ({}, {} years) is {}", self.event.title, self.event.event_type, years, when)
            }
            _ => format!("{} ({}) is {}", self.event.title, self.event.event_type, when),
        }
    }
}

pub fn due_reminders(events: &[Event], today: NaiveDate) -> Vec<DueReminder> {
    due_reminders_with(events, today, LeapDayPolicy::default())
}

/// Every reminder whose occurrence minus its lead time is `today`, plus a
/// day-of reminder for events occurring today. Ordered by lead time, then
/// title.
pub fn due_reminders_with(events: &[Event], today: NaiveDate, policy: LeapDayPolicy) -> Vec<DueReminder> {
    let mut due = Vec::new();

    for event in events {
        let leads = std::iter::once(0).chain(event.reminder_days.iter().copied().filter(|&d| d > 0));
        for lead_days in leads {
            let target = today + Duration::days(i64::from(lead_days));
            let occurrence =
                recurrence::next_occurrence_with(event.date, event.is_recurring, target, policy);
            if occurrence == target {
                due.push(DueReminder {
                    event: event.clone(),
                    lead_days,
                    occurrence,
                });
            }
        }
    }

    due.sort_by(|a, b| {
        a.lead_days
            .cmp(&b.lead_days)
            .then_with(|| a.event.title.cmp(&b.event.title))
    });
    debug!("{} reminders due on {}", due.len(), today);
    due
}
