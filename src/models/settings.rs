use crate::recurrence::LeapDayPolicy;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Lead times given to events built with `Event::new_with_defaults`.
    pub default_reminder_days: Vec<u32>,
    pub notifications_enabled: bool,
    pub calendar_export_default: bool,
    pub leap_day_policy: LeapDayPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_reminder_days: vec![1, 7],
            notifications_enabled: true,
            calendar_export_default: false,
            leap_day_policy: LeapDayPolicy::ClampToFeb28,
        }
    }
}
