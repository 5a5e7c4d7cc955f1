use super::EventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A greeting that was composed for someone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub recipient: String,
    pub occasion: EventType,
    pub message: String,
    pub event_id: Option<String>,
    pub generated: bool, // false when the canned fallback was used
    pub created_at: DateTime<Utc>,
}

/// User-defined message body. `{name}` is replaced with the recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub id: String,
    pub name: String,
    pub occasion: EventType,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl CardTemplate {
    pub fn new(name: &str, occasion: EventType, body: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            occasion,
            body: body.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn render(&self, recipient: &str) -> String {
        self.body.replace("{name}", recipient)
    }
}
