use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A device address-book card as handed over by the contact source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub display_name: String,
    pub phone_numbers: Vec<String>,
    pub emails: Vec<String>,
}

impl Contact {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.trim().to_string(),
            phone_numbers: Vec::new(),
            emails: Vec::new(),
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone_numbers.push(phone.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.emails.push(email.to_string());
        self
    }
}

/// Persisted, flattened form of a [`Contact`] for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContactEntry {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_app_user: bool,
    pub matched_account_id: Option<String>,
    pub synced_at: DateTime<Utc>,
}

impl ContactEntry {
    /// Keeps the first non-blank phone and email of the contact.
    pub fn from_contact(contact: &Contact, synced_at: DateTime<Utc>) -> Self {
        let first = |values: &[String]| {
            values
                .iter()
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            id: contact.id.clone(),
            name: contact.display_name.clone(),
            phone: first(&contact.phone_numbers),
            email: first(&contact.emails),
            is_app_user: false,
            matched_account_id: None,
            synced_at,
        }
    }

    pub fn mark_matched(&mut self, account_id: &str) {
        self.is_app_user = true;
        self.matched_account_id = Some(account_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_takes_first_non_blank_values() {
        let contact = Contact::new("c-1", " Ana Lima ")
            .with_phone("  ")
            .with_phone("+15550100001")
            .with_phone("+15550100002")
            .with_email("ana@example.com");
        let now = Utc::now();

        let entry = ContactEntry::from_contact(&contact, now);
        assert_eq!(entry.id, "c-1");
        assert_eq!(entry.name, "Ana Lima");
        assert_eq!(entry.phone.as_deref(), Some("+15550100001"));
        assert_eq!(entry.email.as_deref(), Some("ana@example.com"));
        assert!(!entry.is_app_user);
        assert_eq!(entry.synced_at, now);
    }

    #[test]
    fn test_entry_without_details() {
        let entry = ContactEntry::from_contact(&Contact::new("c-2", "Nobody"), Utc::now());
        assert!(entry.phone.is_none());
        assert!(entry.email.is_none());
    }

    #[test]
    fn test_mark_matched() {
        let mut entry = ContactEntry::from_contact(&Contact::new("c-3", "Bo"), Utc::now());
        entry.mark_matched("acct-9");
        assert!(entry.is_app_user);
        assert_eq!(entry.matched_account_id.as_deref(), Some("acct-9"));
    }
}
