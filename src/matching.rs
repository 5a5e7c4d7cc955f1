//! Cross-referencing device contacts against the account directory.

use crate::models::{Account, Contact, DerivedBirthday};
use crate::utils::{normalize_email, normalize_phone};
use chrono::Utc;
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ContactMatch {
    pub contact: Contact,
    pub account: Account,
}

/// Case-insensitive email equality or phone equality after stripping
/// formatting. Either one is enough.
pub fn is_match(contact: &Contact, account: &Account) -> bool {
    let email = normalize_email(&account.email);
    if !email.is_empty() && contact.emails.iter().any(|e| normalize_email(e) == email) {
        return true;
    }

    match account.phone.as_deref().map(normalize_phone) {
        Some(phone) if !phone.is_empty() => contact
            .phone_numbers
            .iter()
            .any(|p| normalize_phone(p) == phone),
        _ => false,
    }
}

/// Stateless; safe to call repeatedly with the same input.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingService;

impl MatchingService {
    pub fn new() -> Self {
        Self
    }

    /// Pairs each contact with at most one account. The directory is scanned
    /// in ascending account id order and the first hit wins.
    pub fn find_matches(&self, contacts: &[Contact], directory: &[Account]) -> Vec<ContactMatch> {
        let mut ordered: Vec<&Account> = directory.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let matches: Vec<ContactMatch> = contacts
            .iter()
            .filter_map(|contact| {
                ordered
                    .iter()
                    .find(|account| is_match(contact, account))
                    .map(|account| ContactMatch {
                        contact: contact.clone(),
                        account: (*account).clone(),
                    })
            })
            .collect();

        debug!(
            "Matched {} of {} contacts against {} accounts",
            matches.len(),
            contacts.len(),
            directory.len()
        );
        matches
    }

    /// Skips matches whose account has no birth date.
    pub fn to_derived_birthdays(&self, matches: &[ContactMatch]) -> Vec<DerivedBirthday> {
        let now = Utc::now();
        matches
            .iter()
            .filter_map(|m| DerivedBirthday::from_match(&m.contact, &m.account, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn birthday() -> NaiveDate {
        NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
    }

    fn account(id: &str, email: &str) -> Account {
        let mut account = Account::new(id, "Test", "User", email);
        account.id = id.to_string();
        account
    }

    #[test]
    fn test_case_insensitive_email_match_produces_birthday() {
        let contacts = vec![Contact::new("c-1", "Ana").with_email("a@x.com")];
        let directory = vec![account("acct-1", "A@X.com").with_birth_date(birthday())];
        let service = MatchingService::new();

        let matches = service.find_matches(&contacts, &directory);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].account.id, "acct-1");

        let birthdays = service.to_derived_birthdays(&matches);
        assert_eq!(birthdays.len(), 1);
        assert_eq!(birthdays[0].birth_date, birthday());
        assert_eq!(birthdays[0].contact_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_phone_match_ignores_formatting() {
        let contacts = vec![Contact::new("c-1", "Bo").with_phone("+1 (555) 010-0001")];
        let directory = vec![account("acct-1", "bo@x.com").with_phone("+15550100001")];
        assert_eq!(MatchingService::new().find_matches(&contacts, &directory).len(), 1);
    }

    #[test]
    fn test_phone_match_is_exact_on_country_prefix() {
        let contacts = vec![Contact::new("c-1", "Bo").with_phone("5550100001")];
        let directory = vec![account("acct-1", "bo@x.com").with_phone("+15550100001")];
        assert!(MatchingService::new().find_matches(&contacts, &directory).is_empty());
    }

    #[test]
    fn test_unmatched_contact_produces_nothing() {
        let contacts = vec![Contact::new("c-1", "Cy").with_email("cy@x.com")];
        let directory = vec![account("acct-1", "someone@x.com").with_birth_date(birthday())];
        let service = MatchingService::new();
        let matches = service.find_matches(&contacts, &directory);
        assert!(matches.is_empty());
        assert!(service.to_derived_birthdays(&matches).is_empty());
    }

    #[test]
    fn test_match_without_birth_date_produces_no_birthday() {
        let contacts = vec![Contact::new("c-1", "Di").with_email("di@x.com")];
        let directory = vec![account("acct-1", "di@x.com")];
        let service = MatchingService::new();
        let matches = service.find_matches(&contacts, &directory);
        assert_eq!(matches.len(), 1);
        assert!(service.to_derived_birthdays(&matches).is_empty());
    }

    #[test]
    fn test_first_match_by_account_id_wins() {
        let contacts = vec![Contact::new("c-1", "Ed")
            .with_email("ed@x.com")
            .with_phone("+15550100009")];
        // Listed out of id order on purpose
        let directory = vec![
            account("acct-b", "ed@x.com"),
            account("acct-a", "other@x.com").with_phone("+15550100009"),
        ];

        let matches = MatchingService::new().find_matches(&contacts, &directory);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].account.id, "acct-a");
    }

    #[test]
    fn test_blank_account_email_never_matches() {
        let contact = Contact::new("c-1", "Fay").with_email("  ");
        let blank = account("acct-1", "");
        assert!(!is_match(&contact, &blank));
    }
}
