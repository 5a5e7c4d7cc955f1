//! External capabilities the sync pipeline depends on, injected at
//! construction.

use crate::error::AppResult;
use crate::models::{Account, Contact, ContactEntry, DerivedBirthday};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    NotDetermined,
    Denied,
    Restricted,
    Authorized,
}

/// Access to the device address book.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Prompts the user if needed. `Ok(false)` means the user said no.
    async fn request_permission(&self) -> AppResult<bool>;

    async fn current_status(&self) -> PermissionStatus;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn fetch_contacts(&self) -> AppResult<Vec<Contact>>;
}

/// Per-account remote persistence plus the searchable account directory.
/// Every call names the account it acts for.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteUserStore: Send + Sync {
    async fn create_account(&self, account: &Account) -> AppResult<()>;

    /// The caller's own record; `NotFound` if it does not exist.
    async fn current_account(&self, account_id: &str) -> AppResult<Account>;

    async fn account_by_id(&self, id: &str) -> AppResult<Option<Account>>;

    /// Visible accounts whose email equals `email`, ignoring case.
    async fn search_by_email(&self, email: &str) -> AppResult<Vec<Account>>;

    /// Visible accounts whose phone equals `phone` once formatting is stripped.
    async fn search_by_phone(&self, phone: &str) -> AppResult<Vec<Account>>;

    /// Replaces the owner's entire contact set.
    async fn save_contacts(&self, account_id: &str, entries: &[ContactEntry]) -> AppResult<()>;

    async fn get_contacts(&self, account_id: &str) -> AppResult<Vec<ContactEntry>>;

    /// Replaces the owner's contact-derived birthdays. Manual entries stay.
    async fn save_birthdays(&self, account_id: &str, birthdays: &[DerivedBirthday]) -> AppResult<()>;

    async fn get_birthdays(&self, account_id: &str) -> AppResult<Vec<DerivedBirthday>>;

    async fn add_birthday(&self, account_id: &str, birthday: &DerivedBirthday) -> AppResult<()>;

    async fn delete_birthday(&self, id: &str, account_id: &str) -> AppResult<()>;
}
