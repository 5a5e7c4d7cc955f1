pub mod account;
pub mod birthday;
pub mod card;
pub mod contact;
pub mod event;
pub mod settings;
pub mod sync;

pub use account::Account;
pub use birthday::DerivedBirthday;
pub use card::{Card, CardTemplate};
pub use contact::{Contact, ContactEntry};
pub use event::{Event, EventType, DEFAULT_REMINDER_DAYS};
pub use settings::{Setting, Settings};
pub use sync::{SyncSnapshot, SyncState, SyncStatistics};
