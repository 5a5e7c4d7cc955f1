// DateKeeper Library
// Recurring-date reminders and contact birthday sync

pub mod cards;
pub mod config;
pub mod database;
pub mod error;
pub mod http_config;
pub mod matching;
pub mod models;
pub mod recurrence;
pub mod reminders;
pub mod sync;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use database::{Database, EventStore, SqliteUserStore};
pub use error::{AppError, AppResult};
pub use matching::{ContactMatch, MatchingService};
pub use models::*;
pub use recurrence::LeapDayPolicy;
pub use reminders::{due_reminders, DueReminder};
pub use sync::{ContactSource, PermissionProvider, PermissionStatus, RemoteUserStore, SyncPipeline};
