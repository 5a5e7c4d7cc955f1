use thiserror::Error;

const SETTINGS_HINT: &str =
    "Open Settings > Privacy > Contacts and allow access to sync birthdays.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String, hint: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists<S: Into<String>>(msg: S) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Contact access refused; carries the settings remediation hint.
    pub fn permission_denied<S: Into<String>>(reason: S) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
            hint: SETTINGS_HINT.to_string(),
        }
    }

    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_pii_safe(&self) -> bool {
        match self {
            Self::Database(_) | Self::Network(_) | Self::Decode(_) | Self::Anyhow(_) => false,
            Self::Validation(_)
            | Self::NotFound(_)
            | Self::AlreadyExists(_)
            | Self::PermissionDenied { .. }
            | Self::Transport(_)
            | Self::Config(_) => true,
        }
    }

    /// Errors the user can fix and the caller should never retry on its own.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::PermissionDenied { .. })
    }

    /// Human-readable description suitable for display. Validation reasons
    /// are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(reason) => reason.clone(),
            Self::NotFound(what) => format!("We couldn't find {}.", what),
            Self::AlreadyExists(what) => format!("{} is already registered.", what),
            Self::PermissionDenied { reason, hint } => format!("{} {}", reason, hint),
            Self::Transport(_) | Self::Network(_) => {
                "Could not reach the server. Please check your connection and try syncing again."
                    .to_string()
            }
            Self::Database(_) => "Could not access saved data. Please try again.".to_string(),
            Self::Decode(_) => "Saved data could not be read.".to_string(),
            Self::Config(msg) => format!("The app is misconfigured: {}", msg),
            Self::Anyhow(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_reason_is_verbatim() {
        let err = AppError::validation("Name must be between 2 and 50 characters");
        assert_eq!(err.user_message(), "Name must be between 2 and 50 characters");
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_permission_denied_carries_hint() {
        let err = AppError::permission_denied("Contact access was denied.");
        let message = err.user_message();
        assert!(message.starts_with("Contact access was denied."));
        assert!(message.contains("Settings"));
    }

    #[test]
    fn test_infrastructure_errors_are_not_pii_safe() {
        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = AppError::from(decode);
        assert!(!err.is_pii_safe());
        assert_eq!(err.user_message(), "Saved data could not be read.");
    }

    #[test]
    fn test_transport_message_does_not_leak_details() {
        let err = AppError::transport("socket closed at 10.0.0.3:443");
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(!err.is_user_correctable());
    }
}
