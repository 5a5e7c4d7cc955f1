pub mod logging;

pub fn normalize_title(title: &str) -> String {
    title.trim().to_string()
}

/// Lowercased, trimmed email used for case-insensitive comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strips formatting characters from a phone number, keeping digits and a
/// single leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
    normalized
}
