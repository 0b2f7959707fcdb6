// libs/consultation-cell/src/services/validation.rs
use std::sync::OnceLock;

use regex::Regex;

use crate::models::ConsultationError;

const MIN_HOST_NAME_LEN: usize = 2;
const MIN_ROOM_NAME_LEN: usize = 3;
const MIN_DISPLAY_NAME_LEN: usize = 2;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn room_pattern() -> &'static Regex {
    static ROOM: OnceLock<Regex> = OnceLock::new();
    ROOM.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static room pattern"))
}

/// Lookup key for a room: lowercased and trimmed.
pub fn normalize_room_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_host_name(raw: &str) -> Result<String, ConsultationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_HOST_NAME_LEN {
        return Err(ConsultationError::InvalidInput(
            "Host name must be at least 2 characters.".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Returns the trimmed display form of the room name.
pub fn validate_room_name(raw: &str) -> Result<String, ConsultationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_ROOM_NAME_LEN {
        return Err(ConsultationError::InvalidInput(
            "Room name must be at least 3 characters.".to_string(),
        ));
    }
    if !room_pattern().is_match(trimmed) {
        return Err(ConsultationError::InvalidInput(
            "Room name can only contain letters, numbers, underscores, and hyphens.".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_email(raw: &str) -> Result<String, ConsultationError> {
    let email = normalize_email(raw);
    if !email_pattern().is_match(&email) {
        return Err(ConsultationError::InvalidInput(format!(
            "'{}' is not a valid email address.",
            raw.trim()
        )));
    }
    Ok(email)
}

/// Splits a comma-separated list into normalized, de-duplicated emails,
/// keeping first-occurrence order.
pub fn parse_client_emails(csv: &str) -> Result<Vec<String>, ConsultationError> {
    let mut emails: Vec<String> = Vec::new();

    for segment in csv.split(',') {
        if segment.trim().is_empty() {
            return Err(ConsultationError::InvalidInput(
                "Please provide a comma-separated list of valid email addresses.".to_string(),
            ));
        }
        let email = validate_email(segment)?;
        if !emails.contains(&email) {
            emails.push(email);
        }
    }

    if emails.is_empty() {
        return Err(ConsultationError::InvalidInput(
            "At least one client email is required.".to_string(),
        ));
    }

    Ok(emails)
}

pub fn validate_display_name(raw: &str) -> Result<String, ConsultationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_DISPLAY_NAME_LEN {
        return Err(ConsultationError::InvalidInput(
            "Name must be at least 2 characters.".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
