//! Moderation workflow for the social platform: reports, punishments,
//! appeals and the moderation history that records every step.
//!
//! Every state change runs inside one queued write transaction
//! ([`sn_core::db::Database::begin_write`]) and writes its history row in
//! that same transaction, so the audit trail never disagrees with the state
//! it describes.

pub mod accounts;
pub mod appeals;
pub mod content;
pub mod error;
pub mod history;
pub mod punishments;
pub mod reports;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ModerationError, Result};
pub use types::{
    AppealStatus, HistoryAction, Permission, PunishmentType, ReportStatus, Role, TargetType,
};

/// Actor recorded for changes made by background jobs.
pub const SYSTEM_ACTOR: &str = "system";

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trims `value` and checks its length in characters.
pub(crate) fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModerationError::InvalidInput(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ModerationError::InvalidInput(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(field: &str, value: Option<&str>, max_chars: usize) -> Result<Option<String>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => required_text(field, value, max_chars).map(Some),
        None => Ok(None),
    }
}
