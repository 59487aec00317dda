use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error("an appeal for this restriction is already pending")]
    AppealExists,
    #[error("appeal already {0}")]
    AppealAlreadyResolved(&'static str),
    #[error("no active {0} punishment")]
    NoActivePunishment(&'static str),
    #[error("punishment is not active")]
    PunishmentInactive,
    #[error("account is restricted: {0} revoked")]
    Restricted(&'static str),
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid credentials")]
    AuthFailed,
    #[error("account is banned")]
    AccountBanned,
    #[error("password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ModerationError {
    /// Stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ModerationError::NotFound(_) => "NOT_FOUND",
            ModerationError::InvalidInput(_) => "INVALID_INPUT",
            ModerationError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ModerationError::AppealExists => "APPEAL_EXISTS",
            ModerationError::AppealAlreadyResolved(_) => "APPEAL_ALREADY_RESOLVED",
            ModerationError::NoActivePunishment(_) => "NO_ACTIVE_PUNISHMENT",
            ModerationError::PunishmentInactive => "PUNISHMENT_INACTIVE",
            ModerationError::Restricted(_) => "RESTRICTED",
            ModerationError::UsernameTaken => "USERNAME_TAKEN",
            ModerationError::AuthFailed => "AUTH_FAILED",
            ModerationError::AccountBanned => "ACCOUNT_BANNED",
            ModerationError::Password(_) => "PASSWORD_ERROR",
            ModerationError::Database(_) => "DB_ERROR",
        }
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub type Result<T> = std::result::Result<T, ModerationError>;
