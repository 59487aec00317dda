use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    User,
    Post,
    Comment,
    Music,
}

impl TargetType {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::User => "user",
            TargetType::Post => "post",
            TargetType::Comment => "comment",
            TargetType::Music => "music",
        }
    }

    /// Users are not content and cannot be hidden.
    pub fn is_content(self) -> bool {
        !matches!(self, TargetType::User)
    }

    /// `(table, id column, owner column)` backing this target.
    pub(crate) fn table(self) -> (&'static str, &'static str, &'static str) {
        match self {
            TargetType::User => ("accounts", "account_id", "account_id"),
            TargetType::Post => ("posts", "post_id", "author_id"),
            TargetType::Comment => ("comments", "comment_id", "author_id"),
            TargetType::Music => ("music_tracks", "track_id", "author_id"),
        }
    }
}

impl FromStr for TargetType {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(TargetType::User),
            "post" => Ok(TargetType::Post),
            "comment" => Ok(TargetType::Comment),
            "music" => Ok(TargetType::Music),
            other => Err(ModerationError::InvalidInput(format!(
                "unknown target type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::UnderReview => "under_review",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ReportStatus::Resolved | ReportStatus::Rejected)
    }

    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (ReportStatus::Pending, ReportStatus::UnderReview)
                | (ReportStatus::UnderReview, ReportStatus::Resolved)
                | (ReportStatus::UnderReview, ReportStatus::Rejected)
        )
    }
}

impl FromStr for ReportStatus {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(ReportStatus::Pending),
            "under_review" => Ok(ReportStatus::UnderReview),
            "resolved" => Ok(ReportStatus::Resolved),
            "rejected" => Ok(ReportStatus::Rejected),
            other => Err(ModerationError::InvalidInput(format!(
                "unknown report status: {other}"
            ))),
        }
    }
}

/// Boolean permission columns on `accounts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Post,
    Comment,
    Chat,
    UploadMusic,
    Login,
}

impl Permission {
    pub fn column(self) -> &'static str {
        match self {
            Permission::Post => "can_post",
            Permission::Comment => "can_comment",
            Permission::Chat => "can_chat",
            Permission::UploadMusic => "can_upload_music",
            Permission::Login => "can_login",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentType {
    Warn,
    RestrictPosts,
    RestrictComments,
    RestrictChat,
    RestrictMusic,
    Ban,
}

impl PunishmentType {
    pub const ALL: [PunishmentType; 6] = [
        PunishmentType::Warn,
        PunishmentType::RestrictPosts,
        PunishmentType::RestrictComments,
        PunishmentType::RestrictChat,
        PunishmentType::RestrictMusic,
        PunishmentType::Ban,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PunishmentType::Warn => "warn",
            PunishmentType::RestrictPosts => "restrict_posts",
            PunishmentType::RestrictComments => "restrict_comments",
            PunishmentType::RestrictChat => "restrict_chat",
            PunishmentType::RestrictMusic => "restrict_music",
            PunishmentType::Ban => "ban",
        }
    }

    /// The permission this punishment revokes. Warnings revoke nothing.
    pub fn permission(self) -> Option<Permission> {
        match self {
            PunishmentType::Warn => None,
            PunishmentType::RestrictPosts => Some(Permission::Post),
            PunishmentType::RestrictComments => Some(Permission::Comment),
            PunishmentType::RestrictChat => Some(Permission::Chat),
            PunishmentType::RestrictMusic => Some(Permission::UploadMusic),
            PunishmentType::Ban => Some(Permission::Login),
        }
    }
}

impl fmt::Display for PunishmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PunishmentType {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PunishmentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| {
                ModerationError::InvalidInput(format!("unknown punishment type: {value}"))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppealStatus::Pending => "pending",
            AppealStatus::UnderReview => "under_review",
            AppealStatus::Approved => "approved",
            AppealStatus::Rejected => "rejected",
        }
    }

    /// Open appeals can still be decided.
    pub fn is_open(self) -> bool {
        matches!(self, AppealStatus::Pending | AppealStatus::UnderReview)
    }
}

impl FromStr for AppealStatus {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AppealStatus::Pending),
            "under_review" => Ok(AppealStatus::UnderReview),
            "approved" => Ok(AppealStatus::Approved),
            "rejected" => Ok(AppealStatus::Rejected),
            other => Err(ModerationError::InvalidInput(format!(
                "unknown appeal status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(ModerationError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryAction {
    #[serde(rename = "report.submit")]
    ReportSubmit,
    #[serde(rename = "report.review")]
    ReportReview,
    #[serde(rename = "report.resolve")]
    ReportResolve,
    #[serde(rename = "report.reject")]
    ReportReject,
    #[serde(rename = "punishment.apply")]
    PunishmentApply,
    #[serde(rename = "punishment.revoke")]
    PunishmentRevoke,
    #[serde(rename = "punishment.expire")]
    PunishmentExpire,
    #[serde(rename = "appeal.submit")]
    AppealSubmit,
    #[serde(rename = "appeal.review")]
    AppealReview,
    #[serde(rename = "appeal.approve")]
    AppealApprove,
    #[serde(rename = "appeal.reject")]
    AppealReject,
    #[serde(rename = "content.hide")]
    ContentHide,
    #[serde(rename = "content.restore")]
    ContentRestore,
    #[serde(rename = "account.role")]
    AccountRole,
}

impl HistoryAction {
    pub const ALL: [HistoryAction; 14] = [
        HistoryAction::ReportSubmit,
        HistoryAction::ReportReview,
        HistoryAction::ReportResolve,
        HistoryAction::ReportReject,
        HistoryAction::PunishmentApply,
        HistoryAction::PunishmentRevoke,
        HistoryAction::PunishmentExpire,
        HistoryAction::AppealSubmit,
        HistoryAction::AppealReview,
        HistoryAction::AppealApprove,
        HistoryAction::AppealReject,
        HistoryAction::ContentHide,
        HistoryAction::ContentRestore,
        HistoryAction::AccountRole,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::ReportSubmit => "report.submit",
            HistoryAction::ReportReview => "report.review",
            HistoryAction::ReportResolve => "report.resolve",
            HistoryAction::ReportReject => "report.reject",
            HistoryAction::PunishmentApply => "punishment.apply",
            HistoryAction::PunishmentRevoke => "punishment.revoke",
            HistoryAction::PunishmentExpire => "punishment.expire",
            HistoryAction::AppealSubmit => "appeal.submit",
            HistoryAction::AppealReview => "appeal.review",
            HistoryAction::AppealApprove => "appeal.approve",
            HistoryAction::AppealReject => "appeal.reject",
            HistoryAction::ContentHide => "content.hide",
            HistoryAction::ContentRestore => "content.restore",
            HistoryAction::AccountRole => "account.role",
        }
    }
}

impl FromStr for HistoryAction {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        HistoryAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ModerationError::InvalidInput(format!("unknown history action: {value}")))
    }
}
