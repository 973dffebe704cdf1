//! Feedback records as the service hands them out.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier minted by the feedback service. Never generated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(pub i64);

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FeedbackId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(FeedbackId)
    }
}

/// Identifier of an account on the feedback service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single feedback record.
///
/// Field names follow the service's wire format (`user_id`, `message`,
/// `last_modified`) through serde renames. Timestamps carry no offset; the
/// service stamps them in its own local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: FeedbackId,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub title: String,
    #[serde(rename = "message")]
    pub body: String,
    pub created_at: NaiveDateTime,
    #[serde(rename = "last_modified")]
    pub modified_at: NaiveDateTime,
}

impl FeedbackItem {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// True once the service has recorded an edit after creation.
    pub fn was_modified(&self) -> bool {
        self.modified_at != self.created_at
    }
}

/// Title and body for a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub title: String,
    pub body: String,
}

impl FeedbackDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Both fields must carry non-whitespace text before the draft is sent.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}

/// Replacement title and body for an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackPatch {
    pub title: String,
    pub body: String,
}

impl FeedbackPatch {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }
}
