// Flags - moderation reports attached to questions and answers.

use crate::core::users::{User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Rude,
    Spam,
    Duplicated,
    Obsolete,
    Other,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagType::Rude => write!(f, "Rude"),
            FlagType::Spam => write!(f, "Spam"),
            FlagType::Duplicated => write!(f, "Duplicated"),
            FlagType::Obsolete => write!(f, "Obsolete"),
            FlagType::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub flag_type: FlagType,
    pub author: User,
    /// Free text, usually only given for `FlagType::Other`.
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Flag {
    pub fn new(flag_type: FlagType, author: User) -> Self {
        Self {
            flag_type,
            author,
            reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Flags on one entity, at most one per reporting user.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Returns false (and keeps the first report) when the user already flagged.
    pub fn add(&mut self, flag: Flag) -> bool {
        if self.already_flagged_by(flag.author.id) {
            return false;
        }
        self.flags.push(flag);
        true
    }

    pub fn already_flagged_by(&self, user: UserId) -> bool {
        self.flags.iter().any(|f| f.author.id == user)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }
}
