// Users - the actors of the forum.
//
// Authentication lives outside this crate; by the time a User reaches the
// core it has already been resolved by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identity of a user. Two users are the same user iff their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a user is allowed to do beyond regular participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Normal,
    Moderator,
}

/// Reserved id of the ghost user.
pub const GHOST_USER_ID: UserId = UserId(0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            email: email.into(),
            role: UserRole::Normal,
        }
    }

    /// Placeholder for "no human has touched this yet".
    pub fn ghost() -> Self {
        Self {
            id: GHOST_USER_ID,
            name: "ghost".to_string(),
            email: String::new(),
            role: UserRole::Normal,
        }
    }

    /// Same user, promoted to moderator.
    pub fn as_moderator(mut self) -> Self {
        self.role = UserRole::Moderator;
        self
    }

    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    pub fn is_ghost(&self) -> bool {
        self.id == GHOST_USER_ID
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}
