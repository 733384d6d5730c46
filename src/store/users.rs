//! User directory used by login and the authentication gate.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UserConfig;

/// Numeric user identifier, carried as the JWT subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub pseudo: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("user not found")]
    NotFound,

    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Resolves users by id or pseudo.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<User, LookupError>;

    async fn find_by_pseudo(&self, pseudo: &str) -> Result<User, LookupError>;
}

/// In-memory directory seeded from configuration.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: DashMap<UserId, User>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from the `[[users]]` config entries.
    pub fn from_config(seed: &[UserConfig]) -> Self {
        let directory = Self::new();
        for user in seed {
            directory.insert(User {
                id: UserId(user.id),
                pseudo: user.pseudo.clone(),
            });
        }
        tracing::info!(users = directory.len(), "User directory seeded");
        directory
    }

    /// Add or replace a user.
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Remove a user. Tokens already issued for it stop resolving.
    pub fn remove(&self, id: UserId) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> Result<User, LookupError> {
        self.users
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(LookupError::NotFound)
    }

    async fn find_by_pseudo(&self, pseudo: &str) -> Result<User, LookupError> {
        self.users
            .iter()
            .find(|r| r.value().pseudo == pseudo)
            .map(|r| r.value().clone())
            .ok_or(LookupError::NotFound)
    }
}
