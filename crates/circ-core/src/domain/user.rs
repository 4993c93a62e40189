//! Library users and the role/capability check.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Librarian,
    Member,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Admin => "admin",
            UserRole::Librarian => "librarian",
            UserRole::Member => "member",
        };
        s.fmt(f)
    }
}

/// What an operation requires of the caller.
///
/// Every role guard in the engine goes through [`UserRole::allows`] so the
/// authorization assumptions stay auditable in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Place reservations for oneself. Members only.
    Reserve,
    /// Assign, pick up, return and list loans across all users.
    ManageLoans,
    /// Create, update and delete catalog entries.
    ManageCatalog,
    /// Read and update the lending policy.
    ManagePolicy,
}

impl UserRole {
    pub fn allows(self, capability: Capability) -> bool {
        match capability {
            Capability::Reserve => matches!(self, UserRole::Member),
            Capability::ManageLoans | Capability::ManageCatalog | Capability::ManagePolicy => {
                matches!(self, UserRole::Librarian | UserRole::Admin)
            }
        }
    }
}

/// Input for registering a user. Role defaults to member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,

    #[serde(default)]
    pub role: Option<UserRole>,
}

impl UserSpec {
    pub fn member(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
        }
    }

    pub fn with_role(name: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            role: Some(role),
        }
    }
}

/// A registered user as the engine sees it.
///
/// Credentials live outside this crate; the engine only consumes the role
/// and the ban flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    pub is_banned: bool,
}

impl User {
    /// Plain constructor selecting role by value; a missing role means
    /// member.
    pub fn new(id: UserId, spec: UserSpec) -> Self {
        Self {
            id,
            name: spec.name,
            role: spec.role.unwrap_or(UserRole::Member),
            is_banned: false,
        }
    }
}
