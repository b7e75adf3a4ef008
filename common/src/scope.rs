//! Ownership scoping shared by every customer and lead route.
//!
//! Admins see every record. Everyone else sees only customers whose
//! `owner_id` is their own id, and leads whose parent customer passes the
//! same test. Leads carry no owner column, so the parent customer is always
//! the thing that gets checked.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Authenticated caller, decoded from the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Row filter derived from a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    OwnedBy(Uuid),
}

impl Scope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Admin => Scope::Unrestricted,
            Role::User => Scope::OwnedBy(principal.id),
        }
    }

    /// Owner predicate to embed in a store query; `None` means match by id alone.
    pub fn owner_filter(&self) -> Option<Uuid> {
        match self {
            Scope::Unrestricted => None,
            Scope::OwnedBy(owner_id) => Some(*owner_id),
        }
    }

    pub fn permits(&self, owner_id: Uuid) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::OwnedBy(id) => *id == owner_id,
        }
    }
}
