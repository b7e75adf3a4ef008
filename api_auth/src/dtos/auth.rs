use common::scope::{Principal, Role};
use db::models::user::User;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields are optional so a missing one becomes a 400 naming the field
/// rather than a generic JSON error.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account details safe to hand back to the client.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

impl PublicUser {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: Principal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminOnlyResponse {
    pub msg: String,
    pub user: Principal,
}
