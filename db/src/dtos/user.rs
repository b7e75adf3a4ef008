use common::scope::Role;

pub struct UserCreateRequest {
    pub name: String,
    /// Already case-folded by the caller.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
