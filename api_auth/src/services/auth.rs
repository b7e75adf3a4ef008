use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use common::{
    env_config::AdminBootstrap,
    error::{AppError, Res},
    scope::Role,
    validation,
};
use db::{CrmStore, dtos::user::UserCreateRequest, models::user::User};

use crate::dtos::auth::{LoginRequest, RegisterRequest};

/// Validated registration input with the email already case-folded.
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_register(req: RegisterRequest) -> Res<NewAccount> {
    let name = validation::required("name", req.name)?;
    validation::check_length("name", &name, 2, 50)?;
    let email = validation::required("email", req.email)?;
    validation::check_email("email", email.trim())?;
    let password = validation::required("password", req.password)?;
    validation::check_length("password", &password, 6, 128)?;

    Ok(NewAccount {
        name,
        email: normalize_email(&email),
        password,
    })
}

pub fn validate_login(req: LoginRequest) -> Res<(String, String)> {
    let email = validation::required("email", req.email)?;
    validation::check_email("email", email.trim())?;
    let password = validation::required("password", req.password)?;
    if password.is_empty() {
        return Err(AppError::BadRequest(
            "\"password\" is not allowed to be empty".to_string(),
        ));
    }
    Ok((normalize_email(&email), password))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> Res<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> Res<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| AppError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Creates a `user`-role account. Duplicate emails are a conflict.
pub async fn register_user(store: &dyn CrmStore, account: NewAccount) -> Res<User> {
    if store.user_exists_by_email(&account.email).await? {
        return Err(AppError::Conflict("User already exists".to_string()));
    }
    let password_hash = hash_password(&account.password)?;
    store
        .insert_user(UserCreateRequest {
            name: account.name,
            email: account.email,
            password_hash,
            role: Role::User,
        })
        .await
}

/// Authenticates existing user.
/// Unknown emails and wrong passwords both answer 401.
pub async fn authenticate_user(store: &dyn CrmStore, email: &str, password: &str) -> Res<User> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let record = store
        .get_user_with_password_hash(email)
        .await?
        .ok_or_else(invalid)?;

    if verify_password(password, &record.password_hash)? {
        Ok(record.user)
    } else {
        Err(invalid())
    }
}

/// Creates the configured admin, or resets the existing account's name,
/// password and role.
pub async fn bootstrap_admin(store: &dyn CrmStore, admin: &AdminBootstrap) -> Res<User> {
    let email = normalize_email(&admin.email);
    let existed = store.user_exists_by_email(&email).await?;
    let user = store
        .upsert_user(UserCreateRequest {
            name: admin.name.clone(),
            email,
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
        })
        .await?;

    if existed {
        log::info!("Admin user updated: {}", user.email);
    } else {
        log::info!("Admin user created: {}", user.email);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("Password123!").unwrap();
        assert!(verify_password("Password123!", &hash).unwrap());
        assert!(!verify_password("WrongPassword", &hash).unwrap());
    }

    #[test]
    fn register_folds_email_case() {
        let account = validate_register(RegisterRequest {
            name: Some("Test User".into()),
            email: Some(" Test@Example.com ".into()),
            password: Some("Password123!".into()),
        })
        .unwrap();
        assert_eq!(account.email, "test@example.com");
    }

    #[rstest]
    #[case(None, Some("a@x.com"), Some("secret1"), "\"name\" is required")]
    #[case(Some("A"), Some("a@x.com"), Some("secret1"), "\"name\" length must be at least 2 characters long")]
    #[case(Some("Al"), Some("not-an-email"), Some("secret1"), "\"email\" must be a valid email")]
    #[case(Some("Al"), Some("a@x.com"), Some("123"), "\"password\" length must be at least 6 characters long")]
    fn register_rejects_bad_input(
        #[case] name: Option<&str>,
        #[case] email: Option<&str>,
        #[case] password: Option<&str>,
        #[case] message: &str,
    ) {
        let err = validate_register(RegisterRequest {
            name: name.map(Into::into),
            email: email.map(Into::into),
            password: password.map(Into::into),
        })
        .err()
        .unwrap();
        assert_eq!(err.to_string(), message);
    }
}
