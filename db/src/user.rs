use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    dtos::user::UserCreateRequest,
    models::user::{OwnerSummary, User, UserWithPassword},
    unique_violation_as_conflict,
};

pub async fn exists_user_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_with_password_hash<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<Option<UserWithPassword>> {
    sqlx::query_as::<_, UserWithPassword>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, email, role, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.name)
    .bind(data.email)
    .bind(data.password_hash)
    .bind(data.role.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| unique_violation_as_conflict(e, "User already exists"))
}

/// Creates the user, or overwrites name, password and role of the user
/// holding that email.
pub async fn upsert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET name = EXCLUDED.name,
            password_hash = EXCLUDED.password_hash,
            role = EXCLUDED.role,
            updated_at = NOW()
        RETURNING id, name, email, role, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.name)
    .bind(data.email)
    .bind(data.password_hash)
    .bind(data.role.as_str())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_owner_summaries<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    ids: &[Uuid],
) -> Res<Vec<OwnerSummary>> {
    sqlx::query_as::<_, OwnerSummary>("SELECT id, name, email FROM users WHERE id = ANY($1)")
        .bind(ids.to_vec())
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}
