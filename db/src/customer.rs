use std::collections::HashMap;

use common::{
    error::{AppError, Res},
    scope::Scope,
};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::customer::{CustomerCreateRequest, CustomerUpdateRequest},
    models::customer::Customer,
    unique_violation_as_conflict,
};

const DUPLICATE_EMAIL: &str = "Customer with this email already exists";

pub async fn exists_customer_by_email<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    email: &str,
) -> Res<bool> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customers WHERE email = $1)")
        .bind(email)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: CustomerCreateRequest,
) -> Res<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (id, name, email, phone, company, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(data.name)
    .bind(data.email)
    .bind(data.phone)
    .bind(data.company)
    .bind(data.owner_id)
    .fetch_one(executor)
    .await
    .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_EMAIL))
}

pub async fn get_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    scope: Scope,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)",
    )
    .bind(id)
    .bind(scope.owner_filter())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn list_customers<'e, E>(
    executor: E,
    scope: Scope,
    search: Option<&str>,
) -> Res<Vec<Customer>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM customers");
    let mut conditions_added = false;

    // Helper to add WHERE or AND
    let mut add_condition_separator = |qb: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(owner_id) = scope.owner_filter() {
        add_condition_separator(&mut qb);
        qb.push("owner_id = ").push_bind(owner_id);
    }

    if let Some(search) = search.filter(|s| !s.is_empty()) {
        add_condition_separator(&mut qb);
        let pattern = format!("%{}%", escape_like(search));
        qb.push("(");
        for (i, column) in ["name", "email", "company", "phone"].iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
        }
        qb.push(")");
    }

    qb.build_query_as::<Customer>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

/// Applies the update only if the row is visible under `scope`; the
/// ownership check and the write are one statement.
pub async fn update_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    scope: Scope,
    data: CustomerUpdateRequest,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET name = COALESCE($3, name),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            company = COALESCE($6, company),
            updated_at = NOW()
        WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(scope.owner_filter())
    .bind(data.name)
    .bind(data.email)
    .bind(data.phone)
    .bind(data.company)
    .fetch_optional(executor)
    .await
    .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_EMAIL))
}

pub async fn delete_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    scope: Scope,
) -> Res<Option<Customer>> {
    sqlx::query_as::<_, Customer>(
        "DELETE FROM customers WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2) RETURNING *",
    )
    .bind(id)
    .bind(scope.owner_filter())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn count_leads_by_customer<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    customer_ids: &[Uuid],
) -> Res<HashMap<Uuid, i64>> {
    let rows = sqlx::query_as::<_, (Uuid, i64)>(
        r#"
        SELECT customer_id, COUNT(*)
        FROM leads
        WHERE customer_id = ANY($1)
        GROUP BY customer_id
        "#,
    )
    .bind(customer_ids.to_vec())
    .fetch_all(executor)
    .await
    .map_err(AppError::from)?;

    Ok(rows.into_iter().collect())
}

/// Escapes `%`, `_` and `\` so the search term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
