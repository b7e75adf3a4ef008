use common::{
    error::{AppError, Res},
    scope::Scope,
};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dtos::lead::{LeadCreateRequest, LeadFilter, LeadSelection, LeadUpdateRequest},
    models::lead::Lead,
};

/// Parent-ownership predicate shared by every scoped lead write.
/// `$2` is the customer id and `$3` the optional owner id.
const PARENT_IN_SCOPE: &str =
    "EXISTS (SELECT 1 FROM customers c WHERE c.id = $2 AND ($3::uuid IS NULL OR c.owner_id = $3))";

/// Inserts the lead only while the parent customer is still visible under
/// `scope`. `None` means the parent vanished or is out of scope.
pub async fn insert_lead<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    scope: Scope,
    data: LeadCreateRequest,
) -> Res<Option<Lead>> {
    let sql = format!(
        r#"
        INSERT INTO leads (id, customer_id, title, description, status, value)
        SELECT $1::uuid, $2::uuid, $4::text, $5::text, $6::text, $7::float8
        WHERE {PARENT_IN_SCOPE}
        RETURNING *
        "#
    );
    sqlx::query_as::<_, Lead>(&sql)
        .bind(Uuid::new_v4())
        .bind(data.customer_id)
        .bind(scope.owner_filter())
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.as_str())
        .bind(data.value)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn list_leads<'e, E>(executor: E, filter: LeadFilter) -> Res<Vec<Lead>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM leads WHERE TRUE");

    match filter.selection {
        LeadSelection::Customer(customer_id) => {
            qb.push(" AND customer_id = ").push_bind(customer_id);
        }
        LeadSelection::Visible(scope) => {
            if let Some(owner_id) = scope.owner_filter() {
                qb.push(" AND customer_id IN (SELECT id FROM customers WHERE owner_id = ")
                    .push_bind(owner_id)
                    .push(")");
            }
        }
    }

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }

    qb.push(" ORDER BY created_at DESC");

    qb.build_query_as::<Lead>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_lead<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    customer_id: Uuid,
) -> Res<Option<Lead>> {
    sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 AND customer_id = $2")
        .bind(id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn update_lead<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    customer_id: Uuid,
    scope: Scope,
    data: LeadUpdateRequest,
) -> Res<Option<Lead>> {
    let sql = format!(
        r#"
        UPDATE leads
        SET title = COALESCE($4, title),
            description = COALESCE($5, description),
            status = COALESCE($6, status),
            value = COALESCE($7, value)
        WHERE id = $1 AND customer_id = $2 AND {PARENT_IN_SCOPE}
        RETURNING *
        "#
    );
    sqlx::query_as::<_, Lead>(&sql)
        .bind(id)
        .bind(customer_id)
        .bind(scope.owner_filter())
        .bind(data.title)
        .bind(data.description)
        .bind(data.status.map(|s| s.as_str()))
        .bind(data.value)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn delete_lead<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    id: Uuid,
    customer_id: Uuid,
    scope: Scope,
) -> Res<Option<Lead>> {
    let sql = format!(
        "DELETE FROM leads WHERE id = $1 AND customer_id = $2 AND {PARENT_IN_SCOPE} RETURNING *"
    );
    sqlx::query_as::<_, Lead>(&sql)
        .bind(id)
        .bind(customer_id)
        .bind(scope.owner_filter())
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}
