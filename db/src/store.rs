use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use common::{error::Res, scope::Scope};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    dtos::{
        customer::{CustomerCreateRequest, CustomerUpdateRequest},
        lead::{LeadCreateRequest, LeadFilter, LeadUpdateRequest},
        user::UserCreateRequest,
    },
    models::{
        customer::Customer,
        lead::Lead,
        user::{OwnerSummary, User, UserWithPassword},
    },
};

/// Persistence port used by the route handlers.
///
/// Scoped writes take the caller's `Scope` so implementations can apply the
/// ownership predicate in the same operation as the write.
#[async_trait]
pub trait CrmStore: Send + Sync {
    async fn user_exists_by_email(&self, email: &str) -> Res<bool>;
    async fn insert_user(&self, data: UserCreateRequest) -> Res<User>;
    async fn upsert_user(&self, data: UserCreateRequest) -> Res<User>;
    async fn get_user_with_password_hash(&self, email: &str) -> Res<Option<UserWithPassword>>;
    async fn get_owner_summaries(&self, ids: &[Uuid]) -> Res<Vec<OwnerSummary>>;

    async fn customer_exists_by_email(&self, email: &str) -> Res<bool>;
    async fn insert_customer(&self, data: CustomerCreateRequest) -> Res<Customer>;
    async fn get_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>>;
    async fn list_customers(&self, scope: Scope, search: Option<&str>) -> Res<Vec<Customer>>;
    async fn update_customer(
        &self,
        id: Uuid,
        scope: Scope,
        data: CustomerUpdateRequest,
    ) -> Res<Option<Customer>>;
    async fn delete_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>>;
    async fn count_leads_by_customer(&self, customer_ids: &[Uuid]) -> Res<HashMap<Uuid, i64>>;

    async fn insert_lead(&self, scope: Scope, data: LeadCreateRequest) -> Res<Option<Lead>>;
    async fn list_leads(&self, filter: LeadFilter) -> Res<Vec<Lead>>;
    async fn get_lead(&self, id: Uuid, customer_id: Uuid) -> Res<Option<Lead>>;
    async fn update_lead(
        &self,
        id: Uuid,
        customer_id: Uuid,
        scope: Scope,
        data: LeadUpdateRequest,
    ) -> Res<Option<Lead>>;
    async fn delete_lead(&self, id: Uuid, customer_id: Uuid, scope: Scope) -> Res<Option<Lead>>;
}

/// `CrmStore` backed by the PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn user_exists_by_email(&self, email: &str) -> Res<bool> {
        crate::user::exists_user_by_email(&*self.pool, email).await
    }

    async fn insert_user(&self, data: UserCreateRequest) -> Res<User> {
        crate::user::insert_user(&*self.pool, data).await
    }

    async fn upsert_user(&self, data: UserCreateRequest) -> Res<User> {
        crate::user::upsert_user(&*self.pool, data).await
    }

    async fn get_user_with_password_hash(&self, email: &str) -> Res<Option<UserWithPassword>> {
        crate::user::get_user_with_password_hash(&*self.pool, email).await
    }

    async fn get_owner_summaries(&self, ids: &[Uuid]) -> Res<Vec<OwnerSummary>> {
        crate::user::get_owner_summaries(&*self.pool, ids).await
    }

    async fn customer_exists_by_email(&self, email: &str) -> Res<bool> {
        crate::customer::exists_customer_by_email(&*self.pool, email).await
    }

    async fn insert_customer(&self, data: CustomerCreateRequest) -> Res<Customer> {
        crate::customer::insert_customer(&*self.pool, data).await
    }

    async fn get_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>> {
        crate::customer::get_customer(&*self.pool, id, scope).await
    }

    async fn list_customers(&self, scope: Scope, search: Option<&str>) -> Res<Vec<Customer>> {
        crate::customer::list_customers(&*self.pool, scope, search).await
    }

    async fn update_customer(
        &self,
        id: Uuid,
        scope: Scope,
        data: CustomerUpdateRequest,
    ) -> Res<Option<Customer>> {
        crate::customer::update_customer(&*self.pool, id, scope, data).await
    }

    async fn delete_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>> {
        crate::customer::delete_customer(&*self.pool, id, scope).await
    }

    async fn count_leads_by_customer(&self, customer_ids: &[Uuid]) -> Res<HashMap<Uuid, i64>> {
        crate::customer::count_leads_by_customer(&*self.pool, customer_ids).await
    }

    async fn insert_lead(&self, scope: Scope, data: LeadCreateRequest) -> Res<Option<Lead>> {
        crate::lead::insert_lead(&*self.pool, scope, data).await
    }

    async fn list_leads(&self, filter: LeadFilter) -> Res<Vec<Lead>> {
        crate::lead::list_leads(&*self.pool, filter).await
    }

    async fn get_lead(&self, id: Uuid, customer_id: Uuid) -> Res<Option<Lead>> {
        crate::lead::get_lead(&*self.pool, id, customer_id).await
    }

    async fn update_lead(
        &self,
        id: Uuid,
        customer_id: Uuid,
        scope: Scope,
        data: LeadUpdateRequest,
    ) -> Res<Option<Lead>> {
        crate::lead::update_lead(&*self.pool, id, customer_id, scope, data).await
    }

    async fn delete_lead(&self, id: Uuid, customer_id: Uuid, scope: Scope) -> Res<Option<Lead>> {
        crate::lead::delete_lead(&*self.pool, id, customer_id, scope).await
    }
}
