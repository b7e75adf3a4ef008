//! In-memory `CrmStore` for handler tests.
//!
//! Mirrors the PostgreSQL adapter: unique emails, scoped conditional
//! writes, case-insensitive literal search, newest-first lead listings and
//! no cascade from customers to leads.

use std::{
    collections::HashMap,
    sync::{
        RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use common::{
    error::{AppError, Res},
    scope::Scope,
};
use uuid::Uuid;

use crate::{
    dtos::{
        customer::{CustomerCreateRequest, CustomerUpdateRequest},
        lead::{LeadCreateRequest, LeadFilter, LeadSelection, LeadUpdateRequest},
        user::UserCreateRequest,
    },
    models::{
        customer::Customer,
        lead::Lead,
        user::{OwnerSummary, User, UserWithPassword},
    },
    store::CrmStore,
};

#[derive(Default)]
struct State {
    users: Vec<UserWithPassword>,
    customers: Vec<Customer>,
    leads: Vec<Lead>,
}

impl State {
    fn customer_in_scope(&self, id: Uuid, scope: Scope) -> bool {
        self.customers
            .iter()
            .any(|c| c.id == id && scope.permits(c.owner_id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail like a lost database connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Res<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::Internal("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Res<RwLockReadGuard<'_, State>> {
        self.check_available()?;
        self.state
            .read()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))
    }

    fn write(&self) -> Res<RwLockWriteGuard<'_, State>> {
        self.check_available()?;
        self.state
            .write()
            .map_err(|_| AppError::Internal("memory store poisoned".to_string()))
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn user_exists_by_email(&self, email: &str) -> Res<bool> {
        Ok(self.read()?.users.iter().any(|u| u.user.email == email))
    }

    async fn insert_user(&self, data: UserCreateRequest) -> Res<User> {
        let mut state = self.write()?;
        if state.users.iter().any(|u| u.user.email == data.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        state.users.push(UserWithPassword {
            user: user.clone(),
            password_hash: data.password_hash,
        });
        Ok(user)
    }

    async fn upsert_user(&self, data: UserCreateRequest) -> Res<User> {
        {
            let mut state = self.write()?;
            if let Some(existing) = state.users.iter_mut().find(|u| u.user.email == data.email) {
                existing.user.name = data.name;
                existing.user.role = data.role;
                existing.user.updated_at = Utc::now();
                existing.password_hash = data.password_hash;
                return Ok(existing.user.clone());
            }
        }
        self.insert_user(data).await
    }

    async fn get_user_with_password_hash(&self, email: &str) -> Res<Option<UserWithPassword>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.user.email == email)
            .cloned())
    }

    async fn get_owner_summaries(&self, ids: &[Uuid]) -> Res<Vec<OwnerSummary>> {
        Ok(self
            .read()?
            .users
            .iter()
            .filter(|u| ids.contains(&u.user.id))
            .map(|u| OwnerSummary::from(&u.user))
            .collect())
    }

    async fn customer_exists_by_email(&self, email: &str) -> Res<bool> {
        Ok(self.read()?.customers.iter().any(|c| c.email == email))
    }

    async fn insert_customer(&self, data: CustomerCreateRequest) -> Res<Customer> {
        let mut state = self.write()?;
        if state.customers.iter().any(|c| c.email == data.email) {
            return Err(AppError::Conflict(
                "Customer with this email already exists".to_string(),
            ));
        }
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            phone: data.phone,
            company: data.company,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>> {
        Ok(self
            .read()?
            .customers
            .iter()
            .find(|c| c.id == id && scope.permits(c.owner_id))
            .cloned())
    }

    async fn list_customers(&self, scope: Scope, search: Option<&str>) -> Res<Vec<Customer>> {
        let needle = search.map(str::to_lowercase).filter(|s| !s.is_empty());
        Ok(self
            .read()?
            .customers
            .iter()
            .filter(|c| scope.permits(c.owner_id))
            .filter(|c| match &needle {
                None => true,
                Some(needle) => {
                    contains_ci(&c.name, needle)
                        || contains_ci(&c.email, needle)
                        || c.company.as_deref().is_some_and(|co| contains_ci(co, needle))
                        || contains_ci(&c.phone, needle)
                }
            })
            .cloned()
            .collect())
    }

    async fn update_customer(
        &self,
        id: Uuid,
        scope: Scope,
        data: CustomerUpdateRequest,
    ) -> Res<Option<Customer>> {
        let mut state = self.write()?;
        if !state.customer_in_scope(id, scope) {
            return Ok(None);
        }
        if let Some(email) = &data.email {
            if state.customers.iter().any(|c| c.id != id && &c.email == email) {
                return Err(AppError::Conflict(
                    "Customer with this email already exists".to_string(),
                ));
            }
        }
        let Some(customer) = state
            .customers
            .iter_mut()
            .find(|c| c.id == id && scope.permits(c.owner_id))
        else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            customer.name = name;
        }
        if let Some(email) = data.email {
            customer.email = email;
        }
        if let Some(phone) = data.phone {
            customer.phone = phone;
        }
        if let Some(company) = data.company {
            customer.company = Some(company);
        }
        customer.updated_at = Utc::now();
        Ok(Some(customer.clone()))
    }

    async fn delete_customer(&self, id: Uuid, scope: Scope) -> Res<Option<Customer>> {
        let mut state = self.write()?;
        let position = state
            .customers
            .iter()
            .position(|c| c.id == id && scope.permits(c.owner_id));
        Ok(position.map(|i| state.customers.remove(i)))
    }

    async fn count_leads_by_customer(&self, customer_ids: &[Uuid]) -> Res<HashMap<Uuid, i64>> {
        let mut counts = HashMap::new();
        for lead in self.read()?.leads.iter() {
            if customer_ids.contains(&lead.customer_id) {
                *counts.entry(lead.customer_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn insert_lead(&self, scope: Scope, data: LeadCreateRequest) -> Res<Option<Lead>> {
        let mut state = self.write()?;
        if !state.customer_in_scope(data.customer_id, scope) {
            return Ok(None);
        }
        let lead = Lead {
            id: Uuid::new_v4(),
            customer_id: data.customer_id,
            title: data.title,
            description: data.description,
            status: data.status,
            value: data.value,
            created_at: Utc::now(),
        };
        state.leads.push(lead.clone());
        Ok(Some(lead))
    }

    async fn list_leads(&self, filter: LeadFilter) -> Res<Vec<Lead>> {
        let state = self.read()?;
        let mut leads: Vec<Lead> = state
            .leads
            .iter()
            .filter(|l| match filter.selection {
                LeadSelection::Customer(customer_id) => l.customer_id == customer_id,
                LeadSelection::Visible(Scope::Unrestricted) => true,
                LeadSelection::Visible(scope) => state.customer_in_scope(l.customer_id, scope),
            })
            .filter(|l| filter.status.is_none_or(|status| l.status == status))
            .cloned()
            .collect();
        // newest first; reverse insertion order breaks timestamp ties
        leads.reverse();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn get_lead(&self, id: Uuid, customer_id: Uuid) -> Res<Option<Lead>> {
        Ok(self
            .read()?
            .leads
            .iter()
            .find(|l| l.id == id && l.customer_id == customer_id)
            .cloned())
    }

    async fn update_lead(
        &self,
        id: Uuid,
        customer_id: Uuid,
        scope: Scope,
        data: LeadUpdateRequest,
    ) -> Res<Option<Lead>> {
        let mut state = self.write()?;
        if !state.customer_in_scope(customer_id, scope) {
            return Ok(None);
        }
        let Some(lead) = state
            .leads
            .iter_mut()
            .find(|l| l.id == id && l.customer_id == customer_id)
        else {
            return Ok(None);
        };
        if let Some(title) = data.title {
            lead.title = title;
        }
        if let Some(description) = data.description {
            lead.description = Some(description);
        }
        if let Some(status) = data.status {
            lead.status = status;
        }
        if let Some(value) = data.value {
            lead.value = value;
        }
        Ok(Some(lead.clone()))
    }

    async fn delete_lead(&self, id: Uuid, customer_id: Uuid, scope: Scope) -> Res<Option<Lead>> {
        let mut state = self.write()?;
        if !state.customer_in_scope(customer_id, scope) {
            return Ok(None);
        }
        let position = state
            .leads
            .iter()
            .position(|l| l.id == id && l.customer_id == customer_id);
        Ok(position.map(|i| state.leads.remove(i)))
    }
}
