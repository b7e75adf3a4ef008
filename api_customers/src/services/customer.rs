use std::collections::HashMap;

use common::{
    error::{AppError, Res},
    scope::{Principal, Scope},
};
use db::{
    CrmStore,
    dtos::{
        customer::{CustomerCreateRequest, CustomerUpdateRequest},
        lead::{LeadFilter, LeadSelection},
    },
    models::{
        customer::{Customer, CustomerView},
        user::OwnerSummary,
    },
};
use uuid::Uuid;

/// Path ids that do not parse can never match a record.
pub fn parse_customer_id(raw: &str) -> Res<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::customer_not_found())
}

/// Loads a customer the caller may act on, or the conflated 404.
pub async fn require_customer(store: &dyn CrmStore, principal: &Principal, raw_id: &str) -> Res<Customer> {
    let id = parse_customer_id(raw_id)?;
    store
        .get_customer(id, Scope::for_principal(principal))
        .await?
        .ok_or_else(AppError::customer_not_found)
}

pub async fn load_owner(store: &dyn CrmStore, owner_id: Uuid) -> Res<Option<OwnerSummary>> {
    Ok(store.get_owner_summaries(&[owner_id]).await?.into_iter().next())
}

pub async fn create_customer(store: &dyn CrmStore, data: CustomerCreateRequest) -> Res<Customer> {
    if store.customer_exists_by_email(&data.email).await? {
        return Err(AppError::Conflict(
            "Customer with this email already exists".to_string(),
        ));
    }
    store.insert_customer(data).await
}

/// Customers visible to the caller with their lead counts. Admins also get
/// each customer's owner.
pub async fn list_customers(
    store: &dyn CrmStore,
    principal: &Principal,
    search: Option<&str>,
) -> Res<Vec<CustomerView>> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let customers = store
        .list_customers(Scope::for_principal(principal), search)
        .await?;

    let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
    let counts = store.count_leads_by_customer(&ids).await?;
    let owners = if principal.is_admin() {
        owners_by_id(store, &customers).await?
    } else {
        HashMap::new()
    };

    Ok(customers
        .into_iter()
        .map(|customer| {
            let leads_count = counts.get(&customer.id).copied().unwrap_or(0);
            let owner = owners.get(&customer.owner_id).cloned();
            let mut view = CustomerView::from(customer).with_owner(owner);
            view.leads_count = Some(leads_count);
            view
        })
        .collect())
}

async fn owners_by_id(
    store: &dyn CrmStore,
    customers: &[Customer],
) -> Res<HashMap<Uuid, OwnerSummary>> {
    let mut owner_ids: Vec<Uuid> = customers.iter().map(|c| c.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();
    Ok(store
        .get_owner_summaries(&owner_ids)
        .await?
        .into_iter()
        .map(|owner| (owner.id, owner))
        .collect())
}

/// One customer with its leads, newest first.
pub async fn get_customer(store: &dyn CrmStore, principal: &Principal, raw_id: &str) -> Res<CustomerView> {
    let customer = require_customer(store, principal, raw_id).await?;
    let owner = if principal.is_admin() {
        load_owner(store, customer.owner_id).await?
    } else {
        None
    };
    let leads = store
        .list_leads(LeadFilter {
            selection: LeadSelection::Customer(customer.id),
            status: None,
        })
        .await?;

    let mut view = CustomerView::from(customer).with_owner(owner);
    view.leads = Some(leads);
    Ok(view)
}

pub async fn update_customer(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_id: &str,
    data: CustomerUpdateRequest,
) -> Res<Customer> {
    let id = parse_customer_id(raw_id)?;
    store
        .update_customer(id, Scope::for_principal(principal), data)
        .await?
        .ok_or_else(AppError::customer_not_found)
}

/// Removes the customer only. Its leads stay behind.
pub async fn delete_customer(store: &dyn CrmStore, principal: &Principal, raw_id: &str) -> Res<Customer> {
    let id = parse_customer_id(raw_id)?;
    store
        .delete_customer(id, Scope::for_principal(principal))
        .await?
        .ok_or_else(AppError::customer_not_found)
}

/// Stored customer with its owner attached, as broadcast to listeners.
pub async fn broadcast_view(store: &dyn CrmStore, customer: Customer) -> CustomerView {
    let owner = match load_owner(store, customer.owner_id).await {
        Ok(owner) => owner,
        Err(e) => {
            log::warn!("Could not load owner of customer {}: {}", customer.id, e);
            None
        }
    };
    CustomerView::from(customer).with_owner(owner)
}
