use common::{
    error::{AppError, Res},
    scope::{Principal, Scope},
};
use db::{
    CrmStore,
    dtos::lead::{LeadFilter, LeadSelection},
    models::{
        customer::Customer,
        lead::{Lead, LeadView},
    },
};
use uuid::Uuid;

use super::customer::{load_owner, require_customer};
use crate::dtos::lead::{LeadPayload, StatusFilter};

/// Path segments the frontend sends when no customer is selected.
const NO_CUSTOMER: [&str; 2] = ["undefined", "null"];

pub fn parse_lead_id(raw: &str) -> Res<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::lead_not_found())
}

/// Creates a lead under a customer the caller may act on. Returns the parent
/// so the caller knows which owner to notify.
pub async fn create_lead(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_customer_id: &str,
    payload: LeadPayload,
) -> Res<(Customer, Lead)> {
    // The parent scope check runs before the body is validated.
    let customer = require_customer(store, principal, raw_customer_id).await?;
    let data = payload.into_create(customer.id)?;
    let lead = store
        .insert_lead(Scope::for_principal(principal), data)
        .await?
        .ok_or_else(AppError::customer_not_found)?;
    Ok((customer, lead))
}

/// Leads of one customer, or of every visible customer when `raw_customer_id`
/// is absent or a placeholder. Newest first.
pub async fn list_leads(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_customer_id: Option<&str>,
    status: StatusFilter,
) -> Res<Vec<Lead>> {
    let selection = match raw_customer_id.filter(|raw| !NO_CUSTOMER.contains(raw)) {
        Some(raw) => LeadSelection::Customer(require_customer(store, principal, raw).await?.id),
        None => LeadSelection::Visible(Scope::for_principal(principal)),
    };
    let status = match status {
        StatusFilter::Any => None,
        StatusFilter::Only(status) => Some(status),
        StatusFilter::Unmatched => return Ok(Vec::new()),
    };
    store.list_leads(LeadFilter { selection, status }).await
}

/// One lead. Admins also get the parent customer's owner.
pub async fn get_lead(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_customer_id: &str,
    raw_id: &str,
) -> Res<LeadView> {
    let customer = require_customer(store, principal, raw_customer_id).await?;
    let id = parse_lead_id(raw_id)?;
    let lead = store
        .get_lead(id, customer.id)
        .await?
        .ok_or_else(AppError::lead_not_found)?;

    let owner = if principal.is_admin() {
        load_owner(store, customer.owner_id).await?
    } else {
        None
    };
    Ok(LeadView { lead, owner })
}

pub async fn update_lead(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_customer_id: &str,
    raw_id: &str,
    payload: LeadPayload,
) -> Res<(Customer, Lead)> {
    // Parent scope first, then the body, as in create_lead.
    let customer = require_customer(store, principal, raw_customer_id).await?;
    let data = payload.into_update()?;
    let id = parse_lead_id(raw_id)?;
    let lead = store
        .update_lead(id, customer.id, Scope::for_principal(principal), data)
        .await?
        .ok_or_else(AppError::lead_not_found)?;
    Ok((customer, lead))
}

pub async fn delete_lead(
    store: &dyn CrmStore,
    principal: &Principal,
    raw_customer_id: &str,
    raw_id: &str,
) -> Res<(Customer, Lead)> {
    let customer = require_customer(store, principal, raw_customer_id).await?;
    let id = parse_lead_id(raw_id)?;
    let lead = store
        .delete_lead(id, customer.id, Scope::for_principal(principal))
        .await?
        .ok_or_else(AppError::lead_not_found)?;
    Ok((customer, lead))
}
