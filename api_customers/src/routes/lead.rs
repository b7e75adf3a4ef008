use std::sync::Arc;

use actix_web::{HttpRequest, Responder, delete, get, post, put, web};
use common::{error::Res, http::Success};
use db::CrmStore;
use realtime::{Event, Notifier, event::LeadDeleted};

use crate::caller;
use crate::dtos::lead::{LeadPayload, LeadStatusQuery};
use crate::services::lead as service;

#[post("/{customer_id}/leads")]
pub async fn post_lead(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<LeadPayload>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let (customer, lead) =
        service::create_lead(store.get_ref().as_ref(), &principal, &path, body.into_inner()).await?;

    notifier.owner_and_admin(customer.owner_id, Event::LeadCreated(lead.clone()));
    Success::created(lead)
}

/// Leads of one customer, newest first, optionally filtered by `?status=`.
#[get("/{customer_id}/leads")]
pub async fn get_customer_leads(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<LeadStatusQuery>,
    store: web::Data<Arc<dyn CrmStore>>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let status = query.filter();
    let leads =
        service::list_leads(store.get_ref().as_ref(), &principal, Some(path.as_str()), status).await?;
    Success::ok(leads)
}

/// Leads of every customer the caller can see.
#[get("")]
pub async fn get_all_leads(
    req: HttpRequest,
    query: web::Query<LeadStatusQuery>,
    store: web::Data<Arc<dyn CrmStore>>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let status = query.filter();
    let leads = service::list_leads(store.get_ref().as_ref(), &principal, None, status).await?;
    Success::ok(leads)
}

#[get("/{customer_id}/leads/{id}")]
pub async fn get_lead(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    store: web::Data<Arc<dyn CrmStore>>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let (customer_id, id) = path.into_inner();
    let lead = service::get_lead(store.get_ref().as_ref(), &principal, &customer_id, &id).await?;
    Success::ok(lead)
}

#[put("/{customer_id}/leads/{id}")]
pub async fn put_lead(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<LeadPayload>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let (customer_id, id) = path.into_inner();
    let (customer, lead) = service::update_lead(
        store.get_ref().as_ref(),
        &principal,
        &customer_id,
        &id,
        body.into_inner(),
    )
    .await?;

    notifier.owner_and_admin(customer.owner_id, Event::LeadUpdated(lead.clone()));
    Success::ok(lead)
}

#[delete("/{customer_id}/leads/{id}")]
pub async fn delete_lead(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let (customer_id, id) = path.into_inner();
    let (customer, lead) =
        service::delete_lead(store.get_ref().as_ref(), &principal, &customer_id, &id).await?;

    notifier.owner_and_admin(
        customer.owner_id,
        Event::LeadDeleted(LeadDeleted {
            lead_id: lead.id,
            customer_id: customer.id,
        }),
    );
    Success::message("Lead deleted successfully")
}
