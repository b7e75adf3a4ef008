use std::sync::Arc;

use actix_web::{HttpRequest, Responder, delete, get, post, put, web};
use common::{error::Res, http::Success};
use db::CrmStore;
use realtime::{Event, Notifier};

use crate::caller;
use crate::dtos::customer::{CustomerPayload, CustomerSearchQuery};
use crate::services::customer as service;

/// Creates a customer owned by the caller.
///
/// # Output
/// - 201 with the stored customer
/// - 400 on validation failure, 409 when the email is taken
#[post("")]
pub async fn post_customer(
    req: HttpRequest,
    body: web::Json<CustomerPayload>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let data = body.into_inner().into_create(principal.id)?;
    let store = store.get_ref().as_ref();

    let customer = service::create_customer(store, data).await?;
    log::info!("Customer {} created by {}", customer.id, principal.id);

    let view = service::broadcast_view(store, customer.clone()).await;
    notifier.owner_and_admin(customer.owner_id, Event::CustomerCreated(view));
    Success::created(customer)
}

/// Lists visible customers, optionally filtered by `?search=`, each with
/// `leadsCount`.
#[get("")]
pub async fn get_customers(
    req: HttpRequest,
    query: web::Query<CustomerSearchQuery>,
    store: web::Data<Arc<dyn CrmStore>>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let customers =
        service::list_customers(store.get_ref().as_ref(), &principal, query.search.as_deref()).await?;
    Success::ok(customers)
}

#[get("/{id}")]
pub async fn get_customer(
    req: HttpRequest,
    path: web::Path<String>,
    store: web::Data<Arc<dyn CrmStore>>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let customer = service::get_customer(store.get_ref().as_ref(), &principal, &path).await?;
    Success::ok(customer)
}

#[put("/{id}")]
pub async fn put_customer(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<CustomerPayload>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let data = body.into_inner().into_update()?;
    let store = store.get_ref().as_ref();

    let customer = service::update_customer(store, &principal, &path, data).await?;

    let view = service::broadcast_view(store, customer.clone()).await;
    notifier.owner_and_admin(customer.owner_id, Event::CustomerUpdated(view));
    Success::ok(customer)
}

#[delete("/{id}")]
pub async fn delete_customer(
    req: HttpRequest,
    path: web::Path<String>,
    store: web::Data<Arc<dyn CrmStore>>,
    notifier: web::Data<Notifier>,
) -> Res<impl Responder> {
    let principal = caller(&req)?;
    let customer = service::delete_customer(store.get_ref().as_ref(), &principal, &path).await?;
    log::info!("Customer {} deleted by {}", customer.id, principal.id);

    notifier.owner_and_admin(customer.owner_id, Event::CustomerDeleted(customer.id));
    Success::message("Customer deleted successfully")
}
