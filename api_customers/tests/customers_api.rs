#[macro_use]
mod support;

use std::sync::Arc;

use actix_web::{http::StatusCode, test};
use common::scope::Role;
use db::memory::MemoryStore;
use realtime::{Notifier, Room};
use serde_json::{Value, json};

use support::{RecordingBroadcaster, seed_user, test_config};

fn customer_body(name: &str, email: &str, company: &str) -> Value {
    json!({"name": name, "email": email, "phone": "1234567890", "company": company})
}

#[actix_web::test]
async fn create_returns_stored_customer_and_broadcasts_to_owner_and_admin() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(RecordingBroadcaster::default());
    let notifier = Notifier::new(recorder.clone());
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(customer_body("Acme Corp", "contact@acme.com", "Acme"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ownerId"], json!(alice.principal.id.to_string()));
    assert_eq!(body["phone"], "1234567890");
    assert!(body.get("owner").is_none());

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, Room::User(alice.principal.id));
    assert_eq!(events[1].0, Room::Admin);
    assert_eq!(events[0].1["event"], "customerCreated");
    assert_eq!(events[0].1["data"]["owner"]["email"], "alice@example.com");
}

#[actix_web::test]
async fn duplicate_email_conflicts_and_invalid_body_is_rejected() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::disabled();
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    let create = |body: Value| {
        test::TestRequest::post()
            .uri("/api/customers")
            .insert_header(("Authorization", alice.bearer.clone()))
            .set_json(body)
            .to_request()
    };

    let resp = test::call_service(&app, create(customer_body("Acme Corp", "dup@acme.com", "Acme"))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, create(customer_body("Other Corp", "dup@acme.com", "Other"))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Customer with this email already exists");

    let resp = test::call_service(
        &app,
        create(json!({"name": "Acme Corp", "email": "new@acme.com", "phone": "12345"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "\"phone\" must be 10 digits");
}

#[actix_web::test]
async fn routes_require_a_token() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::disabled();
    let app = test_app!(store, notifier, config);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/customers").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn users_only_see_their_own_customers() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(RecordingBroadcaster::default());
    let notifier = Notifier::new(recorder.clone());
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;
    let bob = seed_user(&store, &config, "bob@example.com", Role::User).await;
    let admin = seed_user(&store, &config, "admin@example.com", Role::Admin).await;

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(customer_body("Acme Corp", "contact@acme.com", "Acme"))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_str().unwrap().to_string();
    recorder.clear();

    // Bob cannot tell Alice's customer apart from a missing one.
    for req in [
        test::TestRequest::get().uri(&format!("/api/customers/{id}")),
        test::TestRequest::put()
            .uri(&format!("/api/customers/{id}"))
            .set_json(json!({"name": "Stolen Corp"})),
        test::TestRequest::delete().uri(&format!("/api/customers/{id}")),
    ] {
        let resp = test::call_service(
            &app,
            req.insert_header(("Authorization", bob.bearer.as_str())).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Customer not found or unauthorized");
    }
    assert!(recorder.events().is_empty());

    let list = |bearer: &str| {
        test::TestRequest::get()
            .uri("/api/customers")
            .insert_header(("Authorization", bearer.to_string()))
            .to_request()
    };
    let bobs: Value = test::read_body_json(test::call_service(&app, list(&bob.bearer)).await).await;
    assert_eq!(bobs, json!([]));

    let alices: Value = test::read_body_json(test::call_service(&app, list(&alice.bearer)).await).await;
    assert_eq!(alices.as_array().unwrap().len(), 1);
    assert_eq!(alices[0]["leadsCount"], 0);
    assert!(alices[0].get("owner").is_none());

    let all: Value = test::read_body_json(test::call_service(&app, list(&admin.bearer)).await).await;
    assert_eq!(all[0]["owner"]["email"], "alice@example.com");
}

#[actix_web::test]
async fn unparsable_id_is_not_found() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::disabled();
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    let req = test::TestRequest::get()
        .uri("/api/customers/not-a-uuid")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn search_matches_any_field_case_insensitively() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::disabled();
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    for (name, email, company) in [
        ("Acme Corp", "contact@acme.com", "Acme"),
        ("Globex", "hello@globex.io", "Initech Holdings"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/customers")
            .insert_header(("Authorization", alice.bearer.as_str()))
            .set_json(customer_body(name, email, company))
            .to_request();
        test::call_service(&app, req).await;
    }

    let search = |term: &str| {
        test::TestRequest::get()
            .uri(&format!("/api/customers?search={term}"))
            .insert_header(("Authorization", alice.bearer.clone()))
            .to_request()
    };
    let found: Value = test::read_body_json(test::call_service(&app, search("ACME")).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Acme Corp");

    let found: Value = test::read_body_json(test::call_service(&app, search("GLOBEX.IO")).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Globex");

    let found: Value = test::read_body_json(test::call_service(&app, search("initech")).await).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Globex");

    let found: Value = test::read_body_json(test::call_service(&app, search("%25")).await).await;
    assert_eq!(found, json!([]));
}

#[actix_web::test]
async fn read_one_embeds_leads_and_delete_keeps_them() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(RecordingBroadcaster::default());
    let notifier = Notifier::new(recorder.clone());
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;
    let admin = seed_user(&store, &config, "admin@example.com", Role::Admin).await;

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(customer_body("Acme Corp", "contact@acme.com", "Acme"))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_str().unwrap().to_string();

    for title in ["First deal", "Second deal"] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/customers/{id}/leads"))
            .insert_header(("Authorization", alice.bearer.as_str()))
            .set_json(json!({"title": title, "value": 100}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/customers/{id}"))
        .insert_header(("Authorization", alice.bearer.as_str()))
        .to_request();
    let detail: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(detail["leads"].as_array().unwrap().len(), 2);
    assert_eq!(detail["leads"][0]["title"], "Second deal");
    assert!(detail.get("owner").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/customers/{id}"))
        .insert_header(("Authorization", admin.bearer.as_str()))
        .to_request();
    let detail: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(detail["owner"]["name"], "alice");
    recorder.clear();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/customers/{id}"))
        .insert_header(("Authorization", alice.bearer.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Customer deleted successfully");

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].1, json!({"event": "customerDeleted", "data": id}));

    // leads are not cascaded; the admin global listing still shows them
    let req = test::TestRequest::get()
        .uri("/api/leads")
        .insert_header(("Authorization", admin.bearer.as_str()))
        .to_request();
    let leads: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(leads.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn update_applies_partial_body() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(RecordingBroadcaster::default());
    let notifier = Notifier::new(recorder.clone());
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(customer_body("Acme Corp", "contact@acme.com", "Acme"))
        .to_request();
    let created: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let id = created["id"].as_str().unwrap().to_string();
    recorder.clear();

    let req = test::TestRequest::put()
        .uri(&format!("/api/customers/{id}"))
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(json!({"company": "Acme Holdings"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["company"], "Acme Holdings");
    assert_eq!(updated["name"], "Acme Corp");

    let events = recorder.events();
    assert_eq!(events[0].1["event"], "customerUpdated");
    assert_eq!(events[1].1["data"]["company"], "Acme Holdings");
}

#[actix_web::test]
async fn broadcast_failure_does_not_fail_the_request() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::new(Arc::new(RecordingBroadcaster::failing()));
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .set_json(customer_body("Acme Corp", "contact@acme.com", "Acme"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn store_failure_is_internal_error() {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::disabled();
    let app = test_app!(store, notifier, config);
    let alice = seed_user(&store, &config, "alice@example.com", Role::User).await;
    store.set_unavailable(true);

    let req = test::TestRequest::get()
        .uri("/api/customers")
        .insert_header(("Authorization", alice.bearer.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "connection refused");
}
