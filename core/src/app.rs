use actix_web::{
    HttpRequest, HttpResponse, Responder,
    error::{JsonPayloadError, QueryPayloadError},
    web,
};
use common::{env_config::Config, error::AppError, http::Success};

/// Malformed JSON bodies answer 400 in the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(err.to_string()).into()
    })
}

async fn health() -> impl Responder {
    Success::ok(serde_json::json!({ "ok": true }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not Found" }))
}

/// Every route the server exposes.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health))
        .service(realtime::ws::ws_entry)
        .service(
            web::scope("/api")
                .service(api_auth::mount_auth())
                .service(api_auth::mount_protected(config))
                .service(api_customers::mount_customers(config))
                .service(api_customers::mount_leads(config)),
        )
        .default_service(web::to(not_found));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use common::env_config::JwtConfig;
    use db::{CrmStore, memory::MemoryStore};
    use realtime::{Broadcaster, ConnectionRegistry, Notifier, Room};
    use serde_json::{Value, json};

    use super::*;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            environment: "test".to_string(),
            database_url: String::new(),
            jwt_config: JwtConfig {
                secret: "server-secret".to_string(),
                expiration_hours: 1,
            },
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            num_workers: 1,
            cors_allowed_origins: vec!["*".to_string()],
            console_logging_enabled: false,
            log_file: String::new(),
            admin: None,
        })
    }

    macro_rules! server {
        ($registry:expr) => {{
            let config = test_config();
            let store: Arc<dyn CrmStore> = Arc::new(MemoryStore::new());
            let broadcaster: Arc<dyn Broadcaster> = $registry.clone();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(store))
                    .app_data(web::Data::new(config.clone()))
                    .app_data(web::Data::new($registry.clone()))
                    .app_data(web::Data::new(Notifier::new(broadcaster)))
                    .configure(|cfg| configure(cfg, &config)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn health_and_unknown_routes() {
        let registry = Arc::new(ConnectionRegistry::new());
        let app = server!(registry);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"ok": true}));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Not Found"}));
    }

    #[actix_web::test]
    async fn malformed_json_is_bad_request() {
        let registry = Arc::new(ConnectionRegistry::new());
        let app = server!(registry);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn customer_mutations_reach_subscribed_connections() {
        let registry = Arc::new(ConnectionRegistry::new());
        let app = server!(registry);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Alice", "email": "alice@example.com", "password": "Password123!"}))
            .to_request();
        let auth: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let user_id: uuid::Uuid = auth["user"]["id"].as_str().unwrap().parse().unwrap();
        let bearer = format!("Bearer {}", auth["token"].as_str().unwrap());

        let (owner_conn, mut owner_rx) = registry.register();
        registry.join(owner_conn, Room::User(user_id));
        let (admin_conn, mut admin_rx) = registry.register();
        registry.join(admin_conn, Room::Admin);
        let (_bystander, mut bystander_rx) = registry.register();

        let req = test::TestRequest::post()
            .uri("/api/customers")
            .insert_header(("Authorization", bearer))
            .set_json(json!({"name": "Acme Corp", "email": "contact@acme.com", "phone": "1234567890"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        for rx in [&mut owner_rx, &mut admin_rx] {
            let frame: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(frame["event"], "customerCreated");
            assert_eq!(frame["data"]["owner"]["email"], "alice@example.com");
        }
        assert!(bystander_rx.try_recv().is_err());
    }
}
