#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use common::{
    env_config::{Config, JwtConfig},
    error::{AppError, Res},
    jwt,
    scope::{Principal, Role},
};
use db::{CrmStore, dtos::user::UserCreateRequest, memory::MemoryStore};
use realtime::{Broadcaster, Event, Room};
use serde_json::Value;

pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        environment: "test".to_string(),
        database_url: String::new(),
        jwt_config: JwtConfig {
            secret: "customers-api-secret".to_string(),
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

/// Captures every emitted event as `(room, serialized event)`.
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub emitted: Mutex<Vec<(Room, Value)>>,
    pub fail: bool,
}

impl RecordingBroadcaster {
    pub fn failing() -> Self {
        RecordingBroadcaster {
            emitted: Mutex::default(),
            fail: true,
        }
    }

    pub fn events(&self) -> Vec<(Room, Value)> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.emitted.lock().unwrap().clear();
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn emit(&self, room: Room, event: &Event) -> Res<()> {
        if self.fail {
            return Err(AppError::Internal("broadcast failed".to_string()));
        }
        let value = serde_json::to_value(event).unwrap();
        self.emitted.lock().unwrap().push((room, value));
        Ok(())
    }
}

pub struct TestUser {
    pub principal: Principal,
    pub bearer: String,
}

pub async fn seed_user(store: &Arc<MemoryStore>, config: &Config, email: &str, role: Role) -> TestUser {
    let user = store
        .insert_user(UserCreateRequest {
            name: email.split('@').next().unwrap().to_string(),
            email: email.to_string(),
            password_hash: "unused".to_string(),
            role,
        })
        .await
        .unwrap();
    let principal = Principal { id: user.id, role };
    let token = jwt::generate_jwt(&principal, &config.jwt_config).unwrap();
    TestUser {
        principal,
        bearer: format!("Bearer {token}"),
    }
}

/// Builds the `/api` service tree around a memory store and a recorder.
macro_rules! test_app {
    ($store:expr, $notifier:expr, $config:expr) => {{
        let store: std::sync::Arc<dyn db::CrmStore> = $store.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(store))
                .app_data(actix_web::web::Data::new($notifier.clone()))
                .service(
                    actix_web::web::scope("/api")
                        .service(api_customers::mount_customers(&$config))
                        .service(api_customers::mount_leads(&$config)),
                ),
        )
        .await
    }};
}
