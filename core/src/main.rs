mod app;
mod cors;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use common::env_config::Config;
use db::{CrmStore, PgStore};
use realtime::{Broadcaster, ConnectionRegistry, Notifier};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    // init logger
    if logger::setup(&config).expect("Failed to set up logger") {
        log::info!("Console logging enabled");
    }

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");
    let store: Arc<dyn CrmStore> = Arc::new(PgStore::new(pool));

    // create or refresh the configured admin account
    match &config.admin {
        Some(admin) => {
            if let Err(e) = api_auth::services::auth::bootstrap_admin(store.as_ref(), admin).await {
                log::error!("Failed to bootstrap admin user: {}", e);
            }
        }
        None => log::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap"),
    }

    // realtime fan-out
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster: Arc<dyn Broadcaster> = registry.clone();
    let notifier = Notifier::new(broadcaster);

    log::info!(
        "Starting server on {}:{}",
        config.server_host,
        config.server_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(notifier.clone()))
            .wrap(logger::middleware(&config_data)) // 2nd
            .wrap(cors::middleware(&config_data.cors_allowed_origins)) // 1st
            .configure(|cfg| app::configure(cfg, &config_data))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
