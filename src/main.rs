use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod db;
mod model;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let db_pool = web::Data::new(state.db_pool);
    let survey_service = web::Data::from(state.survey_service);
    let analytics_service = web::Data::from(state.analytics_service);
    let authenticator = web::Data::from(state.authenticator);
    let admin_gate = web::Data::new(state.admin_gate);

    tracing::info!("Starting UMKM risk survey server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(api::json_config())
            .app_data(api::path_config())
            .app_data(api::query_config())
            .app_data(db_pool.clone())
            .app_data(survey_service.clone())
            .app_data(analytics_service.clone())
            .app_data(authenticator.clone())
            .app_data(admin_gate.clone())
            .configure(api::health::configure)
            .configure(api::openapi::configure)
            .configure(api::assets::configure)
            .configure(api::submissions::configure)
            .configure(api::progress::configure)
            .configure(api::admin::configure)
            .default_service(web::to(api::not_found))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
